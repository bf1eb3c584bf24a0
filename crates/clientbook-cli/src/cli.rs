use clap::{Parser, Subcommand, ValueEnum};

#[derive(Parser)]
#[command(name = "clientbook")]
#[command(about = "clientbook CLI: manage customers on a clientbook server")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Server base URL
    #[arg(
        short,
        long,
        global = true,
        env = "CLIENTBOOK_URL",
        default_value = "http://localhost:3000"
    )]
    pub server: String,

    /// Bearer token for write commands
    #[arg(short, long, global = true, env = "CLIENTBOOK_TOKEN", hide_env_values = true)]
    pub token: Option<String>,

    /// Output format
    #[arg(short, long, global = true)]
    pub format: Option<OutputFormat>,
}

#[derive(Clone, Copy, ValueEnum, Default)]
pub enum OutputFormat {
    #[default]
    Table,
    Json,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Check server health
    Status,
    /// List one page of customers
    List(ListArgs),
    /// Show a customer by email
    Get(GetArgs),
    /// Add a customer
    Add(AddArgs),
    /// Update fields of an existing customer
    Update(UpdateArgs),
    /// Delete a customer by email
    Delete(DeleteArgs),
    /// Create random customers concurrently
    Seed(SeedArgs),
}

#[derive(clap::Args)]
pub struct ListArgs {
    /// Page size
    #[arg(long)]
    pub limit: Option<i64>,
    /// Rows to skip
    #[arg(long)]
    pub offset: Option<i64>,
}

#[derive(clap::Args)]
pub struct GetArgs {
    /// Customer email
    pub email: String,
}

#[derive(clap::Args)]
pub struct AddArgs {
    #[arg(long)]
    pub email: String,
    #[arg(long, default_value = "")]
    pub name: String,
    #[arg(long, default_value = "")]
    pub address: String,
    #[arg(long, default_value_t = 0)]
    pub number: i64,
}

#[derive(clap::Args)]
pub struct UpdateArgs {
    /// Email of the customer to update (cannot be changed)
    #[arg(long)]
    pub email: String,
    #[arg(long)]
    pub name: Option<String>,
    #[arg(long)]
    pub address: Option<String>,
    #[arg(long)]
    pub number: Option<i64>,
}

#[derive(clap::Args)]
pub struct DeleteArgs {
    /// Customer email
    pub email: String,
}

#[derive(clap::Args)]
pub struct SeedArgs {
    /// Number of customers to create
    #[arg(long, default_value_t = 100)]
    pub count: usize,
    /// Requests in flight at once
    #[arg(long, default_value_t = 16)]
    pub concurrency: usize,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_update_with_partial_fields() {
        let cli = Cli::try_parse_from([
            "clientbook",
            "--server",
            "http://example:3000",
            "update",
            "--email",
            "a@x.com",
            "--address",
            "new",
        ])
        .unwrap();
        assert_eq!(cli.server, "http://example:3000");
        match cli.command {
            Commands::Update(args) => {
                assert_eq!(args.email, "a@x.com");
                assert_eq!(args.address.as_deref(), Some("new"));
                assert!(args.name.is_none());
                assert!(args.number.is_none());
            }
            _ => panic!("expected update"),
        }
    }

    #[test]
    fn seed_defaults() {
        let cli = Cli::try_parse_from(["clientbook", "seed"]).unwrap();
        match cli.command {
            Commands::Seed(args) => {
                assert_eq!(args.count, 100);
                assert_eq!(args.concurrency, 16);
            }
            _ => panic!("expected seed"),
        }
    }
}
