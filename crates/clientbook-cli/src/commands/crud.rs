use anyhow::Result;
use clientbook_storage::{CustomerPatch, NewCustomer};
use colored::Colorize;

use crate::cli::{AddArgs, OutputFormat, UpdateArgs};
use crate::client::ClientbookClient;
use crate::output::{print_customer, print_customers, print_success};

pub async fn list(
    client: &ClientbookClient,
    limit: Option<i64>,
    offset: Option<i64>,
    format: OutputFormat,
) -> Result<()> {
    let page = client.list(limit, offset).await?;
    print_customers(&page.customers, format)?;
    if matches!(format, OutputFormat::Table) {
        if let Some(cache) = page.cache {
            println!("{}: {}", "Cache".cyan(), cache);
        }
    }
    Ok(())
}

pub async fn get(client: &ClientbookClient, email: &str, format: OutputFormat) -> Result<()> {
    let customer = client.get(email).await?;
    print_customer(&customer, format)
}

pub async fn add(client: &ClientbookClient, args: &AddArgs) -> Result<()> {
    let customer = NewCustomer::new(&args.email)
        .with_name(&args.name)
        .with_address(&args.address)
        .with_number(args.number);
    let msg = client.add(&customer).await?;
    print_success(msg.trim());
    Ok(())
}

pub async fn update(client: &ClientbookClient, args: &UpdateArgs) -> Result<()> {
    let patch = CustomerPatch {
        email: args.email.clone(),
        name: args.name.clone(),
        address: args.address.clone(),
        number: args.number,
    };
    let msg = client.update(&patch).await?;
    print_success(msg.trim());
    Ok(())
}

pub async fn delete(client: &ClientbookClient, email: &str) -> Result<()> {
    let msg = client.delete(email).await?;
    print_success(msg.trim());
    Ok(())
}
