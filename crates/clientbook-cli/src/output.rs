use crate::cli::OutputFormat;
use anyhow::Result;
use clientbook_storage::Customer;
use colored::Colorize;
use serde::Serialize;
use tabled::builder::Builder;
use tabled::settings::Style;

pub fn print_success(msg: &str) {
    println!("{} {}", "✓".green(), msg);
}

pub fn print_error(msg: &str) {
    eprintln!("{} {}", "✗".red(), msg);
}

pub fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

pub fn print_customers(customers: &[Customer], format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Json => print_json(customers),
        OutputFormat::Table => {
            if customers.is_empty() {
                println!("No customers found.");
            } else {
                println!("{}", customers_table(customers));
            }
            Ok(())
        }
    }
}

pub fn print_customer(customer: &Customer, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Json => print_json(customer),
        OutputFormat::Table => {
            println!("{}", customers_table(std::slice::from_ref(customer)));
            Ok(())
        }
    }
}

fn customers_table(customers: &[Customer]) -> String {
    let mut builder = Builder::default();
    builder.push_record(["ID", "Email", "Name", "Address", "Number"]);
    for c in customers {
        builder.push_record([
            c.id.to_string(),
            c.email.clone(),
            c.name.clone(),
            c.address.clone(),
            c.number.to_string(),
        ]);
    }
    builder.build().with(Style::rounded()).to_string()
}
