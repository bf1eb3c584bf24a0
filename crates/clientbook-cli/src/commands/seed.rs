use std::sync::Arc;

use anyhow::Result;
use clientbook_storage::NewCustomer;
use colored::Colorize;
use rand::Rng;
use rand::seq::SliceRandom;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;

use crate::client::ClientbookClient;
use crate::output::{print_error, print_success};

const FIRST_NAMES: &[&str] = &[
    "Ada", "Alan", "Grace", "Linus", "Margaret", "Dennis", "Barbara", "Ken", "Frances", "Edsger",
    "Radia", "John", "Katherine", "Niklaus", "Hedy", "Donald",
];

const LAST_NAMES: &[&str] = &[
    "Lovelace", "Turing", "Hopper", "Torvalds", "Hamilton", "Ritchie", "Liskov", "Thompson",
    "Allen", "Dijkstra", "Perlman", "Backus", "Johnson", "Wirth", "Lamarr", "Knuth",
];

const STREETS: &[&str] = &[
    "Main St", "Oak Ave", "Pine Rd", "Maple Dr", "Cedar Ln", "Elm St", "Lake Blvd", "Hill Ct",
];

const CITIES: &[(&str, &str)] = &[
    ("Springfield", "IL"),
    ("Portland", "OR"),
    ("Austin", "TX"),
    ("Madison", "WI"),
    ("Boulder", "CO"),
    ("Raleigh", "NC"),
    ("Tucson", "AZ"),
    ("Albany", "NY"),
];

const DOMAINS: &[&str] = &["example.com", "example.org", "example.net"];

/// Builds one random customer. Addresses read `street, city, state, zip`
/// and numbers fall in `1..=100`.
pub fn random_customer<R: Rng>(rng: &mut R) -> NewCustomer {
    let first = FIRST_NAMES.choose(rng).copied().unwrap_or("Ada");
    let last = LAST_NAMES.choose(rng).copied().unwrap_or("Lovelace");
    let domain = DOMAINS.choose(rng).copied().unwrap_or("example.com");
    let street = STREETS.choose(rng).copied().unwrap_or("Main St");
    let (city, state) = CITIES.choose(rng).copied().unwrap_or(("Springfield", "IL"));

    let tag: u32 = rng.gen_range(0..1_000_000);
    let email = format!(
        "{}.{}{tag}@{domain}",
        first.to_lowercase(),
        last.to_lowercase()
    );
    let address = format!(
        "{} {street}, {city}, {state}, {:05}",
        rng.gen_range(1..10_000),
        rng.gen_range(10_000..100_000)
    );

    NewCustomer::new(email)
        .with_name(format!("{first} {last}"))
        .with_address(address)
        .with_number(rng.gen_range(1..=100))
}

/// Posts `count` random customers with at most `concurrency` requests in
/// flight. Failures are reported and counted, not fatal.
pub async fn seed(client: &ClientbookClient, count: usize, concurrency: usize) -> Result<()> {
    let permits = Arc::new(Semaphore::new(concurrency.max(1)));
    let mut tasks = JoinSet::new();

    for _ in 0..count {
        let customer = random_customer(&mut rand::thread_rng());
        let client = client.clone();
        let permits = Arc::clone(&permits);
        tasks.spawn(async move {
            let _permit = permits.acquire_owned().await?;
            client.add(&customer).await?;
            anyhow::Ok(customer.email)
        });
    }

    let mut created = 0usize;
    let mut failed = 0usize;
    while let Some(joined) = tasks.join_next().await {
        match joined {
            Ok(Ok(email)) => {
                created += 1;
                print_success(&format!("Created {email}"));
            }
            Ok(Err(e)) => {
                failed += 1;
                print_error(&format!("{e:#}"));
            }
            Err(e) => {
                failed += 1;
                print_error(&format!("Seed task panicked: {e}"));
            }
        }
    }

    println!(
        "{}: {} created, {} failed",
        "Seed".cyan(),
        created.to_string().green(),
        if failed == 0 {
            failed.to_string().normal()
        } else {
            failed.to_string().red()
        }
    );
    Ok(())
}
