use anyhow::Result;
use colored::Colorize;

use crate::client::ClientbookClient;

pub async fn status(client: &ClientbookClient, server: &str) -> Result<()> {
    let (code, body) = client.health().await?;
    if code == 200 {
        println!("{} {} is {}", "✓".green(), server.cyan(), "healthy".green());
    } else {
        println!(
            "{} {} returned {}",
            "✗".red(),
            server.cyan(),
            code.to_string().red(),
        );
    }
    for component in ["storage", "cache"] {
        if let Some(info) = body.get(component) {
            let backend = info.get("backend").and_then(|v| v.as_str()).unwrap_or("-");
            let ok = info.get("ok").and_then(|v| v.as_bool()).unwrap_or(false);
            let state = if ok { "ok".green() } else { "down".red() };
            println!("  {}: {} ({})", component.cyan(), backend, state);
            if let Some(err) = info.get("error").and_then(|v| v.as_str()) {
                println!("    {err}");
            }
        }
    }
    Ok(())
}
