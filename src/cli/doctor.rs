//! CLI `doctor` command: print the effective configuration and backend readiness.

use anyhow::Result;

use saachi::backend;
use saachi::config::{default_config_path, SaachiConfig};

/// Print a readiness report for the configured backend.
pub fn doctor(config: &SaachiConfig) -> Result<()> {
    let config_path = default_config_path();

    println!("Saachi Health Report");
    println!("====================");
    println!();
    println!(
        "Config file:       {} ({})",
        config_path.display(),
        if config_path.exists() { "found" } else { "not found, using defaults" }
    );
    println!("Transport:         {}", config.server.transport);
    println!("HTTP address:      {}", config.bind_addr());
    println!("Log level:         {}", config.server.log_level);
    println!();
    println!("Backend:");
    println!("  Provider:        {}", config.backend.provider);

    match backend::create_backend(&config.backend) {
        Ok(_) => println!("  Status:          OK"),
        Err(e) => {
            println!("  Status:          FAILED ({e})");
            return Ok(());
        }
    }

    if config.backend.provider == "gemini" {
        println!("  Model:           {}", config.backend.model);
        println!("  Endpoint:        {}", config.backend.api_base);
        println!("  Temperature:     {}", config.backend.temperature);
        match config.backend.api_key() {
            Some(key) => println!("  API key:         set ({})", mask(key)),
            None => {
                println!("  API key:         MISSING");
                println!();
                println!("Every request will fail until GOOGLE_API_KEY is set, or run with");
                println!("SAACHI_PROVIDER=heuristic for the offline backend.");
            }
        }
    }

    Ok(())
}

/// Keys shorter than this are starred out entirely.
const MIN_REVEAL_LEN: usize = 12;

/// Last four characters of a secret, the rest starred out. Short secrets
/// show nothing.
fn mask(secret: &str) -> String {
    let chars: Vec<char> = secret.chars().collect();
    if chars.len() < MIN_REVEAL_LEN {
        return "*".repeat(chars.len().max(4));
    }
    let hidden = chars.len() - 4;
    let tail: String = chars[hidden..].iter().collect();
    format!("{}{tail}", "*".repeat(hidden))
}
