use anyhow::Result;
use colored::Colorize;

use crate::app::{get_config_dir, init_config};
use crate::constants::DEFAULT_LITELLM_PROXY_URL;
use crate::models::ModelFactory;

use super::Commands;

/// Handle CLI subcommands. Returns true when the command was terminal.
pub async fn handle_command(command: &Commands) -> Result<bool> {
    match command {
        Commands::Init => {
            println!("Initializing Tiller configuration...");
            init_config()?;
            println!("Configuration initialized successfully!");
            Ok(true)
        }
        Commands::List => {
            list_models().await?;
            Ok(true)
        }
        Commands::Version => {
            show_version();
            Ok(true)
        }
        Commands::Status => {
            show_status().await?;
            Ok(true)
        }
    }
}

/// List available models
async fn list_models() -> Result<()> {
    println!("Available models:");
    let models = ModelFactory::list_available().await?;
    for model in models {
        println!("  • {}", model.green());
    }
    Ok(())
}

/// Show version information
fn show_version() {
    println!("Tiller v{}", env!("CARGO_PKG_VERSION"));
    println!("   A conversational Git agent driven by LLM tool calling");
}

/// Show status of all dependencies
async fn show_status() -> Result<()> {
    println!("Tiller Status:");
    println!();

    // Check git
    match which::which("git") {
        Ok(path) => println!("  [OK] git: {}", path.display()),
        Err(_) => println!("  [ERROR] git: Not found on PATH"),
    }

    // Check LiteLLM Proxy
    let proxy_url = std::env::var("LITELLM_PROXY_URL")
        .unwrap_or_else(|_| DEFAULT_LITELLM_PROXY_URL.to_string());
    if proxy_reachable(&proxy_url).await {
        println!("  [OK] LiteLLM Proxy: Running at {}", proxy_url);
    } else {
        println!("  [ERROR] LiteLLM Proxy: Not reachable at {}", proxy_url);
    }

    // Check configuration
    if let Ok(config_dir) = get_config_dir() {
        let config_path = config_dir.join("config.toml");
        if config_path.exists() {
            println!("  [OK] Configuration: {}", config_path.display());
        } else {
            println!("  [WARNING] Configuration: Not found (using defaults)");
        }
    }

    // Environment variables
    println!("\n  Environment:");
    for var in ["LITELLM_PROXY_URL", "LITELLM_MASTER_KEY"] {
        if std::env::var(var).is_ok() {
            println!("    • {}: Set", var);
        }
    }

    println!();
    Ok(())
}

async fn proxy_reachable(proxy_url: &str) -> bool {
    let Ok(client) = reqwest::Client::builder()
        .timeout(std::time::Duration::from_secs(3))
        .build()
    else {
        return false;
    };

    match client.get(format!("{}/health", proxy_url)).send().await {
        Ok(response) => response.status().is_success(),
        Err(_) => false,
    }
}
