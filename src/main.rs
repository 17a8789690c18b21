/// Main entry point for the Echo tracker MCP server
///
/// This file sets up logging, parses command line arguments, and starts the MCP server.
/// The server listens for JSON-RPC requests over stdin/stdout following the MCP protocol.

use clap::Parser;
use std::path::PathBuf;
use tracing::info;

use echo_tracker::{EchoConfig, EchoServer, DATABASE_FILE};

/// Get the default data directory with robust fallback strategy
fn get_default_data_dir() -> Result<PathBuf, Box<dyn std::error::Error>> {
    // Try various locations in order of preference
    let potential_paths = [
        // 1. User's home directory (preferred)
        dirs::home_dir().map(|p| p.join(".echo")),
        // 2. User's data directory (platform-specific)
        dirs::data_dir().map(|p| p.join("echo")),
        // 3. User's config directory
        dirs::config_dir().map(|p| p.join("echo")),
        // 4. Current working directory (last resort)
        std::env::current_dir().ok().map(|p| p.join(".echo")),
    ];

    for potential_path in potential_paths.iter().flatten() {
        if std::fs::create_dir_all(potential_path).is_ok() {
            // Test if we can write to this directory
            let test_file = potential_path.join(".test_write");
            if std::fs::write(&test_file, "test").is_ok() {
                let _ = std::fs::remove_file(&test_file);
                return Ok(potential_path.clone());
            }
        }
    }

    // Ultimate fallback: use a temporary directory
    let temp_path = std::env::temp_dir().join("echo");
    std::fs::create_dir_all(&temp_path)?;

    tracing::warn!("Using temporary directory for data: {}", temp_path.display());
    Ok(temp_path)
}

/// Make sure the parent directory of a user-supplied path exists
fn prepare_path(path: PathBuf) -> Result<PathBuf, std::io::Error> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            std::fs::create_dir_all(parent)?;
        }
    }
    Ok(path)
}

/// Command line arguments for the Echo tracker MCP server
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to the SQLite database file
    /// If not provided, uses a default location in the user's home directory
    #[arg(long)]
    database: Option<PathBuf>,

    /// Path to the JSON settings file
    /// If not provided, it sits next to the database
    #[arg(long)]
    settings: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long)]
    debug: bool,

    /// Enable verbose output (implies debug)
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    // Set up logging based on command line flags
    let log_level = if args.verbose {
        "debug"
    } else if args.debug {
        "info"
    } else {
        "warn"
    };

    tracing_subscriber::fmt()
        .with_env_filter(format!("echo_tracker={}", log_level))
        .with_writer(std::io::stderr) // Send logs to stderr, not stdout
        .init();

    info!("Starting Echo tracker MCP server");

    let db_path = match args.database {
        Some(path) => prepare_path(path)?,
        None => get_default_data_dir()?.join(DATABASE_FILE),
    };

    let mut config = EchoConfig::new(db_path);
    if let Some(settings) = args.settings {
        config = config.with_settings_path(prepare_path(settings)?);
    }

    info!("Using database at: {}", config.database_path.display());
    info!("Using settings at: {}", config.settings_path.display());

    let server = EchoServer::new(config).await?;

    // Run the MCP server - this will handle JSON-RPC communication over stdin/stdout
    server.run().await?;

    info!("Echo tracker MCP server shutdown complete");
    Ok(())
}
