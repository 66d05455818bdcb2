//! # Shopfront Register Entry Point
//!
//! ## Startup Sequence
//! 1. Initialize tracing (logging to stderr)
//! 2. Load configuration (defaults, then the toml file, then env overrides)
//! 3. Start the register: data directory, database, saved tabs
//! 4. Run the terminal front end until `quit` or end of input

use std::error::Error;

use tracing::info;

use shopfront_register::state::AppConfig;
use shopfront_register::{init_tracing, terminal, Register};

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    init_tracing();

    let config = AppConfig::load()?;
    info!(store = %config.store_name, data_dir = ?config.data_dir, "Starting Shopfront register");

    let register = Register::start(config).await?;
    terminal::run(&register).await?;

    info!("Register closed");
    Ok(())
}
