mod commands;
pub mod core;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use crate::commands::Cli;
use crate::core::state::AppState;

pub use crate::core::config::SkinConfig;
pub use crate::core::error::{ExtractionError, SkinError, SkinResult};
pub use crate::core::fetcher::TextureFetcher;
pub use crate::core::outcome::{FetchOutcome, LookupOutcome, OutcomeKind};
pub use crate::core::resolver::SkinResolver;
pub use crate::core::skins::{ImageSkinExtractor, SkinExtractor};

/// CLI entry point. Returns the process exit code.
pub fn run() -> i32 {
    // Initialize structured logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,mcskin_lib=debug")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let runtime = match tokio::runtime::Runtime::new() {
        Ok(runtime) => runtime,
        Err(e) => {
            tracing::error!("Could not start async runtime: {}", e);
            return 1;
        }
    };

    let result = runtime.block_on(async move {
        let config = cli.load_config()?;
        let state = AppState::new(config)?;
        commands::execute(&state, cli.command).await
    });

    match result {
        Ok(true) => 0,
        Ok(false) => 1,
        Err(e) => {
            tracing::error!("{}", e);
            1
        }
    }
}
