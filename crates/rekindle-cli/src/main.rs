//! Rekindle CLI - hot-module reloading for script trees.

mod colors;
mod load;
mod watch;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "rekindle")]
#[command(about = "Hot-module reloading for script trees")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose (debug-level) logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Load a module once and print its dependency closure
    Load {
        /// Module path relative to the root
        module: String,

        /// Script root directory
        #[arg(long, default_value = ".")]
        root: String,
    },

    /// Watch a module and reload it on changes
    Watch {
        /// Module path relative to the root
        module: String,

        /// Script root directory
        #[arg(long, default_value = ".")]
        root: String,

        /// Drive reloads from the watch loop instead of auto-reload
        #[arg(long)]
        no_auto: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::WARN
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(default_level.into()),
        )
        .with_target(false)
        .init();

    match cli.command {
        Commands::Load { module, root } => load::execute(&module, &root)?,

        Commands::Watch {
            module,
            root,
            no_auto,
        } => {
            watch::execute(&module, &root, no_auto).await?;
        }
    }

    Ok(())
}
