use anyhow::Context;
use bookshelf_kernel::settings::Settings;
use clap::{Parser, Subcommand};

/// Operate the bookshelf service
#[derive(Debug, Parser)]
#[command(name = "bookshelf", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Ensure the schema exists and serve HTTP until shutdown (default)
    Serve,
    /// Ensure the schema exists, then exit
    Migrate,
    /// Print the resolved configuration with credentials masked
    Settings,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let settings = Settings::load().with_context(|| "failed to load bookshelf settings")?;

    match cli.command.unwrap_or(Command::Serve) {
        Command::Settings => {
            let rendered = serde_json::to_string_pretty(&settings.redacted())
                .with_context(|| "failed to render settings")?;
            println!("{rendered}");
        }
        Command::Migrate => {
            bookshelf_telemetry::init(&settings.telemetry)?;
            bookshelf_app::migrate(&settings).await?;
            tracing::info!("schema is up to date");
        }
        Command::Serve => {
            bookshelf_telemetry::init(&settings.telemetry)?;
            bookshelf_app::serve(&settings).await?;
        }
    }

    Ok(())
}
