use anyhow::Context;
use clap::{Parser, Subcommand};
use shelf_kernel::{settings::Settings, InitCtx, ModuleRegistry};

#[derive(Debug, Parser)]
#[command(name = "shelf", version, about = "In-memory bookshelf HTTP service")]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Run the HTTP server (default)
    Serve,
    /// Print the merged OpenAPI document as JSON
    Openapi,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let settings = Settings::load().with_context(|| "failed to load shelf settings")?;

    let mut registry = ModuleRegistry::new();
    shelf_app::register_all(&mut registry).context("failed to register modules")?;

    match cli.command.unwrap_or(Command::Serve) {
        Command::Serve => serve(&registry, &settings).await,
        Command::Openapi => {
            let document =
                shelf_http::router::openapi_document(&registry, &settings.server.api_prefix);
            let rendered = serde_json::to_string_pretty(&document)
                .context("failed to render OpenAPI document")?;
            println!("{rendered}");
            Ok(())
        }
    }
}

async fn serve(registry: &ModuleRegistry, settings: &Settings) -> anyhow::Result<()> {
    shelf_telemetry::init(&settings.telemetry)?;

    tracing::info!(
        env = ?settings.environment,
        modules = registry.module_count(),
        "shelf bootstrap starting"
    );

    let ctx = InitCtx { settings };
    registry.init_modules(&ctx).await?;
    registry.start_modules(&ctx).await?;

    tracing::info!("shelf bootstrap complete");

    let served = shelf_http::start_server(registry, settings, shelf_http::shutdown_signal()).await;

    // Stop modules even when the server failed, then report the first error
    let stopped = registry.stop_modules().await;
    served?;
    stopped
}
