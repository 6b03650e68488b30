use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use plantwatch::artifact::ArtifactPipeline;
use plantwatch::logging::{ConsoleLogger, Logger};
use plantwatch::render::PlantUmlRenderer;
use plantwatch::watcher::{ChangeDispatcher, EventFilter};
use plantwatch::Settings;

#[derive(Parser)]
#[command(name = "plantwatch")]
#[command(about = "Keeps rendered diagram images in sync with their PlantUML sources")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Watch the diagram tree and keep artifacts in sync (default)
    Watch {
        /// Directory to watch (overrides configuration)
        #[arg(long)]
        root: Option<PathBuf>,
    },

    /// Initialize configuration file
    Init {
        /// Force overwrite existing configuration
        #[arg(short, long)]
        force: bool,
    },

    /// Show current configuration
    Config,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    // Bare invocation watches: the process takes no arguments to do its job.
    let command = cli.command.unwrap_or(Commands::Watch { root: None });

    // For non-init commands, warn when the project is not initialized
    if !matches!(command, Commands::Init { .. }) {
        if let Err(warning) = Settings::check_init() {
            eprintln!("Warning: {warning}");
            eprintln!("Using default configuration for now.");
        }
    }

    let settings = Settings::load().unwrap_or_else(|e| {
        eprintln!("Configuration error: {e}");
        Settings::default()
    });

    plantwatch::logging::init_with_config(&settings.logging);

    match command {
        Commands::Init { force } => {
            let path = Settings::init_config_file(force)
                .context("failed to initialize configuration")?;
            println!("Created configuration at: {}", path.display());
        }

        Commands::Config => {
            let toml =
                toml::to_string_pretty(&settings).context("failed to render configuration")?;
            print!("{toml}");
        }

        Commands::Watch { root } => {
            run_watch(settings, root).await?;
        }
    }

    Ok(())
}

async fn run_watch(mut settings: Settings, root_override: Option<PathBuf>) -> anyhow::Result<()> {
    if let Some(root) = root_override {
        settings.watch_root = Some(root);
    }

    let root = settings.resolved_watch_root();
    let style = settings.resolved_style_path(&root);

    let logger: Arc<dyn Logger> = Arc::new(ConsoleLogger);
    let renderer = Arc::new(PlantUmlRenderer::new(settings.render.plantuml_bin.clone()));
    let pipeline = Arc::new(ArtifactPipeline::new(
        renderer,
        logger.clone(),
        settings.render.output_format,
        style,
    ));
    let filter = EventFilter::new(
        root.clone(),
        settings.watch.source_extensions.clone(),
        settings.watch.exclude_dirs.clone(),
    );

    let dispatcher = ChangeDispatcher::builder()
        .root(root)
        .filter(filter)
        .pipeline(pipeline)
        .logger(logger)
        .supersede_renders(settings.watch.supersede_renders)
        .build()
        .context("failed to start watcher")?;

    dispatcher.watch().await.context("watch loop failed")
}
