use clap::Parser;
use color_eyre::eyre::{Result, WrapErr};
use tracing::info;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use progressive_media::infrastructure::config::Command;
use progressive_media::infrastructure::{AppConfig, CliArgs, StorageManager};
use progressive_media::presentation::{run_batch, run_init_config, run_load, run_render};

fn init_logging(config: &AppConfig) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.log_level.to_string()));

    if let Some(log_path) = &config.log_path {
        if let Some(parent) = log_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(log_path)?;

        let file_layer = fmt::layer()
            .with_writer(file)
            .with_ansi(false)
            .with_target(true)
            .with_thread_ids(false);

        tracing_subscriber::registry()
            .with(filter)
            .with(file_layer)
            .init();

        info!(path = %log_path.display(), "Logging initialized");
    } else {
        let stderr_layer = fmt::layer()
            .with_writer(std::io::stderr)
            .with_target(false);

        tracing_subscriber::registry()
            .with(filter)
            .with(stderr_layer)
            .init();
    }

    Ok(())
}

fn load_config(storage: &StorageManager, args: &CliArgs) -> Result<AppConfig> {
    let mut config = storage
        .load_config(args.config.as_deref())
        .wrap_err("Failed to load configuration")?;
    config.merge_with_args(args);
    Ok(config)
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    color_eyre::install()?;

    let args = CliArgs::parse();
    let storage = StorageManager::new().wrap_err("Failed to locate configuration directory")?;
    let config = load_config(&storage, &args)?;
    init_logging(&config)?;

    info!(version = progressive_media::VERSION, "Starting {}", progressive_media::NAME);

    match args.command {
        Command::Render {
            manifest,
            context,
            state,
        } => run_render(&manifest, context, state),
        Command::Load {
            manifest,
            eager,
            visible_after_ms,
            deadline,
        } => run_load(&config, &manifest, eager, visible_after_ms, deadline).await,
        Command::Batch {
            manifests,
            deadline,
        } => run_batch(&config, &manifests, deadline).await,
        Command::InitConfig => run_init_config(&storage, &config),
    }
}
