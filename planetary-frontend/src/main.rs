use clap::Parser;
use planetary_backend::PostGenerator;
use planetary_backend::module::caption::{CaptionFormatter, NameMapper};
use planetary_backend::module::catalog::{CatalogClient, DatasetIndex};
use planetary_common::{BotError, BotResult};
use planetary_frontend::cli::Cli;
use planetary_frontend::config::{self, BotConfigs};
use planetary_frontend::frontend::{Publisher, TwitterPublisher};
use planetary_frontend::logging;
use planetary_frontend::runner::{self, Runner, RunnerConfig};
use std::path::Path;
use std::process::ExitCode;
use std::time::Duration;

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<ExitCode> {
    let dry_run = Cli::parse().dry_run();

    let config = config::read_config(config::config_path())?;
    let _logging_guard = logging::init_logging(
        config.log_dir.as_deref().map(Path::new),
        "planetary-bot",
        &config.log_level,
    )?;

    tracing::info!(
        "Planetary bot starting ({})",
        if dry_run { "test mode" } else { "live" }
    );

    let mut bot = match build_runner(&config, dry_run).await {
        Ok(bot) => bot,
        Err(e) => {
            tracing::error!(kind = e.kind(), "Setup failed: {}", e);
            return Ok(ExitCode::FAILURE);
        }
    };

    let result = bot.run().await;
    Ok(ExitCode::from(runner::exit_status(&result)))
}

/// Load the dataset and wire up the pipeline. Every error here is fatal.
async fn build_runner(config: &BotConfigs, dry_run: bool) -> BotResult<Runner<PostGenerator>> {
    let publisher: Option<Box<dyn Publisher + Send + Sync>> = if dry_run {
        None
    } else {
        let credentials = config.twitter.credentials().ok_or_else(|| {
            BotError::Config(
                "Twitter credentials missing; set [twitter] in the config file or TWITTER_* variables"
                    .to_string(),
            )
        })?;
        Some(Box::new(TwitterPublisher::new(
            credentials,
            config.twitter.upload_url(),
            config.twitter.post_url(),
            config.twitter.timeout(),
        )?))
    };

    let index = DatasetIndex::load(&config.dataset.path).await?;
    let formatter = CaptionFormatter::new(
        NameMapper::new(config.names.clone()),
        config.catalog.viewer_base.clone(),
    );
    let client = CatalogClient::new(config.catalog.client_config())?;
    let generator = PostGenerator::new(index, config.sampler.sampler(), formatter, client);

    Ok(Runner::new(
        generator,
        publisher,
        RunnerConfig {
            max_attempts: config.run.max_attempts,
            retry_delay: Duration::from_secs(config.run.retry_delay_secs),
            dry_run,
        },
    ))
}
