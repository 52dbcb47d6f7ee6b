pub mod history;
pub mod report;
pub mod run;
pub mod status;
pub mod version;

use crate::cli::ConfigArgs;
use chatsift_compress::{AnthropicBackend, RetryingClient};
use chatsift_core::{api_key_from_env, Pipeline, PipelineConfig};

/// Config file overlaid with command-line overrides
pub fn resolve_config(args: &ConfigArgs) -> anyhow::Result<PipelineConfig> {
    let mut config = PipelineConfig::load(args.config.as_deref())?;
    if let Some(model) = &args.model {
        config.model = model.clone();
    }
    config.validate()?;
    Ok(config)
}

pub type LivePipeline = Pipeline<RetryingClient<AnthropicBackend>>;

/// Pipeline backed by the Anthropic API with retries
pub fn live_pipeline(config: PipelineConfig) -> anyhow::Result<LivePipeline> {
    let api_key = api_key_from_env()?;
    let backend = AnthropicBackend::new(&api_key, &config.model, config.request_timeout())?;
    let client = RetryingClient::new(backend, config.retry_policy());
    tracing::info!("Summarizing with model {}", config.model);
    Ok(Pipeline::new(client, config))
}

/// Single-threaded runtime; requests are issued one at a time
pub fn runtime() -> anyhow::Result<tokio::runtime::Runtime> {
    Ok(tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?)
}
