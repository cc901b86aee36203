use std::sync::Arc;

use rw_core::{Error, Result, Summarizer};

use crate::{Config, ModelKind};

pub mod dummy;
pub mod openai;

pub use dummy::DummyModel;
pub use openai::OpenAiModel;

pub fn create_model(config: &Config) -> Result<Arc<dyn Summarizer>> {
    match config.kind {
        ModelKind::OpenAi => {
            let api_key = config
                .api_key
                .clone()
                .ok_or_else(|| Error::Config("OPENAI_API_KEY is required for the openai model".to_string()))?;
            let model = OpenAiModel::new(
                api_key,
                config.base_url.clone(),
                config.model_name.clone(),
                config.max_tokens,
                config.timeout,
            )?;
            Ok(Arc::new(model))
        }
        ModelKind::Dummy => Ok(Arc::new(DummyModel::new())),
    }
}
