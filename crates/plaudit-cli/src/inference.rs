//! Provider selection from command-line configuration.

use std::path::PathBuf;
use std::time::Duration;

use clap::Args;
use plaudit_ai::{
    DEFAULT_INFERENCE_TIMEOUT, HttpProvider, InferenceCapability, InferenceProvider, Resolver,
    SentimentModel, SummaryBounds, SummaryPolicy,
};
use tracing::{info, warn};

#[derive(Debug, Clone, Args)]
pub struct InferenceArgs {
    /// Directory with a local ONNX sentiment model (model.onnx, tokenizer.json)
    #[arg(long, env = "PLAUDIT_MODEL_DIR", global = true)]
    pub model_dir: Option<PathBuf>,

    /// Base URL of a remote inference server, used when no model dir is given
    #[arg(long, env = "PLAUDIT_INFERENCE_URL", global = true)]
    pub inference_url: Option<String>,

    #[arg(long, default_value_t = DEFAULT_INFERENCE_TIMEOUT.as_secs(), global = true)]
    pub inference_timeout_secs: u64,

    /// Texts longer than this many words are summarized before classification
    #[arg(long, default_value_t = 512, global = true)]
    pub summarize_threshold: usize,

    #[arg(long, default_value_t = 50, global = true)]
    pub summary_min_words: usize,

    #[arg(long, default_value_t = 150, global = true)]
    pub summary_max_words: usize,
}

impl InferenceArgs {
    pub fn policy(&self) -> SummaryPolicy {
        SummaryPolicy {
            threshold_words: self.summarize_threshold,
            bounds: SummaryBounds {
                min_words: self.summary_min_words,
                max_words: self.summary_max_words,
            },
        }
    }

    /// Model dir wins over URL. A provider that fails to load leaves the
    /// resolver on the keyword fallback.
    pub fn build_resolver(&self) -> Resolver {
        let provider = match self.load_provider() {
            Ok(Some(p)) => p,
            Ok(None) => {
                info!("no inference provider configured, using keyword fallback");
                return Resolver::unavailable();
            }
            Err(e) => {
                warn!(error = %e, "inference provider unavailable, using keyword fallback");
                return Resolver::unavailable();
            }
        };
        let capability = InferenceCapability::new(provider, self.policy());
        let policy = capability.policy();
        info!(
            provider = capability.name(),
            summarize_above_words = policy.threshold_words,
            summary_min_words = policy.bounds.min_words,
            summary_max_words = policy.bounds.max_words,
            "inference provider ready"
        );
        Resolver::new(Some(capability))
    }

    fn load_provider(&self) -> anyhow::Result<Option<Box<dyn InferenceProvider>>> {
        if let Some(dir) = &self.model_dir {
            let model = SentimentModel::load(dir)?;
            info!(labels = ?model.labels(), "sentiment model label order");
            return Ok(Some(Box::new(model)));
        }
        if let Some(url) = &self.inference_url {
            let timeout = Duration::from_secs(self.inference_timeout_secs);
            return Ok(Some(Box::new(HttpProvider::new(url, timeout)?)));
        }
        Ok(None)
    }
}
