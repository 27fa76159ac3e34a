//! AI inference layer: pluggable sentiment providers, the keyword fallback,
//! and the rating-first resolver that combines them.

pub mod evaluate;
pub mod keywords;
pub mod provider;
pub mod resolver;

pub use evaluate::{Evaluation, evaluate};
pub use provider::{
    InferenceCapability, InferenceError, InferenceProvider, Prediction, SummaryBounds,
    SummaryPolicy,
};
pub use resolver::Resolver;

#[cfg(feature = "onnx")]
mod onnx;
#[cfg(feature = "onnx")]
pub use onnx::SentimentModel;

#[cfg(feature = "http")]
mod http;
#[cfg(feature = "http")]
pub use http::{DEFAULT_TIMEOUT as DEFAULT_INFERENCE_TIMEOUT, HttpProvider};
