//! Remote inference over HTTP.
//!
//! Talks to a small model server exposing two endpoints:
//!
//! - `POST {base}/classify` with `{"text": ...}` answering `{"label", "score"}`
//!   (a one-element list, as pipeline servers tend to return, is accepted too)
//! - `POST {base}/summarize` with `{"text", "max_length", "min_length", "do_sample"}`
//!   answering `{"summary_text": ...}` (or a one-element list of that)

use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::provider::{InferenceError, InferenceProvider, Prediction, SummaryBounds};

/// Request timeout used when none is configured.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Blocking HTTP client for a remote sentiment model server.
pub struct HttpProvider {
    client: reqwest::blocking::Client,
    base_url: String,
    timeout: Duration,
    name: String,
}

#[derive(Serialize)]
struct ClassifyRequest<'a> {
    text: &'a str,
}

#[derive(Serialize)]
struct SummarizeRequest<'a> {
    text: &'a str,
    max_length: usize,
    min_length: usize,
    do_sample: bool,
}

#[derive(Deserialize)]
struct Summary {
    summary_text: String,
}

/// A single value or a list whose first element is the answer.
#[derive(Deserialize)]
#[serde(untagged)]
enum OneOrMany<T> {
    One(T),
    Many(Vec<T>),
}

impl<T> OneOrMany<T> {
    fn into_first(self) -> Option<T> {
        match self {
            Self::One(v) => Some(v),
            Self::Many(v) => v.into_iter().next(),
        }
    }
}

impl HttpProvider {
    /// Create a client for the given base URL, e.g. `http://localhost:9000`.
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, InferenceError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .build()?;
        let base_url = base_url.trim_end_matches('/').to_string();
        info!(url = %base_url, ?timeout, "using remote inference server");
        Ok(Self {
            client,
            name: format!("http:{base_url}"),
            base_url,
            timeout,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn post<B: Serialize, R: for<'de> Deserialize<'de>>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<R, InferenceError> {
        let url = format!("{}/{path}", self.base_url);
        debug!(url = %url, "inference request");
        let resp = self
            .client
            .post(&url)
            .json(body)
            .send()
            .map_err(|e| self.map_err(e))?;
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().unwrap_or_default();
            return Err(InferenceError::Server {
                status: status.as_u16(),
                body,
            });
        }
        let raw = resp.text().map_err(|e| self.map_err(e))?;
        serde_json::from_str(&raw)
            .map_err(|e| InferenceError::Other(format!("malformed response from {url}: {e}")))
    }

    fn map_err(&self, e: reqwest::Error) -> InferenceError {
        if e.is_timeout() {
            InferenceError::Timeout(self.timeout)
        } else {
            InferenceError::Http(e)
        }
    }
}

impl InferenceProvider for HttpProvider {
    fn name(&self) -> &str {
        &self.name
    }

    fn classify(&self, text: &str) -> Result<Prediction, InferenceError> {
        let answer: OneOrMany<Prediction> = self.post("classify", &ClassifyRequest { text })?;
        answer
            .into_first()
            .ok_or_else(|| InferenceError::Other("empty classification response".into()))
    }

    fn summarize(&self, text: &str, bounds: SummaryBounds) -> Result<String, InferenceError> {
        let request = SummarizeRequest {
            text,
            max_length: bounds.max_words,
            min_length: bounds.min_words,
            do_sample: false,
        };
        let answer: OneOrMany<Summary> = self.post("summarize", &request)?;
        answer
            .into_first()
            .map(|s| s.summary_text)
            .ok_or_else(|| InferenceError::Other("empty summarization response".into()))
    }
}
