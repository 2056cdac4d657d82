// src/workflow/runner.rs — Side-effect seam for replaying actions

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Method};
use url::Url;

use crate::core::types::{Action, ActionKind};
use crate::infra::config::ExecutorConfig;
use crate::infra::errors::FlowError;

/// Performs one action's side effect.
#[async_trait]
pub trait ActionRunner: Send + Sync {
    async fn run(&self, action: &Action) -> Result<(), FlowError>;
}

/// Replays `api` actions as HTTP requests. Other kinds are rejected.
pub struct HttpRunner {
    client: Client,
    base_url: Option<Url>,
}

impl HttpRunner {
    pub fn new(config: &ExecutorConfig) -> Result<Self, FlowError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()?;
        let base_url = config
            .base_url
            .as_deref()
            .map(|raw| {
                Url::parse(raw).map_err(|e| FlowError::InvalidUrl {
                    url: raw.to_string(),
                    reason: e.to_string(),
                })
            })
            .transpose()?;
        Ok(Self { client, base_url })
    }

    /// Absolute http(s) URL for a recorded target. Relative targets need a
    /// configured base URL.
    pub fn resolve_url(&self, raw: &str) -> Result<Url, FlowError> {
        let invalid = |reason: String| FlowError::InvalidUrl {
            url: raw.to_string(),
            reason,
        };
        let url = match Url::parse(raw) {
            Ok(url) => url,
            Err(url::ParseError::RelativeUrlWithoutBase) => match &self.base_url {
                Some(base) => base.join(raw).map_err(|e| invalid(e.to_string()))?,
                None => return Err(invalid("missing scheme".into())),
            },
            Err(e) => return Err(invalid(e.to_string())),
        };
        match url.scheme() {
            "http" | "https" => Ok(url),
            other => Err(invalid(format!("unsupported scheme '{other}'"))),
        }
    }
}

#[async_trait]
impl ActionRunner for HttpRunner {
    async fn run(&self, action: &Action) -> Result<(), FlowError> {
        let (method, raw_url) = match &action.kind {
            ActionKind::Api { method, url } => (method, url),
            other => {
                return Err(FlowError::UnsupportedAction {
                    action_id: action.id.clone(),
                    kind: other.as_str().to_string(),
                })
            }
        };

        let url = self.resolve_url(raw_url)?;
        let method = Method::from_bytes(method.as_bytes()).map_err(|_| FlowError::Runner {
            action_id: action.id.clone(),
            message: format!("invalid HTTP method '{method}'"),
        })?;

        tracing::debug!("Replaying {} {}", method, url);
        let resp = self.client.request(method, url).send().await?;
        if !resp.status().is_success() {
            return Err(FlowError::Runner {
                action_id: action.id.clone(),
                message: format!("HTTP {}", resp.status()),
            });
        }
        Ok(())
    }
}

/// Wraps a synchronous closure, for embedding hosts and tests.
pub struct FnRunner<F> {
    f: F,
}

impl<F> FnRunner<F>
where
    F: Fn(&Action) -> Result<(), FlowError> + Send + Sync,
{
    pub fn new(f: F) -> Self {
        Self { f }
    }
}

#[async_trait]
impl<F> ActionRunner for FnRunner<F>
where
    F: Fn(&Action) -> Result<(), FlowError> + Send + Sync,
{
    async fn run(&self, action: &Action) -> Result<(), FlowError> {
        (self.f)(action)
    }
}
