use std::future::Future;
use std::sync::Arc;

use http_body_util::BodyExt;
use hyper::StatusCode;

use crate::client::HttpClient;
use crate::error::RequestError;
use crate::template::{RequestLabel, RequestTemplate};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    Build,
    Transport,
}

/// Terminal result of one execution. Executions never raise; whatever went
/// wrong has already been logged by the time an `Outcome` is returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// A response arrived. `bytes` counts what was drained before the body
    /// ended or failed.
    Responded { status: StatusCode, bytes: u64 },
    Failed(FailureKind),
}

impl From<&RequestError> for FailureKind {
    fn from(err: &RequestError) -> Self {
        if err.is_build() {
            FailureKind::Build
        } else {
            FailureKind::Transport
        }
    }
}

/// One unit of work the dispatcher launches per ordinal.
pub trait Execute: Send + Sync + 'static {
    fn execute(&self, ordinal: u64) -> impl Future<Output = Outcome> + Send;
}

pub struct HttpExecutor {
    client: HttpClient,
    template: Arc<RequestTemplate>,
}

impl HttpExecutor {
    pub fn new(client: HttpClient, template: Arc<RequestTemplate>) -> Self {
        HttpExecutor { client, template }
    }
}

impl Execute for HttpExecutor {
    async fn execute(&self, ordinal: u64) -> Outcome {
        let label = RequestLabel::Ordinal(ordinal);

        let request = match self.template.build(label) {
            Ok(request) => request,
            Err(e) => {
                tracing::error!("{} {}", label, e);
                return Outcome::Failed(FailureKind::from(&e));
            }
        };

        let response = match self.client.send(request).await {
            Ok(response) => response,
            Err(e) => {
                tracing::error!("{} {}", label, e);
                return Outcome::Failed(FailureKind::from(&e));
            }
        };

        let status = response.status();
        println!("{} Status: {}", label, status);

        // Drain so the connection goes back to the pool.
        let mut body = response.into_body();
        let mut bytes = 0u64;
        while let Some(frame) = body.frame().await {
            match frame {
                Ok(frame) => {
                    if let Some(data) = frame.data_ref() {
                        bytes += data.len() as u64;
                    }
                }
                Err(source) => {
                    tracing::error!("{} {}", label, RequestError::BodyDrain { source });
                    break;
                }
            }
        }

        Outcome::Responded { status, bytes }
    }
}
