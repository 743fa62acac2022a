use std::time::Duration;

use hyper::body::Incoming;
use hyper::{Request, Response};
use hyper_tls::HttpsConnector;
use hyper_util::client::legacy::connect::HttpConnector;
use hyper_util::client::legacy::Client as HyperClient;
use hyper_util::rt::TokioExecutor;
use tokio::time;

use crate::error::{RequestError, RequestResult};
use crate::template::RequestBody;

type Inner = HyperClient<HttpsConnector<HttpConnector>, RequestBody>;

/// Transport shared by every execution of a run. Cloning is cheap and all
/// clones use the same connection pool.
#[derive(Clone)]
pub struct HttpClient {
    inner: Inner,
    timeout: Option<Duration>,
}

impl HttpClient {
    pub fn new(timeout: Option<Duration>) -> Self {
        let mut http = HttpConnector::new();
        http.enforce_http(false);
        let https = HttpsConnector::new_with_connector(http);
        let inner = HyperClient::builder(TokioExecutor::new())
            .pool_idle_timeout(Duration::from_secs(30))
            .build(https);

        HttpClient { inner, timeout }
    }

    /// Sends one request, bounded by the per-request timeout if one is set.
    pub async fn send(&self, request: Request<RequestBody>) -> RequestResult<Response<Incoming>> {
        let pending = self.inner.request(request);
        let result = match self.timeout {
            Some(timeout) => time::timeout(timeout, pending)
                .await
                .map_err(|_| RequestError::Timeout { timeout })?,
            None => pending.await,
        };
        result.map_err(|source| RequestError::Transport { source })
    }
}
