use std::fmt;

use bytes::Bytes;
use http_body_util::{Either, Empty, Full};
use hyper::header::{HeaderName, HeaderValue};
use hyper::{Method, Request, Uri};
use url::Url;

use crate::error::{RequestError, RequestResult};

/// Body type sent through the shared client. `Empty` means "no body",
/// which is not the same thing on the wire as a zero-length entity.
pub type RequestBody = Either<Full<Bytes>, Empty<Bytes>>;

/// Identifies a request in every warning, error and status line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestLabel {
    Ordinal(u64),
    Single,
}

impl fmt::Display for RequestLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RequestLabel::Ordinal(n) => write!(f, "[Request {}]", n),
            RequestLabel::Single => write!(f, "[single request]"),
        }
    }
}

/// The request replicated across every execution of a run. Never mutated
/// once built; executions share it behind an `Arc`.
#[derive(Debug, Clone)]
pub struct RequestTemplate {
    method: String,
    url: String,
    body: Option<Bytes>,
    headers: Vec<String>,
}

impl RequestTemplate {
    pub fn new(method: &str, url: &str, body: &str, headers: Vec<String>) -> Self {
        let body = if body.is_empty() {
            None
        } else {
            Some(Bytes::copy_from_slice(body.as_bytes()))
        };
        RequestTemplate {
            method: method.to_owned(),
            url: url.to_owned(),
            body,
            headers,
        }
    }

    pub fn method(&self) -> &str {
        &self.method
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn body(&self) -> Option<&Bytes> {
        self.body.as_ref()
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    /// Builds one request. Bad header entries are warned about under `label`
    /// and skipped; only the method, URL or the request itself can fail.
    pub fn build(&self, label: RequestLabel) -> RequestResult<Request<RequestBody>> {
        let method = self.parse_method()?;
        let uri = self.parse_uri()?;

        let body = match &self.body {
            Some(bytes) => Either::Left(Full::new(bytes.clone())),
            None => Either::Right(Empty::new()),
        };

        let mut request = Request::builder()
            .method(method)
            .uri(uri)
            .body(body)
            .map_err(|source| RequestError::Build { source })?;

        let headers = request.headers_mut();
        for raw in &self.headers {
            match parse_header_entry(raw) {
                // Last write wins per key.
                Ok((name, value)) => {
                    headers.insert(name, value);
                }
                Err(err) => tracing::warn!("{} {}", label, err),
            }
        }

        Ok(request)
    }

    fn parse_method(&self) -> RequestResult<Method> {
        let upper = self.method.to_uppercase();
        Method::from_bytes(upper.as_bytes())
            .map_err(|_| RequestError::InvalidMethod { method: upper })
    }

    fn parse_uri(&self) -> RequestResult<Uri> {
        let url = Url::parse(&self.url).map_err(|e| RequestError::InvalidUrl {
            url: self.url.clone(),
            reason: e.to_string(),
        })?;
        url.as_str()
            .parse::<Uri>()
            .map_err(|e| RequestError::InvalidUrl {
                url: self.url.clone(),
                reason: e.to_string(),
            })
    }
}

/// Splits a raw `Key: Value` entry at its first colon, trimming both sides.
pub fn parse_header(raw: &str) -> RequestResult<(String, String)> {
    match raw.split_once(':') {
        Some((key, value)) => Ok((key.trim().to_owned(), value.trim().to_owned())),
        None => Err(RequestError::MalformedHeader {
            value: raw.to_owned(),
        }),
    }
}

fn parse_header_entry(raw: &str) -> RequestResult<(HeaderName, HeaderValue)> {
    let (key, value) = parse_header(raw)?;
    let name = HeaderName::from_bytes(key.as_bytes()).map_err(|e| RequestError::RejectedHeader {
        value: raw.to_owned(),
        reason: e.to_string(),
    })?;
    let value = HeaderValue::from_str(&value).map_err(|e| RequestError::RejectedHeader {
        value: raw.to_owned(),
        reason: e.to_string(),
    })?;
    Ok((name, value))
}

#[cfg(test)]
mod tests {
    use super::*;
    use hyper::body::Body;

    fn template(method: &str, body: &str, headers: &[&str]) -> RequestTemplate {
        RequestTemplate::new(
            method,
            "http://localhost:8080/items",
            body,
            headers.iter().map(|h| h.to_string()).collect(),
        )
    }

    #[test]
    fn parse_header_trims_around_first_colon() {
        let (key, value) = parse_header("  Content-Type :  application/json ").unwrap();
        assert_eq!(key, "Content-Type");
        assert_eq!(value, "application/json");

        let (key, value) = parse_header("X-Time: 12:30:00").unwrap();
        assert_eq!(key, "X-Time");
        assert_eq!(value, "12:30:00");
    }

    #[test]
    fn parse_header_without_colon_is_malformed() {
        let err = parse_header("NoColonHere").unwrap_err();
        assert!(matches!(err, RequestError::MalformedHeader { .. }));
    }

    #[test]
    fn build_uppercases_method() {
        let request = template("post", "", &[]).build(RequestLabel::Single).unwrap();
        assert_eq!(request.method(), Method::POST);
    }

    #[test]
    fn build_skips_malformed_headers_and_keeps_the_rest() {
        let request = template("get", "", &["NoColonHere", "X-One: 1", "Bad Name: x", "X-Two:2"])
            .build(RequestLabel::Ordinal(3))
            .unwrap();
        let headers = request.headers();
        assert_eq!(headers.len(), 2);
        assert_eq!(headers["x-one"], "1");
        assert_eq!(headers["x-two"], "2");
    }

    #[test]
    fn repeated_header_key_keeps_last_value() {
        let request = template("get", "", &["X-Key: first", "x-key: second"])
            .build(RequestLabel::Single)
            .unwrap();
        let values: Vec<_> = request.headers().get_all("x-key").iter().collect();
        assert_eq!(values, vec!["second"]);
    }

    #[test]
    fn empty_body_means_no_body() {
        let request = template("post", "", &[]).build(RequestLabel::Single).unwrap();
        assert!(matches!(request.body(), Either::Right(_)));
        assert!(request.body().is_end_stream());
    }

    #[test]
    fn non_empty_body_is_sent_verbatim() {
        let request = template("post", "{}", &[]).build(RequestLabel::Single).unwrap();
        assert!(matches!(request.body(), Either::Left(_)));
        assert_eq!(request.body().size_hint().exact(), Some(2));
    }

    #[test]
    fn invalid_url_is_a_build_error() {
        let err = RequestTemplate::new("GET", "not a url", "", vec![])
            .build(RequestLabel::Ordinal(1))
            .unwrap_err();
        assert!(matches!(err, RequestError::InvalidUrl { .. }));
        assert!(err.is_build());
    }

    #[test]
    fn invalid_method_is_a_build_error() {
        let err = template("GE T", "", &[]).build(RequestLabel::Single).unwrap_err();
        assert!(matches!(err, RequestError::InvalidMethod { .. }));
    }

    #[test]
    fn labels_render_with_ordinal() {
        assert_eq!(RequestLabel::Ordinal(7).to_string(), "[Request 7]");
        assert_eq!(RequestLabel::Single.to_string(), "[single request]");
    }
}
