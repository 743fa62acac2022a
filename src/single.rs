use std::io::{self, Write};

use anyhow::{Context, Result};
use http_body_util::BodyExt;
use hyper::header::HeaderMap;

use crate::client::HttpClient;
use crate::error::RequestError;
use crate::template::{RequestLabel, RequestTemplate};

/// Sends one request and echoes both sides of the exchange. Unlike the
/// concurrent path, any failure here fails the run.
pub async fn run_single(client: &HttpClient, template: &RequestTemplate) -> Result<()> {
    let stdout = io::stdout();
    let mut out = stdout.lock();
    run_single_to(client, template, &mut out).await
}

pub async fn run_single_to<W: Write>(
    client: &HttpClient,
    template: &RequestTemplate,
    out: &mut W,
) -> Result<()> {
    let label = RequestLabel::Single;
    let request = template
        .build(label)
        .with_context(|| format!("{} Error creating request", label))?;

    writeln!(out, "--> {} {}", request.method(), request.uri())?;
    write_headers(out, "-->", request.headers())?;
    if let Some(body) = template.body() {
        writeln!(out, "--> Body: {}", String::from_utf8_lossy(body))?;
    }
    writeln!(out, "-->")?;

    let response = client
        .send(request)
        .await
        .with_context(|| format!("{} Error sending request", label))?;

    writeln!(out, "<-- {}", response.status())?;
    write_headers(out, "<--", response.headers())?;
    writeln!(out, "<--")?;

    let body = response
        .into_body()
        .collect()
        .await
        .map_err(|source| RequestError::BodyDrain { source })
        .with_context(|| format!("{} Error reading response body", label))?
        .to_bytes();
    writeln!(out, "{}", String::from_utf8_lossy(&body))?;
    out.flush()?;

    Ok(())
}

/// One line per value, so repeated keys show every value.
fn write_headers<W: Write>(out: &mut W, prefix: &str, headers: &HeaderMap) -> io::Result<()> {
    for (name, value) in headers {
        writeln!(out, "{} {}: {}", prefix, name, String::from_utf8_lossy(value.as_bytes()))?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn headers_print_each_value() {
        let mut headers = HeaderMap::new();
        headers.append("x-multi", "a".parse().unwrap());
        headers.append("x-multi", "b".parse().unwrap());
        let mut out = Vec::new();
        write_headers(&mut out, "<--", &headers).unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "<-- x-multi: a\n<-- x-multi: b\n");
    }

    #[tokio::test]
    async fn bad_url_fails_before_anything_is_printed() {
        let template = RequestTemplate::new("GET", "::nope", "", vec![]);
        let mut out = Vec::new();
        let err = run_single_to(&HttpClient::new(None), &template, &mut out)
            .await
            .unwrap_err();
        assert!(out.is_empty());
        assert!(err.to_string().contains("Error creating request"));
    }
}
