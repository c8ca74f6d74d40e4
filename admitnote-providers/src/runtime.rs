use crate::request::{Body, HttpRequest};
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use std::time::Duration;
use thiserror::Error;

const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);
// Image extraction with a large output budget can take a while.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(90);

#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status: u16,
    pub body: Vec<u8>,
}

impl HttpResponse {
    pub fn is_success(&self) -> bool {
        (200..=299).contains(&self.status)
    }
}

#[derive(Debug, Error)]
pub enum ExecuteError {
    /// The request could not be built locally (bad header value, unsupported method).
    #[error("invalid request: {0}")]
    InvalidRequest(String),
    /// A header value that HTTP cannot carry (control characters, newlines).
    #[error("invalid value for header {name}")]
    InvalidHeader { name: String },
    #[error("request timed out")]
    Timeout,
    /// The request never got a response from the server.
    #[error("could not reach server: {0}")]
    Unreachable(String),
    #[error("failed reading response body: {0}")]
    Body(String),
}

pub async fn execute(req: &HttpRequest) -> Result<HttpResponse, ExecuteError> {
    // Without an explicit timeout a stalled endpoint would hang the caller's
    // retry loop indefinitely.
    let client = reqwest::Client::builder()
        .connect_timeout(CONNECT_TIMEOUT)
        .timeout(REQUEST_TIMEOUT)
        .build()
        .map_err(|e| ExecuteError::InvalidRequest(format!("build http client: {e}")))?;

    let mut headers = HeaderMap::new();
    for (k, v) in &req.headers {
        let name = HeaderName::from_bytes(k.as_bytes())
            .map_err(|_| ExecuteError::InvalidRequest(format!("invalid header name: {k}")))?;
        let value = HeaderValue::from_str(v)
            .map_err(|_| ExecuteError::InvalidHeader { name: k.clone() })?;
        headers.insert(name, value);
    }

    let builder = match req.method.as_str() {
        "GET" => client.get(&req.url),
        "POST" => client.post(&req.url),
        other => {
            return Err(ExecuteError::InvalidRequest(format!(
                "unsupported method: {other}"
            )));
        }
    }
    .headers(headers);

    let builder = match &req.body {
        Body::Empty => builder,
        Body::Json(s) => builder.body(s.clone()),
    };

    let resp = builder.send().await.map_err(classify_send_error)?;
    let status = resp.status().as_u16();
    let body = resp
        .bytes()
        .await
        .map_err(|e| {
            if e.is_timeout() {
                ExecuteError::Timeout
            } else {
                ExecuteError::Body(e.to_string())
            }
        })?
        .to_vec();

    log::debug!("{} {} -> {status} ({} bytes)", req.method, req.url, body.len());
    Ok(HttpResponse { status, body })
}

fn classify_send_error(e: reqwest::Error) -> ExecuteError {
    if e.is_timeout() {
        ExecuteError::Timeout
    } else if e.is_builder() {
        ExecuteError::InvalidRequest(e.to_string())
    } else {
        ExecuteError::Unreachable(e.to_string())
    }
}
