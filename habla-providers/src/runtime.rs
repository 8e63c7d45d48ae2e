use crate::request::{Body, HttpRequest, Method};
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status: u16,
    pub body: Vec<u8>,
}

impl HttpResponse {
    pub fn is_success(&self) -> bool {
        (200..=299).contains(&self.status)
    }

    pub fn body_text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

/// Transport-level failure, before any HTTP status is available.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("invalid request: {0}")]
    InvalidRequest(String),
    #[error("connection failed: {0}")]
    Connect(String),
    #[error("request timed out: {0}")]
    Timeout(String),
    #[error("http request failed: {0}")]
    Other(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timeouts {
    pub connect: Option<Duration>,
    pub total: Option<Duration>,
}

impl Timeouts {
    /// Hosted endpoints: a broken endpoint must not hang the session.
    pub const CLOUD: Timeouts = Timeouts {
        connect: Some(Duration::from_secs(10)),
        total: Some(Duration::from_secs(60)),
    };

    /// The local service answers when it answers; large models can take minutes.
    pub const LOCAL: Timeouts = Timeouts {
        connect: None,
        total: None,
    };
}

pub async fn execute(
    req: &HttpRequest,
    timeouts: Timeouts,
) -> Result<HttpResponse, TransportError> {
    let mut builder = reqwest::Client::builder();
    if let Some(t) = timeouts.connect {
        builder = builder.connect_timeout(t);
    }
    if let Some(t) = timeouts.total {
        builder = builder.timeout(t);
    }
    let client = builder
        .build()
        .map_err(|e| TransportError::Other(format!("build http client: {}", error_chain(&e))))?;

    let mut headers = HeaderMap::new();
    for (k, v) in &req.headers {
        let name = HeaderName::from_bytes(k.as_bytes())
            .map_err(|_| TransportError::InvalidRequest(format!("invalid header name: {k}")))?;
        let value = HeaderValue::from_str(v)
            .map_err(|_| TransportError::InvalidRequest(format!("invalid header value for {k}")))?;
        headers.insert(name, value);
    }

    let builder = match req.method {
        Method::Get => client.get(&req.url),
        Method::Post => client.post(&req.url),
    }
    .headers(headers);

    let builder = match &req.body {
        Body::Empty => builder,
        Body::Json(s) => builder.body(s.clone()),
    };

    let resp = builder.send().await.map_err(classify)?;
    let status = resp.status().as_u16();
    let body = resp.bytes().await.map_err(classify)?.to_vec();

    Ok(HttpResponse { status, body })
}

fn classify(e: reqwest::Error) -> TransportError {
    let detail = error_chain(&e);
    if e.is_timeout() {
        TransportError::Timeout(detail)
    } else if e.is_connect() {
        // DNS resolution failures surface as connect errors too.
        TransportError::Connect(detail)
    } else if e.is_builder() {
        TransportError::InvalidRequest(detail)
    } else {
        TransportError::Other(detail)
    }
}

/// `reqwest::Error`'s Display omits the cause ("connection refused", "dns error"), which is
/// exactly what the user needs to see.
fn error_chain(e: &(dyn std::error::Error + 'static)) -> String {
    let mut out = e.to_string();
    let mut source = e.source();
    while let Some(s) = source {
        let msg = s.to_string();
        if !out.contains(&msg) {
            out.push_str(": ");
            out.push_str(&msg);
        }
        source = s.source();
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn returns_status_and_body_for_non_success() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/tags"))
            .respond_with(ResponseTemplate::new(503).set_body_string("busy"))
            .mount(&server)
            .await;

        let req = HttpRequest::get(format!("{}/api/tags", server.uri()));
        let resp = execute(&req, Timeouts::CLOUD).await.unwrap();
        assert_eq!(resp.status, 503);
        assert!(!resp.is_success());
        assert_eq!(resp.body_text(), "busy");
    }

    #[tokio::test]
    async fn forwards_headers() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/chat"))
            .and(header("authorization", "Bearer k"))
            .and(header("content-type", "application/json"))
            .respond_with(ResponseTemplate::new(200).set_body_string("{}"))
            .expect(1)
            .mount(&server)
            .await;

        let req = HttpRequest::post_json(format!("{}/api/chat", server.uri()), &json!({}))
            .bearer(Some("k"));
        let resp = execute(&req, Timeouts::LOCAL).await.unwrap();
        assert!(resp.is_success());
    }

    #[tokio::test]
    async fn refused_connection_is_a_connect_error() {
        // Bind then drop a listener so the port is very likely closed.
        let port = {
            let l = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
            l.local_addr().unwrap().port()
        };
        let req = HttpRequest::get(format!("http://127.0.0.1:{port}/api/tags"));
        let err = execute(&req, Timeouts::CLOUD).await.unwrap_err();
        assert!(matches!(err, TransportError::Connect(_)), "{err:?}");
    }

    #[tokio::test]
    async fn rejects_malformed_header() {
        let mut req = HttpRequest::get("http://localhost/");
        req.headers.push(("Bad Header".into(), "x".into()));
        let err = execute(&req, Timeouts::LOCAL).await.unwrap_err();
        assert!(matches!(err, TransportError::InvalidRequest(_)));
    }
}
