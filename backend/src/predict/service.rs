use std::time::{Duration, Instant};

use actix_web::http::StatusCode;
use actix_web::web::{self, Bytes, BytesMut};
use actix_web::HttpRequest;
use futures::StreamExt;
use log::{debug, warn};
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, CONTENT_LENGTH, CONTENT_TYPE};
use serde_json::Value;
use thiserror::Error;
use url::Url;
use uuid::Uuid;

use shared::ClassificationResult;

use super::config::ProxyConfig;
use super::mock::mock_result;
use super::normalize::normalize;

/// Hop-by-hop headers are connection-scoped and must not cross the proxy.
const HOP_BY_HOP_HEADERS: [&str; 9] = [
    "connection",
    "keep-alive",
    "proxy-authenticate",
    "proxy-authorization",
    "te",
    "trailers",
    "transfer-encoding",
    "upgrade",
    "host",
];

const UPSTREAM_TIMEOUT: Duration = Duration::from_secs(30);
const MAX_REDIRECTS: usize = 10;

#[derive(Error, Debug)]
pub enum PredictError {
    #[error("failed to read request body: {0}")]
    BodyRead(#[from] actix_web::error::PayloadError),
    #[error("request body exceeds {0} bytes")]
    BodyTooLarge(usize),
}

/// Everything the predict route can answer with, short of an internal fault.
#[derive(Debug)]
pub enum PredictOutcome {
    Canonical(ClassificationResult),
    UpstreamError { status: StatusCode, details: Value },
    RawPassthrough {
        status: StatusCode,
        content_type: Option<String>,
        body: Bytes,
    },
}

#[derive(Clone)]
pub struct PredictService {
    config: ProxyConfig,
    http_client: reqwest::Client,
}

impl PredictService {
    pub fn new(config: ProxyConfig) -> Result<Self, reqwest::Error> {
        let http_client = reqwest::Client::builder()
            .timeout(UPSTREAM_TIMEOUT)
            .redirect(reqwest::redirect::Policy::limited(MAX_REDIRECTS))
            .build()?;

        Ok(Self {
            config,
            http_client,
        })
    }

    pub fn mode(&self) -> &'static str {
        if self.config.upstream_url.is_some() {
            "proxy"
        } else {
            "mock"
        }
    }

    pub async fn handle(
        &self,
        req: &HttpRequest,
        payload: &mut web::Payload,
    ) -> Result<PredictOutcome, PredictError> {
        let Some(upstream) = self.config.upstream_url.clone() else {
            return Ok(PredictOutcome::Canonical(mock_result()));
        };

        // Buffered forwarding: uploads are small and bounded, and buffering
        // keeps the outbound content-length exact.
        let body = self.read_body(payload).await?;
        let headers = forwardable_headers(req.headers(), body.len());

        Ok(self.forward(upstream, headers, body).await)
    }

    async fn read_body(&self, payload: &mut web::Payload) -> Result<Bytes, PredictError> {
        let mut buffered = BytesMut::new();
        while let Some(chunk) = payload.next().await {
            let chunk = chunk?;
            if buffered.len() + chunk.len() > self.config.max_body_bytes {
                return Err(PredictError::BodyTooLarge(self.config.max_body_bytes));
            }
            buffered.extend_from_slice(&chunk);
        }
        Ok(buffered.freeze())
    }

    async fn forward(&self, upstream: Url, headers: HeaderMap, body: Bytes) -> PredictOutcome {
        let request_id = Uuid::new_v4();
        debug!(
            "[{}] forwarding {} bytes to {}",
            request_id,
            body.len(),
            upstream
        );

        let started = Instant::now();

        let response = match self
            .http_client
            .post(upstream)
            .headers(headers)
            .body(body)
            .send()
            .await
        {
            Ok(response) => response,
            Err(e) => {
                warn!("[{}] upstream request failed: {}", request_id, e);
                return PredictOutcome::UpstreamError {
                    status: upstream_failure_status(&e),
                    details: Value::String(e.to_string()),
                };
            }
        };

        let status = StatusCode::from_u16(response.status().as_u16())
            .unwrap_or(StatusCode::BAD_GATEWAY);
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_owned);

        let upstream_body = match response.bytes().await {
            Ok(bytes) => bytes,
            Err(e) => {
                warn!("[{}] failed to read upstream body: {}", request_id, e);
                return PredictOutcome::UpstreamError {
                    status: upstream_failure_status(&e),
                    details: Value::String(e.to_string()),
                };
            }
        };

        // Always the proxy's own clock; upstream-reported timing is ignored.
        let elapsed_ms = started.elapsed().as_millis() as u64;

        interpret_upstream(
            request_id,
            status,
            content_type,
            upstream_body,
            elapsed_ms,
        )
    }
}

/// Map a fully-received upstream response to the caller-facing outcome.
fn interpret_upstream(
    request_id: Uuid,
    status: StatusCode,
    content_type: Option<String>,
    body: Bytes,
    elapsed_ms: u64,
) -> PredictOutcome {
    let is_json = content_type
        .as_deref()
        .is_some_and(|ct| ct.contains("application/json") || ct.contains("+json"));

    if !status.is_success() {
        warn!("[{}] upstream answered {}", request_id, status);
        let details = if is_json {
            serde_json::from_slice(&body)
                .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&body).into_owned()))
        } else {
            Value::String(String::from_utf8_lossy(&body).into_owned())
        };
        return PredictOutcome::UpstreamError { status, details };
    }

    if !is_json {
        debug!(
            "[{}] non-JSON upstream success ({:?}); serving canonical default",
            request_id, content_type
        );
        return PredictOutcome::Canonical(ClassificationResult::fallback(Some(elapsed_ms)));
    }

    match serde_json::from_slice::<Value>(&body) {
        Ok(parsed) => {
            let mut result = normalize(&parsed);
            result.processing_time = Some(elapsed_ms);
            PredictOutcome::Canonical(result)
        }
        Err(e) => {
            warn!(
                "[{}] JSON parse failed despite JSON content-type, passing body through: {}",
                request_id, e
            );
            PredictOutcome::RawPassthrough {
                status,
                content_type,
                body,
            }
        }
    }
}

fn upstream_failure_status(e: &reqwest::Error) -> StatusCode {
    if e.is_timeout() {
        StatusCode::GATEWAY_TIMEOUT
    } else {
        StatusCode::BAD_GATEWAY
    }
}

/// Build the outbound header set: everything inbound minus hop-by-hop
/// headers, with a content-length matching the buffered body when the
/// caller did not send one. Content-type passes through untouched so the
/// multipart boundary survives.
fn forwardable_headers(
    inbound: &actix_web::http::header::HeaderMap,
    body_len: usize,
) -> HeaderMap {
    let mut outbound = HeaderMap::new();

    for (name, value) in inbound.iter() {
        let name_str = name.as_str();
        if HOP_BY_HOP_HEADERS
            .iter()
            .any(|hop| hop.eq_ignore_ascii_case(name_str))
        {
            continue;
        }
        // actix and reqwest track different `http` crate versions, so
        // headers are rebuilt from raw bytes.
        let (Ok(name), Ok(value)) = (
            HeaderName::from_bytes(name_str.as_bytes()),
            HeaderValue::from_bytes(value.as_bytes()),
        ) else {
            continue;
        };
        outbound.append(name, value);
    }

    if !outbound.contains_key(CONTENT_LENGTH) {
        outbound.insert(CONTENT_LENGTH, HeaderValue::from(body_len));
    }

    outbound
}
