//! Access logging for the dashboard API.
//!
//! Writes one line per request under the `api` target once the response is
//! known. Requests under `/imports/{kind}` also carry the kind and, for
//! deletions, the file name, so a rejected upload can be traced from the
//! access log alone. Health checks are logged at debug.

use std::future::{Ready, ready};
use std::time::Instant;

use actix_web::Error;
use actix_web::dev::{Service, ServiceRequest, ServiceResponse, Transform, forward_ready};
use actix_web::http::{StatusCode, header};
use futures_util::future::LocalBoxFuture;
use tracing::{debug, error, info, warn};

const IMPORTS_PREFIX: &str = "/imports/";
const HEALTH_SUFFIXES: &[&str] = &["/health", "/ready"];

/// Import kind and file name addressed by a request path.
#[derive(Debug, Default, PartialEq, Eq)]
struct ImportTarget {
    kind: String,
    file_name: Option<String>,
}

/// Read the import target from a path like `/api/v1/imports/school/a.csv`.
fn import_target(path: &str) -> Option<ImportTarget> {
    let (_, rest) = path.split_once(IMPORTS_PREFIX)?;
    let (kind, file_name) = match rest.split_once('/') {
        Some((kind, file_name)) if !file_name.is_empty() => (kind, Some(file_name.to_string())),
        Some((kind, _)) => (kind, None),
        None => (rest, None),
    };
    if kind.is_empty() || kind == "process" {
        return None;
    }
    Some(ImportTarget {
        kind: kind.to_string(),
        file_name,
    })
}

fn is_health_check(path: &str) -> bool {
    HEALTH_SUFFIXES.iter().any(|suffix| path.ends_with(suffix))
}

/// Request fields captured before the request body is consumed.
struct AccessRecord {
    method: String,
    path: String,
    remote_addr: String,
    content_length: u64,
    target: Option<ImportTarget>,
}

impl AccessRecord {
    fn from_request(req: &ServiceRequest) -> Self {
        let path = req.path().to_string();
        Self {
            method: req.method().to_string(),
            target: import_target(&path),
            remote_addr: req
                .connection_info()
                .realip_remote_addr()
                .unwrap_or("unknown")
                .to_string(),
            content_length: req
                .headers()
                .get(header::CONTENT_LENGTH)
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.parse().ok())
                .unwrap_or(0),
            path,
        }
    }

    fn finish(&self, status: StatusCode, started: Instant) {
        let status = status.as_u16();
        let duration_ms = started.elapsed().as_millis() as u64;

        if is_health_check(&self.path) && status < 400 {
            debug!(target: "api", path = %self.path, status, duration_ms, "Health check");
            return;
        }

        let (method, path, remote_addr) = (&self.method, &self.path, &self.remote_addr);
        let bytes_in = self.content_length;
        let kind = self.target.as_ref().map_or("-", |t| t.kind.as_str());
        let file_name = self
            .target
            .as_ref()
            .and_then(|t| t.file_name.as_deref())
            .unwrap_or("-");

        macro_rules! access_log {
            ($level:ident, $label:literal) => {
                $level!(
                    target: "api",
                    method = %method,
                    path = %path,
                    status,
                    duration_ms,
                    bytes_in,
                    remote_addr = %remote_addr,
                    import_kind = %kind,
                    file_name = %file_name,
                    $label
                )
            };
        }

        match status {
            500.. => access_log!(error, "Request failed"),
            400..=499 => access_log!(warn, "Request rejected"),
            _ => access_log!(info, "Request served"),
        }
    }
}

/// Request logger middleware factory.
pub struct RequestLogger;

impl<S, B> Transform<S, ServiceRequest> for RequestLogger
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type InitError = ();
    type Transform = RequestLoggerMiddleware<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(RequestLoggerMiddleware { service }))
    }
}

pub struct RequestLoggerMiddleware<S> {
    service: S,
}

impl<S, B> Service<ServiceRequest> for RequestLoggerMiddleware<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let started = Instant::now();
        let record = AccessRecord::from_request(&req);
        let fut = self.service.call(req);

        Box::pin(async move {
            match fut.await {
                Ok(res) => {
                    record.finish(res.status(), started);
                    Ok(res)
                }
                Err(e) => {
                    record.finish(e.as_response_error().status_code(), started);
                    Err(e)
                }
            }
        })
    }
}
