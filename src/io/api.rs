//! HTTP API over the tour guide service
//!
//! GET-only JSON endpoints keyed by `?userName=`, plus `/metrics` in
//! Prometheus text format. Uses hyper for the HTTP server.

use crate::domain::TourGuideError;
use crate::io::prometheus::{self, format_prometheus_metrics};
use crate::services::tour_guide::TourGuideService;
use bytes::Bytes;
use http_body_util::Full;
use hyper::header::{HeaderValue, CONTENT_TYPE};
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::{Method, Request, Response, StatusCode};
use hyper_util::rt::TokioIo;
use serde::Serialize;
use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::watch;
use tracing::{debug, error, info, warn};
use url::form_urlencoded;

const JSON: &str = "application/json";

#[derive(Serialize)]
struct ErrorBody<'a> {
    error: &'a str,
    message: String,
}

fn respond(status: StatusCode, content_type: &'static str, body: impl Into<Bytes>) -> Response<Full<Bytes>> {
    let mut response = Response::new(Full::new(body.into()));
    *response.status_mut() = status;
    response.headers_mut().insert(CONTENT_TYPE, HeaderValue::from_static(content_type));
    response
}

fn json<T: Serialize>(value: &T) -> Response<Full<Bytes>> {
    match serde_json::to_vec(value) {
        Ok(body) => respond(StatusCode::OK, JSON, body),
        Err(e) => {
            error!(error = %e, "api_serialize_failed");
            error_response(StatusCode::INTERNAL_SERVER_ERROR, "internal", e.to_string())
        }
    }
}

fn error_response(status: StatusCode, error: &str, message: String) -> Response<Full<Bytes>> {
    let body = serde_json::to_vec(&ErrorBody { error, message }).unwrap_or_default();
    respond(status, JSON, body)
}

fn fault_response(err: &TourGuideError) -> Response<Full<Bytes>> {
    match err {
        TourGuideError::UserNotFound(_) => {
            error_response(StatusCode::NOT_FOUND, "user_not_found", err.to_string())
        }
        TourGuideError::UpstreamUnavailable { .. } | TourGuideError::UpstreamTimeout { .. } => {
            error_response(StatusCode::SERVICE_UNAVAILABLE, "upstream_unavailable", err.to_string())
        }
    }
}

/// Extract the decoded `userName` from a raw query string
fn user_name_param(query: Option<&str>) -> Option<String> {
    form_urlencoded::parse(query?.as_bytes())
        .find(|(key, _)| key == "userName")
        .map(|(_, value)| value.into_owned())
        .filter(|value| !value.is_empty())
}

/// Route one request to the service
pub async fn dispatch(
    service: &TourGuideService,
    method: &Method,
    path: &str,
    query: Option<&str>,
) -> Response<Full<Bytes>> {
    if *method != Method::GET {
        return error_response(StatusCode::METHOD_NOT_ALLOWED, "method_not_allowed", method.to_string());
    }

    match path {
        "/" => return respond(StatusCode::OK, "text/plain; charset=utf-8", "Greetings from TourGuide!"),
        "/metrics" => {
            let body = format_prometheus_metrics(service.metrics(), service.user_count());
            return respond(StatusCode::OK, prometheus::CONTENT_TYPE, body);
        }
        "/getLocation" | "/getNearbyAttractions" | "/getRewards" | "/getTripDeals" => {}
        _ => return error_response(StatusCode::NOT_FOUND, "not_found", path.to_string()),
    }

    let Some(user_name) = user_name_param(query) else {
        return error_response(StatusCode::BAD_REQUEST, "missing_parameter", "userName".to_string());
    };
    let user = match service.require_user(&user_name) {
        Ok(user) => user,
        Err(e) => return fault_response(&e),
    };

    let result = match path {
        "/getLocation" => service.get_user_location(&user).await.map(|v| json(&v.location)),
        "/getNearbyAttractions" => service.get_nearby_attraction_details(&user).await.map(|n| json(&n)),
        "/getRewards" => Ok(json(&service.get_user_rewards(&user))),
        _ => service.get_trip_deals(&user).await.map(|p| json(&p)),
    };

    result.unwrap_or_else(|e| {
        warn!(path = %path, user = %user_name, error = %e, "api_request_failed");
        fault_response(&e)
    })
}

async fn handle_request(
    req: Request<hyper::body::Incoming>,
    service: Arc<TourGuideService>,
) -> Result<Response<Full<Bytes>>, Infallible> {
    debug!(method = %req.method(), uri = %req.uri(), "api_request");
    Ok(dispatch(&service, req.method(), req.uri().path(), req.uri().query()).await)
}

/// Start the HTTP API server
pub async fn start_api_server(
    addr: SocketAddr,
    service: Arc<TourGuideService>,
    mut shutdown: watch::Receiver<bool>,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let listener = TcpListener::bind(addr).await?;

    info!(addr = %addr, "api_server_started");

    loop {
        tokio::select! {
            result = listener.accept() => {
                match result {
                    Ok((stream, _addr)) => {
                        let io = TokioIo::new(stream);
                        let service = service.clone();

                        tokio::spawn(async move {
                            let handler = service_fn(move |req| {
                                let service = service.clone();
                                async move { handle_request(req, service).await }
                            });

                            if let Err(e) = http1::Builder::new()
                                .serve_connection(io, handler)
                                .await
                            {
                                error!(error = %e, "api_http_error");
                            }
                        });
                    }
                    Err(e) => {
                        error!(error = %e, "api_accept_error");
                    }
                }
            }
            _ = shutdown.changed() => {
                if *shutdown.borrow() {
                    info!("api_server_shutdown");
                    return Ok(());
                }
            }
        }
    }
}
