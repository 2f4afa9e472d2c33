//! HTTP endpoints for metrics scraping and liveness

use advertiser_core::AdvertiserMetrics;
use http_body_util::Full;
use hyper::{
    body::Bytes,
    server::conn::http1,
    service::service_fn,
    Method, Request, Response, StatusCode,
};
use hyper_util::rt::tokio::TokioIo;
use std::convert::Infallible;
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tracing::{debug, info};

/// Serve `/metrics` and `/healthz` on `addr` until the task is aborted
pub async fn serve(addr: SocketAddr, metrics: AdvertiserMetrics) -> anyhow::Result<()> {
    let listener = TcpListener::bind(&addr).await?;
    info!("Metrics server listening on {}", addr);

    loop {
        let (stream, peer_addr) = listener.accept().await?;
        let io = TokioIo::new(stream);
        let metrics = metrics.clone();

        tokio::task::spawn(async move {
            let service = service_fn(move |req| {
                let metrics = metrics.clone();
                async move { Ok::<_, Infallible>(handle_request(&req, &metrics)) }
            });

            if let Err(e) = http1::Builder::new().serve_connection(io, service).await {
                debug!("Error serving HTTP connection from {}: {}", peer_addr, e);
            }
        });
    }
}

fn handle_request<B>(req: &Request<B>, metrics: &AdvertiserMetrics) -> Response<Full<Bytes>> {
    debug!("{} {}", req.method(), req.uri().path());

    match (req.method(), req.uri().path()) {
        (&Method::GET, "/metrics") => match metrics.gather() {
            Ok(text) => respond(StatusCode::OK, Some("text/plain; version=0.0.4"), text),
            Err(e) => respond(
                StatusCode::INTERNAL_SERVER_ERROR,
                None,
                format!("Failed to gather metrics: {}\n", e),
            ),
        },
        (_, "/healthz") => respond(StatusCode::OK, None, "OK\n".to_string()),
        _ => respond(StatusCode::NOT_FOUND, None, "Not Found\n".to_string()),
    }
}

fn respond(status: StatusCode, content_type: Option<&str>, body: String) -> Response<Full<Bytes>> {
    let mut response = Response::new(Full::new(Bytes::from(body)));
    *response.status_mut() = status;
    if let Some(content_type) = content_type {
        if let Ok(value) = content_type.parse() {
            response.headers_mut().insert(hyper::header::CONTENT_TYPE, value);
        }
    }
    response
}
