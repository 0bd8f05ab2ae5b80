use std::{net::SocketAddr, time::Instant};

use axum::{
    extract::Request,
    http::HeaderValue,
    middleware::{self, Next},
    response::Response,
    routing::get,
    Router,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::{auth, dashboard, foods, health, meal_plans, meals, state::AppState, users};

pub fn build_app(state: AppState) -> Router {
    Router::new()
        .route("/", get(health::root))
        .route("/health", get(health::health_check))
        .merge(auth::router())
        .merge(users::router())
        .merge(foods::router())
        .merge(meals::router())
        .merge(meal_plans::router())
        .merge(dashboard::router())
        .with_state(state)
        .layer(middleware::from_fn(process_time))
        .layer(CorsLayer::permissive())
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(request_span)
                .on_response(
                    |res: &axum::http::Response<_>,
                     _latency: std::time::Duration,
                     span: &tracing::Span| {
                        let status = res.status();
                        span.record("status", tracing::field::display(status));
                        if status.is_server_error() {
                            tracing::error!(%status, "response");
                        } else {
                            tracing::info!(%status, "response");
                        }
                    },
                ),
        )
}

fn request_span<B>(req: &axum::http::Request<B>) -> tracing::Span {
    tracing::info_span!(
        "http_request",
        method = %req.method(),
        uri = %req.uri(),
        status = tracing::field::Empty
    )
}

/// Adds `X-Process-Time` (seconds) to every response.
async fn process_time(req: Request, next: Next) -> Response {
    let started = Instant::now();
    let mut res = next.run(req).await;
    let elapsed = started.elapsed().as_secs_f64();
    if let Ok(v) = HeaderValue::from_str(&format!("{elapsed:.6}")) {
        res.headers_mut().insert("x-process-time", v);
    }
    res
}

pub async fn serve(app: Router, host: &str, port: u16) -> anyhow::Result<()> {
    let addr: SocketAddr = format!("{host}:{port}").parse()?;

    tracing::info!("listening on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;

    #[test]
    fn request_span_declares_status() {
        let req = axum::http::Request::get("/foods").body(Body::empty()).unwrap();
        let span = request_span(&req);
        assert!(span.field("status").is_some());
        assert!(span.field("method").is_some());
    }
}
