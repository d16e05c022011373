use crate::domain::{Address, Resolution};
use crate::pipeline::AddressPipeline;
use axum::{
    http::Method,
    response::{IntoResponse, Json},
    routing::{get, post},
    Json as AxumJson, Router,
};
use hyper::Server;
use serde::Deserialize;
use std::net::SocketAddr;
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::cors::{Any, CorsLayer};
use tracing::error;

/// Pipeline entry point payload: a raw address, plus an optional
/// caller-supplied description that skips the enrichment stage.
#[derive(Debug, Deserialize)]
pub struct ResolveRequest {
    pub address: Address,
    #[serde(default)]
    pub description: Option<String>,
}

/// Health check endpoint
async fn health() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "healthy",
        "service": "address-resolver",
        "version": env!("CARGO_PKG_VERSION")
    }))
}

/// Create the HTTP server with all routes
pub fn create_server(pipeline: Arc<AddressPipeline>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health))
        .route(
            "/resolve",
            post({
                let pl = pipeline.clone();
                move |AxumJson(req): AxumJson<ResolveRequest>| {
                    let pl = pl.clone();
                    async move {
                        match pl.resolve(req.address, req.description).await {
                            Ok(res) => AxumJson::<Resolution>(res).into_response(),
                            Err(e) => {
                                error!("Resolution request failed: {}", e);
                                (axum::http::StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
                                    .into_response()
                            }
                        }
                    }
                }
            }),
        )
        .layer(ServiceBuilder::new().layer(cors))
}

/// Start the HTTP server on the specified port
pub async fn start_server(
    pipeline: Arc<AddressPipeline>,
    port: u16,
) -> Result<(), Box<dyn std::error::Error>> {
    let app = create_server(pipeline);

    let addr = SocketAddr::from(([0, 0, 0, 0], port));

    println!("🚀 HTTP server running on http://localhost:{port}");
    println!("💚 Health check: http://localhost:{port}/health");
    println!("📍 Resolve:      POST http://localhost:{port}/resolve");

    Server::bind(&addr).serve(app.into_make_service()).await?;

    Ok(())
}
