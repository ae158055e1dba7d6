use std::sync::Arc;

use async_trait::async_trait;
use httplet::config::Config;
use httplet::{Handler, Request, Response, Router, Server, ServerError, StatusCode};

/// Sends the request body straight back.
struct Echo;

#[async_trait]
impl Handler for Echo {
    async fn serve(&self, response: &mut Response, request: &mut Request<'_>) {
        match request.body.bytes().await {
            Ok(body) => {
                if let Some(ct) = request.header("Content-Type") {
                    response.set_header("Content-Type", ct);
                }
                response.write(&body);
            }
            Err(e) => {
                tracing::warn!("reading body failed: {}", e);
                response.set_status(StatusCode::BAD_REQUEST);
            }
        }
    }
}

fn routes() -> anyhow::Result<Router> {
    let mut router = Router::new();
    router
        .route_fn("/", |resp, req| {
            Box::pin(async move {
                resp.set_header("Content-Type", "text/plain");
                resp.write(format!("Hello from httplet, you asked for {}\n", req.path).as_bytes());
            })
        })?
        .route_fn("/health", |resp, _req| {
            Box::pin(async move {
                resp.write(b"ok\n");
            })
        })?
        .route("/echo", Echo)?;
    Ok(router)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cfg = Config::load()?;

    tracing_subscriber::fmt()
        .with_target(false)
        .with_level(true)
        .with_max_level(cfg.log_level())
        .init();

    let server = Arc::new(Server::from_config(&cfg, routes()?)?);

    let serving = {
        let server = Arc::clone(&server);
        tokio::spawn(async move { server.listen_and_serve().await })
    };

    let shutdown = server.shutdown_handle();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("Shutdown signal received");
            shutdown.shutdown();
        }
    });

    match serving.await? {
        Ok(()) | Err(ServerError::Closed) => Ok(()),
        Err(e) => Err(e.into()),
    }
}
