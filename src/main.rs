//! iojson echo server - demo entry point.
//!
//! Routes:
//! - `POST /echo`: decode the request envelope and send it back
//! - `GET /cars`: respond with a few staged objects
//! - `GET /fail`: respond with an error envelope

use axum::extract::State;
use axum::response::Response;
use axum::routing::{get, post};
use axum::Router;
use clap::Parser;
use futures::FutureExt;
use serde::Serialize;

use iojson::http::{echo, error_handler, Inbound};
use iojson::{Config, Envelope, EnvelopeConfig};

#[derive(Debug, Parser)]
#[command(name = "iojson-echo", about = "Serve iojson envelopes over HTTP")]
struct Args {
    /// HTTP bind address.
    #[arg(long, env = "IOJSON_LISTEN_ADDR")]
    listen: Option<String>,

    /// Maximum inbound envelope size in bytes.
    #[arg(long, env = "IOJSON_MAX_DECODE_BYTES")]
    max_decode_bytes: Option<u64>,

    /// Append caller locations to recorded errors.
    #[arg(long)]
    debug_caller: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
struct Car {
    name: String,
}

async fn echo_inbound(Inbound(envelope): Inbound) -> Envelope {
    envelope
}

async fn cars(State(config): State<EnvelopeConfig>) -> Response {
    echo(config, |envelope| {
        async move {
            for name in ["Car", "Bag"] {
                envelope.add_obj(&Car { name: name.to_string() })?;
            }
            envelope.add_data("Count", &2)?;
            Ok::<_, iojson::Error>(())
        }
        .boxed()
    })
    .await
}

async fn fail(State(config): State<EnvelopeConfig>) -> Response {
    echo(config, error_handler("")).await
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    // Load configuration
    let mut config = Config::from_env()?;
    if let Some(listen) = args.listen {
        config.server.listen_addr = listen;
    }
    if let Some(limit) = args.max_decode_bytes {
        config.envelope.max_decode_bytes = limit;
    }
    config.envelope.debug_caller |= args.debug_caller;

    // Initialize observability
    iojson::observability::init_tracing(&config.observability);

    let app = Router::new()
        .route("/echo", post(echo_inbound))
        .route("/cars", get(cars))
        .route("/fail", get(fail))
        .with_state(config.envelope.clone());

    let listener = tokio::net::TcpListener::bind(&config.server.listen_addr).await?;
    tracing::info!(
        addr = %config.server.listen_addr,
        max_decode_bytes = config.envelope.max_decode_bytes,
        "iojson echo server listening"
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            tracing::info!("iojson echo server shutting down");
        })
        .await?;

    Ok(())
}
