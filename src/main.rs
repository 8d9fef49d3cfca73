use std::net::SocketAddr;

use clap::Parser;
use monolith_gateway::cli::{Args, build_config, init_logging, validate_backend_url};
use monolith_gateway::create_app;
use tracing::{error, info};

#[tokio::main]
async fn main() {
    let args = Args::parse();

    init_logging(&args.log_format);

    let backend_url = match validate_backend_url(args.backend_url.as_deref()) {
        Ok(url) => url,
        Err(e) => {
            error!(error = %e, "Invalid configuration");
            std::process::exit(1);
        }
    };

    let addr = format!("0.0.0.0:{}", args.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .unwrap_or_else(|e| {
            error!(address = %addr, error = %e, "Failed to bind");
            std::process::exit(1);
        });

    let local_addr = listener.local_addr().unwrap_or_else(|e| {
        error!(error = %e, "Failed to read local address");
        std::process::exit(1);
    });

    let config = build_config(
        backend_url,
        args.environment,
        args.client_ip_header,
        args.login_rate_limit,
    );
    let app = create_app(&config).unwrap_or_else(|e| {
        error!(error = %e, "Failed to build HTTP client");
        std::process::exit(1);
    });

    info!(
        address = %local_addr,
        environment = ?config.environment,
        backend = config.backend_url.as_ref().map(|u| u.as_str()).unwrap_or("<unset>"),
        "Listening"
    );

    let make_service = app.into_make_service_with_connect_info::<SocketAddr>();
    if let Err(e) = axum::serve(listener, make_service).await {
        error!(error = %e, "Server error");
        std::process::exit(1);
    }
}
