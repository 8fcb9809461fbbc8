//! TCP print server.
//!
//! Binds the wildcard address on a port (default 8752), accepts clients
//! forever and prints whatever text each one sends.
//!
//! ```text
//! port arg → resolve → socket → SO_REUSEADDR → bind → listen(1)
//!          → accept loop ──spawn──▶ handler (read 1024 → print) × N
//! ```

use std::sync::Arc;

use clap::Parser;

use tcp_print_server::config::{parse_port, schema::DEFAULT_PORT, ServerConfig};
use tcp_print_server::observability::{logging, Console, StdConsole};
use tcp_print_server::Server;

/// Accept TCP clients and print the text they send.
#[derive(Parser, Debug)]
#[command(version)]
struct Args {
    /// TCP port to listen on.
    #[arg(value_parser = parse_port, default_value_t = DEFAULT_PORT)]
    port: u16,
}

#[tokio::main]
async fn main() {
    let args = Args::parse();
    logging::init_tracing();

    tracing::info!(port = args.port, "tcp-print-server v0.1.0 starting");

    let console: Arc<dyn Console> = Arc::new(StdConsole);
    let config = ServerConfig::with_port(args.port);

    let server = match Server::bind(&config, Arc::clone(&console)).await {
        Ok(server) => server,
        Err(e) => {
            console.diagnostic(&e.to_string());
            tracing::debug!(error = ?e, port = config.port, "Startup failed");
            std::process::exit(1);
        }
    };

    server.run().await;
}
