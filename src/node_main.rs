use std::sync::Arc;

use ripd::net::UdpTransport;
use ripd::node::NodeBuilder;
use ripd::{seed, Args};
use tokio_util::sync::CancellationToken;

#[tokio::main]
async fn main() {
    env_logger::init();

    let args = match Args::try_from(std::env::args()) {
        Ok(a) => a,
        Err(e) => {
            eprintln!("Error: {e}");
            eprintln!("{}", Args::USAGE);
            std::process::exit(1);
        }
    };
    log::info!("{args}");

    let seed = seed::routes_for(&args.name).unwrap_or_else(|e| {
        log::warn!("{e}; starting with an empty table");
        Vec::new()
    });

    let config = args.config();
    let transport = match UdpTransport::bind(args.local_addr, config.group, config.port).await {
        Ok(t) => t,
        Err(e) => {
            eprintln!("Error: {e}");
            std::process::exit(1);
        }
    };

    let node = Arc::new(
        NodeBuilder::new(args.identity())
            .with_config(config)
            .with_seed_routes(seed)
            .build(transport),
    );

    let shutdown = CancellationToken::new();
    let ctrl_c = shutdown.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            log::info!("Shutting down");
            ctrl_c.cancel();
        }
    });

    node.run(shutdown).await;
}
