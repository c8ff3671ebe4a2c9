//! switch-presence - keeps a simulated Bitcoin Switch connected

use std::sync::Arc;

use clap::Parser;
use tracing::{error, info};

use switch_presence::{
    config::Args, logging, ClientEvent, ConnectionSupervisor, EnvSource, IdentifierResolver,
    Reporter, TracingReporter, WsConnector,
};

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file if present
    let _ = dotenvy::dotenv();

    let args = Args::parse();
    logging::init(&args.log_level, args.log_format);

    if let Err(e) = args.validate() {
        error!("Configuration error: {}", e);
        std::process::exit(1);
    }

    info!("======================================");
    info!("  Bitcoin Switch WebSocket Client");
    info!("======================================");
    info!("Endpoint: {}/<{}>", args.url.trim_end_matches('/'), args.id_var);
    if let Some(env_file) = &args.env_file {
        info!("Env file: {}", env_file.display());
    }
    info!(
        "Retry: {} attempts, {}s apart{}",
        args.max_attempts,
        args.retry_delay_secs,
        if args.reset_attempts_on_connect {
            ", reset on connect"
        } else {
            ""
        }
    );
    info!("======================================");

    let reporter = Arc::new(TracingReporter);

    let resolver = IdentifierResolver::new(
        args.resolver_config(),
        EnvSource::new(args.env_file.clone()),
    );
    let identifier = match resolver.resolve(reporter.as_ref()).await {
        Ok(identifier) => identifier,
        Err(e) => {
            error!("{}", e);
            std::process::exit(1);
        }
    };
    reporter.report(&ClientEvent::Started {
        identifier: identifier.clone(),
    });

    let mut supervisor = ConnectionSupervisor::new(args.supervisor_config(), WsConnector, reporter);
    match supervisor.run(&identifier).await {
        Ok(never) => match never {},
        Err(e) => {
            error!(error = %e, "Supervisor stopped");
            std::process::exit(1);
        }
    }
}
