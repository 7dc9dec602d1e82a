use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;

mod cli;
mod config;
mod handler;
mod http;
mod logger;
mod server;
#[cfg(test)]
mod test_support;

fn main() -> ExitCode {
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("[ERROR] {e}");
            ExitCode::FAILURE
        }
    }
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = cli::Cli::parse();
    let mut cfg = config::Config::load()?;
    cli.apply(&mut cfg);

    logger::init(&cfg)?;

    // Build the Tokio runtime, sized by the workers setting if present
    let mut runtime_builder = tokio::runtime::Builder::new_multi_thread();
    runtime_builder.enable_all();

    if let Some(workers) = cfg.server.workers {
        runtime_builder.worker_threads(workers);
        logger::log_info(&format!("Using {workers} worker threads"));
    }

    let state = Arc::new(
        config::AppState::new(cfg)
            .map_err(|e| format!("Cannot serve directory: {e}"))?,
    );

    let runtime = runtime_builder.build()?;
    runtime.block_on(async_main(state))
}

async fn async_main(state: Arc<config::AppState>) -> Result<(), Box<dyn std::error::Error>> {
    let addr = state.config.socket_addr()?;
    let listener =
        server::create_listener(addr).map_err(|e| format!("Failed to bind {addr}: {e}"))?;

    logger::log_server_start(&listener.local_addr()?, &state);

    server::run_accept_loop(listener, state).await;
    Ok(())
}
