mod app;
mod cli;
mod config;
mod core;
mod executors;
mod organizers;
mod plugins;
mod reporters;
mod ui;
mod utils;

use clap::Parser;
use crate::core::errors::exit_code_for;
use crate::executors::tracker::ProcessTracker;
use crate::utils::signals::Shutdown;

#[tokio::main]
async fn main() {
    human_panic::setup_panic!();

    let cli = cli::args::Cli::parse();
    if let Err(err) = utils::logging::init(utils::logging::level_from_cli(&cli)) {
        eprintln!("warning: {:#}", err);
    }

    let tracker = ProcessTracker::new();
    let mut shutdown = match Shutdown::listen() {
        Ok(shutdown) => shutdown,
        Err(e) => {
            eprintln!("fatal: cannot install signal handlers: {}", e);
            std::process::exit(1);
        }
    };

    let result = app::supervise(app::run(cli, tracker.clone()), shutdown.recv(), &tracker).await;
    if let Err(err) = result {
        eprintln!("fatal: {:#}", err);
        std::process::exit(exit_code_for(&err));
    }
}
