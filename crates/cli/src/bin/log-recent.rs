use clap::Parser;
use recent_cli::log_cmd::{self, LogArgs};

fn main() {
    recent_cli::logging::init();

    let args = LogArgs::parse();
    if let Err(e) = log_cmd::run(args) {
        eprintln!("recent: {:#}", e);
        std::process::exit(1);
    }
}
