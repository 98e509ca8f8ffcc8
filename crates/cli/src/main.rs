use clap::Parser;
use recent_cli::query_cmd::{self, QueryArgs};

fn main() {
    recent_cli::logging::init();

    let args = QueryArgs::parse();
    if let Err(e) = query_cmd::run(args) {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}
