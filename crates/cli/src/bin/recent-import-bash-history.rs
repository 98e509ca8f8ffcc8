use clap::Parser;
use recent_cli::import_cmd::{self, ImportArgs};

fn main() {
    recent_cli::logging::init();

    let args = ImportArgs::parse();
    if let Err(e) = import_cmd::run(args) {
        eprintln!("recent-import-bash-history failed: {:#}", e);
        std::process::exit(1);
    }
}
