//! Main application entry point.

use clap::Parser;
use inkboard_app::{AppArgs, ShortcutRegistry, run_with_files};
use std::process::ExitCode;

fn main() -> ExitCode {
    env_logger::init();

    let args = AppArgs::parse();
    if args.shortcuts {
        ShortcutRegistry::print_all();
        if args.document.is_none() {
            return ExitCode::SUCCESS;
        }
    }

    match run_with_files(&args) {
        Ok(_) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("{}", e);
            ExitCode::FAILURE
        }
    }
}
