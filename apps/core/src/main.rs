use std::process::ExitCode;

use questfind_core::runtime::{parse_cli_args, run_with_options};

fn main() -> ExitCode {
    let args: Vec<String> = std::env::args().skip(1).collect();
    let options = match parse_cli_args(&args) {
        Ok(options) => options,
        Err(usage) => {
            eprintln!("[questfind-core] {usage}");
            return ExitCode::from(2);
        }
    };

    match run_with_options(options) {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            eprintln!("[questfind-core] {error}");
            ExitCode::FAILURE
        }
    }
}
