// Entrypoint for the provisioning CLI.
// - Keeps `main` small: read settings and hand off to the UI flow.
// - Any failure is printed to stdout and ends the process with 255.

use pa_provision::{config::Settings, ui};
use std::io::Write;
use tracing_subscriber::EnvFilter;

const FAILURE_EXIT_CODE: i32 = 255;

fn main() {
    // Diagnostics only; status text is printed directly.
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let result = Settings::from_env().and_then(|settings| ui::run(&settings));
    let code = report(result, &mut std::io::stdout());
    std::process::exit(code);
}

/// Print the error chain of a failed run and pick the exit code.
fn report<T>(result: anyhow::Result<T>, out: &mut impl Write) -> i32 {
    match result {
        Ok(_) => 0,
        Err(e) => {
            let _ = writeln!(out, "{:#}", e);
            let _ = out.flush();
            FAILURE_EXIT_CODE
        }
    }
}
