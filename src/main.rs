use std::process::ExitCode;

use star_cache::app::StarApp;

#[tokio::main]
async fn main() -> ExitCode {
    match StarApp::run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(star_cache::error::StarError::Cli(err)) => {
            let _ = err.print();
            if err.use_stderr() {
                ExitCode::FAILURE
            }
            else {
                ExitCode::SUCCESS
            }
        }
        Err(err) => {
            eprintln!("Application errored out: {err}");
            ExitCode::FAILURE
        }
    }
}
