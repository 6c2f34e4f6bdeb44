use std::process::ExitCode;

/// Exit status after an interrupt (128 + SIGINT).
const INTERRUPTED_EXIT: u8 = 130;

#[tokio::main]
async fn main() -> ExitCode {
    let result = tokio::select! {
        result = rootcause::cli::run() => result,
        _ = shutdown_signal() => {
            eprintln!("\nInterrupted, exiting.");
            return ExitCode::from(INTERRUPTED_EXIT);
        }
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::from(rootcause::errors::get_exit_code(&e))
        }
    }
}

async fn shutdown_signal() {
    let ctrl_c = tokio::signal::ctrl_c();

    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                tokio::select! {
                    _ = ctrl_c => {},
                    _ = sigterm.recv() => {},
                }
            }
            Err(_) => {
                ctrl_c.await.ok();
            }
        }
    }

    #[cfg(not(unix))]
    {
        ctrl_c.await.ok();
    }
}
