use clap::Parser;
use shared::utils::signal::cancel_on_signal;
use std::panic;
use std::process::ExitCode;
use tokio_util::sync::CancellationToken;

use octomize::{setup_logging, Cli};

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    if let Err(e) = setup_logging(Some(&cli)) {
        eprintln!("Warning: Failed to initialize logging: {e}. Using default logging.");
    }

    panic::set_hook(Box::new(|panic_info| {
        let location = panic_info
            .location()
            .unwrap_or_else(|| panic::Location::caller());
        let message = match panic_info.payload().downcast_ref::<&str>() {
            Some(s) => *s,
            None => match panic_info.payload().downcast_ref::<String>() {
                Some(s) => s.as_str(),
                None => "Unknown panic payload",
            },
        };

        log::error!(
            "PANIC: '{}' at {}:{}",
            message,
            location.file(),
            location.line()
        );
    }));

    let cancellation_token = CancellationToken::new();
    let signal_handle = match cancel_on_signal(cancellation_token.clone()) {
        Ok(handle) => Some(handle),
        Err(e) => {
            log::warn!("Failed to install signal handlers: {e}");
            None
        }
    };

    let result = cli.run(cancellation_token.clone()).await;

    cancellation_token.cancel();
    if let Some(handle) = signal_handle {
        handle.abort();
    }

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("{e:#}");
            ExitCode::FAILURE
        }
    }
}
