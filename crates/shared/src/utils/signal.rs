use tokio::{
    io,
    signal::unix::{signal, SignalKind},
    task::JoinHandle,
};
use tokio_util::sync::CancellationToken;

// Cancels `cancellation_token` on the first SIGINT or SIGTERM.
//
// Returns a handle to the listening task.
pub fn cancel_on_signal(cancellation_token: CancellationToken) -> io::Result<JoinHandle<()>> {
    let mut sigterm = signal(SignalKind::terminate())?;
    let mut sigint = signal(SignalKind::interrupt())?;

    let signal_handle = tokio::spawn(async move {
        tokio::select! {
            _ = sigterm.recv() => {
                log::info!("Received termination signal");
            }
            _ = sigint.recv() => {
                log::info!("Received interrupt signal");
            }
            _ = cancellation_token.cancelled() => return,
        }
        cancellation_token.cancel();
    });

    Ok(signal_handle)
}
