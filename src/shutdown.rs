use tokio::signal::unix::{SignalKind, signal};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// Turns SIGTERM or SIGINT into a cancelled [`CancellationToken`].
///
/// The server waits on [`Shutdown::signalled`] to stop accepting connections and drain
/// in-flight requests.
pub struct Shutdown {
    listener: JoinHandle<()>,
    token: CancellationToken,
}

impl Shutdown {
    /// Registers the signal handlers. Fails if the runtime can not install them.
    pub fn try_new() -> Result<Self, std::io::Error> {
        let mut sigterm = signal(SignalKind::terminate())?;
        let mut sigint = signal(SignalKind::interrupt())?;
        let token = CancellationToken::new();
        let trigger = token.clone();
        let listener = tokio::spawn(async move {
            let name = tokio::select! {
                _ = sigterm.recv() => "SIGTERM",
                _ = sigint.recv() => "SIGINT",
                _ = trigger.cancelled() => return,
            };
            tracing::info!(signal = name, "Shutdown requested");
            trigger.cancel();
        });
        Ok(Self { listener, token })
    }

    /// Resolves once a shutdown signal arrived.
    pub fn signalled(&self) -> impl Future<Output = ()> + Send + 'static {
        let token = self.token.clone();
        async move { token.cancelled().await }
    }
}

impl Drop for Shutdown {
    fn drop(&mut self) {
        self.listener.abort();
    }
}
