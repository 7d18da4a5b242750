//! Stop requests
//!
//! SIGTERM and SIGINT both set the same flag. The cycle driver only looks at
//! it between cycles, so a termination sequence that has started is never cut
//! short.

use tokio::signal::unix::{signal, SignalKind};
use tokio::sync::watch;

/// Sender side, owned by whatever observes the stop request
#[derive(Debug)]
pub struct ShutdownHandle {
    tx: watch::Sender<bool>,
}

impl ShutdownHandle {
    pub fn request(&self) {
        let _ = self.tx.send(true);
    }
}

/// Receiver side, checked by the cycle driver
#[derive(Debug, Clone)]
pub struct Shutdown {
    rx: watch::Receiver<bool>,
}

impl Shutdown {
    pub fn is_requested(&self) -> bool {
        *self.rx.borrow()
    }

    /// Resolves once a stop has been requested. Never resolves if the handle
    /// is dropped without requesting one.
    pub async fn requested(&mut self) {
        while !*self.rx.borrow_and_update() {
            if self.rx.changed().await.is_err() {
                std::future::pending::<()>().await;
            }
        }
    }
}

pub fn channel() -> (ShutdownHandle, Shutdown) {
    let (tx, rx) = watch::channel(false);
    (ShutdownHandle { tx }, Shutdown { rx })
}

/// Install SIGTERM/SIGINT handlers that trigger `handle`.
///
/// Must be called from within the tokio runtime.
pub fn listen_for_signals(handle: ShutdownHandle) -> std::io::Result<()> {
    let mut term = signal(SignalKind::terminate())?;
    let mut int = signal(SignalKind::interrupt())?;

    tokio::spawn(async move {
        let name = tokio::select! {
            _ = term.recv() => "SIGTERM",
            _ = int.recv() => "SIGINT",
        };
        tracing::info!("Received {}, shutting down after the current cycle...", name);
        handle.request();
    });

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_request_resolves_waiters() {
        let (handle, mut shutdown) = channel();
        assert!(!shutdown.is_requested());

        let observer = shutdown.clone();
        tokio::spawn(async move { handle.request() });

        tokio::time::timeout(Duration::from_secs(1), shutdown.requested())
            .await
            .expect("shutdown should resolve");
        assert!(observer.is_requested());
    }

    #[tokio::test(start_paused = true)]
    async fn test_dropped_handle_never_resolves() {
        let (handle, mut shutdown) = channel();
        drop(handle);

        let result = tokio::time::timeout(Duration::from_secs(60), shutdown.requested()).await;
        assert!(result.is_err());
        assert!(!shutdown.is_requested());
    }
}
