//! Cooperative shutdown signalling.
//!
//! A [`ShutdownTrigger`] is held by whoever decides the process should stop
//! (the signal listener, or a test). Every [`Shutdown`] handle observes it:
//! loops poll [`Shutdown::is_requested`] before each unit of work, and
//! blocking reads and sleeps race against [`Shutdown::requested`].

use tokio::sync::watch;

/// Creates a connected trigger/handle pair.
pub fn channel() -> (ShutdownTrigger, Shutdown) {
    let (tx, rx) = watch::channel(false);
    (ShutdownTrigger { tx }, Shutdown { rx })
}

/// Fires the shutdown request.
#[derive(Debug)]
pub struct ShutdownTrigger {
    tx: watch::Sender<bool>,
}

impl ShutdownTrigger {
    /// Requests shutdown. Idempotent.
    pub fn fire(&self) {
        self.tx.send_replace(true);
    }

    /// Returns a new handle observing this trigger.
    pub fn subscribe(&self) -> Shutdown {
        Shutdown {
            rx: self.tx.subscribe(),
        }
    }
}

/// Observes a shutdown request. Cheap to clone.
#[derive(Debug, Clone)]
pub struct Shutdown {
    rx: watch::Receiver<bool>,
}

impl Shutdown {
    /// A handle that never fires.
    pub fn never() -> Self {
        let (trigger, shutdown) = channel();
        // Dropping the sender leaves the value at false forever
        drop(trigger);
        shutdown
    }

    /// Non-blocking check.
    pub fn is_requested(&self) -> bool {
        *self.rx.borrow()
    }

    /// Completes once shutdown has been requested. Pends forever if the
    /// trigger is dropped without firing.
    pub async fn requested(&self) {
        let mut rx = self.rx.clone();
        let closed = rx.wait_for(|requested| *requested).await.is_err();
        if closed {
            std::future::pending::<()>().await;
        }
    }
}

/// Fires `trigger` on SIGINT or SIGTERM.
pub async fn listen_for_signals(trigger: ShutdownTrigger) {
    let ctrl_c = tokio::signal::ctrl_c();

    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                tokio::select! {
                    _ = ctrl_c => tracing::info!("action: receive_signal | signal: SIGINT | result: in_progress"),
                    _ = sigterm.recv() => tracing::info!("action: receive_signal | signal: SIGTERM | result: in_progress"),
                }
            }
            Err(e) => {
                tracing::warn!("Failed to install SIGTERM handler: {}", e);
                ctrl_c.await.ok();
                tracing::info!("action: receive_signal | signal: SIGINT | result: in_progress");
            }
        }
    }

    #[cfg(not(unix))]
    {
        ctrl_c.await.ok();
        tracing::info!("action: receive_signal | signal: SIGINT | result: in_progress");
    }

    trigger.fire();
}
