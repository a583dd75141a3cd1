//! Operator interrupt handling.
//!
//! A `Shutdown` is cloned into every loop that may wait. Loops check it at
//! page and year boundaries, and sleeps end early once it fires.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;

/// Shared interrupt flag.
#[derive(Debug, Clone)]
pub struct Shutdown {
    tx: Arc<watch::Sender<bool>>,
    rx: watch::Receiver<bool>,
}

impl Shutdown {
    pub fn new() -> Self {
        let (tx, rx) = watch::channel(false);
        Self {
            tx: Arc::new(tx),
            rx,
        }
    }

    /// Request a stop.
    pub fn trigger(&self) {
        self.tx.send_replace(true);
    }

    pub fn is_triggered(&self) -> bool {
        *self.rx.borrow()
    }

    /// Resolves once a stop has been requested.
    pub async fn triggered(&self) {
        let mut rx = self.rx.clone();
        let _ = rx.wait_for(|stop| *stop).await;
    }

    /// Sleep for `duration`. Returns `false` if interrupted first.
    pub async fn sleep(&self, duration: Duration) -> bool {
        if self.is_triggered() {
            return false;
        }
        if duration.is_zero() {
            return true;
        }
        tokio::select! {
            _ = tokio::time::sleep(duration) => true,
            _ = self.triggered() => false,
        }
    }

    /// Trigger on the first Ctrl-C; exit hard on the second.
    pub fn listen_for_ctrl_c(&self) {
        let shutdown = self.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_err() {
                log::warn!("Could not install Ctrl-C handler");
                return;
            }
            log::warn!("Interrupt received, stopping after the current request...");
            shutdown.trigger();

            if tokio::signal::ctrl_c().await.is_ok() {
                log::error!("Second interrupt, exiting immediately");
                std::process::exit(130);
            }
        });
    }
}

impl Default for Shutdown {
    fn default() -> Self {
        Self::new()
    }
}
