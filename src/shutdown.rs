//! Cooperative cancellation for graceful shutdown.
//!
//! The interrupt handler only sets a flag; the acquisition loop polls it at
//! the top of every iteration and never interrupts an in-flight read.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tracing::{info, warn};

/// Shared cancellation flag
///
/// Clones observe the same state.
#[derive(Debug, Clone, Default)]
pub struct CancellationSignal {
    flag: Arc<AtomicBool>,
}

impl CancellationSignal {
    /// Create a flag that is not cancelled
    pub fn new() -> Self {
        Self::default()
    }

    /// Request shutdown
    pub fn cancel(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    /// Whether shutdown has been requested
    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }

    /// Register the Ctrl+C handler on the current tokio runtime
    ///
    /// The first interrupt cancels cooperatively. A second interrupt while
    /// the loop is still blocked on a read exits the process immediately.
    pub fn install_ctrl_c_handler(&self) {
        let signal = self.clone();
        tokio::spawn(async move {
            if let Err(e) = tokio::signal::ctrl_c().await {
                warn!("Cannot listen for Ctrl+C: {}", e);
                return;
            }
            info!("Received Ctrl+C, finishing after the current read...");
            signal.cancel();

            if tokio::signal::ctrl_c().await.is_ok() {
                warn!("Second Ctrl+C, exiting without clean shutdown");
                std::process::exit(130);
            }
        });
    }
}
