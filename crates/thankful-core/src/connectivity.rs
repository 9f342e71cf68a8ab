//! Process-wide online/offline flag with change notification.

use std::sync::Arc;

use tokio::sync::watch;

/// Tracks whether the device is currently online.
///
/// Seeded with the platform-reported value at construction and updated by the
/// two transition notifications (`set_online` / `set_offline`). The signal is
/// trusted verbatim: no retries, no heartbeat, no persistence. Dependents
/// observe changes through `subscribe`; deregistration is dropping the
/// receiver.
#[derive(Clone)]
pub struct ConnectivityMonitor {
    flag: Arc<watch::Sender<bool>>,
}

impl ConnectivityMonitor {
    /// Create a monitor seeded with the platform-reported flag.
    #[must_use]
    pub fn new(initially_online: bool) -> Self {
        let (tx, _rx) = watch::channel(initially_online);
        Self { flag: Arc::new(tx) }
    }

    /// Current connectivity flag.
    #[must_use]
    pub fn is_online(&self) -> bool {
        *self.flag.borrow()
    }

    /// Record the became-online transition.
    pub fn set_online(&self) {
        self.flag.send_replace(true);
    }

    /// Record the became-offline transition.
    pub fn set_offline(&self) {
        self.flag.send_replace(false);
    }

    /// Watch connectivity changes.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<bool> {
        self.flag.subscribe()
    }
}

impl Default for ConnectivityMonitor {
    fn default() -> Self {
        Self::new(true)
    }
}
