//! Shutdown phase broadcasting.
//!
//! When a termination signal arrives the server walks through three phases:
//!
//! ```text
//! Initiated           readiness turns false, cancellation token fires
//! GracePeriodStarted  in-flight requests drain, lifecycle services still up
//! GracePeriodEnded    drain timeout expired before the server finished
//! ```
//!
//! Background work can either watch the [`CancellationToken`] or subscribe to
//! the phases through [`ShutdownNotifier::subscribe`]:
//!
//! ```rust,no_run
//! use axum_hardened::{Config, FluentRouter, ShutdownPhase};
//!
//! # async fn example() -> axum_hardened::Result<()> {
//! let router = FluentRouter::without_state(Config::default())?;
//! let mut phases = router.shutdown_notifier().subscribe();
//!
//! tokio::spawn(async move {
//!     while let Ok(phase) = phases.recv().await {
//!         if let ShutdownPhase::GracePeriodStarted { timeout } = phase {
//!             tracing::info!("{}s left to flush caches", timeout.as_secs());
//!         }
//!     }
//! });
//! # Ok(())
//! # }
//! ```

use {std::time::Duration, tokio::sync::broadcast, tokio_util::sync::CancellationToken};

/// A step of the shutdown sequence, emitted in declaration order.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ShutdownPhase {
    /// A signal was received. The listener stops accepting connections and
    /// `/ready` answers 503 from here on.
    Initiated,

    /// In-flight requests are draining.
    GracePeriodStarted {
        /// How long the server waits before giving up on the drain.
        timeout: Duration,
    },

    /// The drain timeout elapsed. Lifecycle services are stopped next.
    GracePeriodEnded,
}

/// Broadcasts [`ShutdownPhase`]s and owns the shutdown [`CancellationToken`].
///
/// Clones share the same channel and token.
#[derive(Clone)]
pub struct ShutdownNotifier {
    sender: broadcast::Sender<ShutdownPhase>,
    cancel_token: CancellationToken,
}

impl ShutdownNotifier {
    /// `capacity` bounds the unread phases buffered per subscriber.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self {
            sender,
            cancel_token: CancellationToken::new(),
        }
    }

    /// Subscribers only see phases emitted after they subscribed.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<ShutdownPhase> {
        self.sender.subscribe()
    }

    /// Token cancelled together with [`ShutdownPhase::Initiated`].
    ///
    /// ```rust
    /// use axum_hardened::ShutdownNotifier;
    ///
    /// let notifier = ShutdownNotifier::default();
    /// let token = notifier.cancellation_token();
    /// assert!(!token.is_cancelled());
    /// ```
    #[must_use]
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel_token.clone()
    }

    #[must_use]
    pub fn is_shutdown_initiated(&self) -> bool {
        self.cancel_token.is_cancelled()
    }

    /// Sends `phase` to every subscriber and returns how many received it.
    pub(crate) fn emit(&self, phase: ShutdownPhase) -> usize {
        if phase == ShutdownPhase::Initiated {
            self.cancel_token.cancel();
        }
        self.sender.send(phase).unwrap_or(0)
    }
}

impl Default for ShutdownNotifier {
    fn default() -> Self {
        Self::new(16)
    }
}

impl std::fmt::Debug for ShutdownNotifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ShutdownNotifier")
            .field("subscribers", &self.sender.receiver_count())
            .field("initiated", &self.is_shutdown_initiated())
            .finish()
    }
}
