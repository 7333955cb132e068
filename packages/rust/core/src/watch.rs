//! Debounced change watching.
//!
//! A [`Debouncer`] turns a burst of change notifications into a single
//! trailing trigger once the stream has been quiet for [`SETTLE_WINDOW`].

use std::future::Future;
use std::time::Duration;

use tokio::process::Command;
use tracing::{debug, error, info};

use groqspec_content::Subscription;
use groqspec_shared::{GroqSpecError, Result};

/// Quiet period that ends a burst.
pub const SETTLE_WINDOW: Duration = Duration::from_millis(100);

/// Collapses bursts of change events from a [`Subscription`].
pub struct Debouncer {
    subscription: Subscription,
    window: Duration,
}

impl Debouncer {
    pub fn new(subscription: Subscription) -> Self {
        Self {
            subscription,
            window: SETTLE_WINDOW,
        }
    }

    #[cfg(test)]
    fn with_window(subscription: Subscription, window: Duration) -> Self {
        Self {
            subscription,
            window,
        }
    }

    /// Wait for the next settled burst and return how many events it held.
    ///
    /// Returns `None` once the subscription has ended and nothing is pending.
    pub async fn next_settled(&mut self) -> Option<usize> {
        self.subscription.next().await?;
        let mut collapsed = 1;

        loop {
            match tokio::time::timeout(self.window, self.subscription.next()).await {
                Ok(Some(_)) => collapsed += 1,
                // Quiet window elapsed, or the stream closed mid-burst.
                Ok(None) | Err(_) => return Some(collapsed),
            }
        }
    }
}

/// Run `on_change` after every settled burst until the subscription ends.
///
/// Each run is awaited before the next burst is considered, so runs never
/// overlap.
pub async fn run<F, Fut>(mut debouncer: Debouncer, mut on_change: F)
where
    F: FnMut(usize) -> Fut,
    Fut: Future<Output = ()>,
{
    info!("Listening for changes");
    while let Some(collapsed) = debouncer.next_settled().await {
        debug!(collapsed, "changes settled");
        on_change(collapsed).await;
    }
    info!("change stream closed");
}

/// Start `program args` with inherited stdio without waiting for it.
pub fn spawn_command(program: &str, args: &[String]) -> Result<()> {
    info!("Running: {} {}", program, args.join(" "));

    Command::new(program)
        .args(args)
        .spawn()
        .map(drop)
        .map_err(|e| GroqSpecError::io(program, e))
}

/// Watch sink that spawns a command per settled burst, logging failures.
pub async fn run_command_on_change(debouncer: Debouncer, program: &str, args: &[String]) {
    run(debouncer, move |_| async move {
        if let Err(e) = spawn_command(program, args) {
            error!(error = %e, "watch command failed to start");
        }
    })
    .await;
}
