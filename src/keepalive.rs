//! Keepalive scheduler — periodic `mrkl` frames for the session lifetime.
//!
//! The first frame goes out immediately after spawn, then one every
//! 45 seconds. Cancellation is cooperative: the task checks the shutdown
//! signal each wake, so the session can guarantee no keepalive is written
//! after teardown begins.

use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, warn};

use crate::session::{SharedWriter, send_frame};

pub const KEEPALIVE_PERIOD: Duration = Duration::from_secs(45);

const KEEPALIVE_BODY: &[u8] = b"type@=mrkl/";

/// Spawn the keepalive task. It stops when `shutdown` flips to true, its
/// sender is dropped, or a write fails (the read loop will surface the same
/// connection failure as the terminal error).
pub fn spawn(writer: SharedWriter, mut shutdown: watch::Receiver<bool>) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(KEEPALIVE_PERIOD);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    if let Err(e) = send_frame(&writer, KEEPALIVE_BODY).await {
                        warn!(error = %e, "keepalive write failed; stopping scheduler");
                        break;
                    }
                    debug!("keepalive sent");
                }
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        debug!("keepalive scheduler cancelled");
                        break;
                    }
                }
            }
        }
    })
}

#[cfg(test)]
#[path = "keepalive_test.rs"]
mod tests;
