// ── Poll scheduling ──
//
// Poll requests for each cadence, the re-entrancy guard that keeps poll
// cycles from overlapping, and the background tasks that drive them.

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::dashboard::Dashboard;

/// Parameters of one poll cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollRequest {
    /// Bypass the monitor's registry cache.
    pub force: bool,
    /// Mark every row pending with loading placeholders before fetching.
    pub show_loading: bool,
    /// Ask for the cheap payload without per-container stats.
    pub light: bool,
}

impl PollRequest {
    /// Startup: forced, placeholders shown immediately.
    pub const INITIAL: Self = Self {
        force: true,
        show_loading: true,
        light: true,
    };
    /// Fast cadence: unforced and flicker-free.
    pub const FAST: Self = Self {
        force: false,
        show_loading: false,
        light: true,
    };
    /// Slow cadence: same request, acts as a full re-sync.
    pub const SLOW: Self = Self::FAST;
    /// Manual refresh and post-action refresh.
    pub const USER: Self = Self::INITIAL;
}

/// How a poll cycle ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollOutcome {
    /// Live snapshot reconciled.
    Live,
    /// Fetch failed; the cached snapshot is shown as pending.
    Cached,
    /// Fetch failed and no cache exists; the view is untouched.
    Unchanged,
    /// Another cycle was running; nothing happened.
    Skipped,
}

/// On-demand work for the trigger channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trigger {
    Poll(PollRequest),
    FillVisible,
    RefreshUnused,
}

// ── Re-entrancy guard ────────────────────────────────────────────

/// Held for the duration of one poll cycle, metrics pass or prune; releases the
/// flag on drop, whichever way the work exits.
pub(crate) struct BusyGuard<'a> {
    flag: &'a AtomicBool,
}

impl<'a> BusyGuard<'a> {
    /// `None` if the flag is already held. Never waits.
    pub(crate) fn try_acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self { flag })
    }
}

impl Drop for BusyGuard<'_> {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::Release);
    }
}

// ── Background tasks ─────────────────────────────────────────────

/// Run a poll cycle every `period`.
pub(crate) async fn poll_task(
    dashboard: Dashboard,
    period: Duration,
    request: PollRequest,
    cancel: CancellationToken,
) {
    let mut interval = tokio::time::interval(period);
    interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
    interval.tick().await; // consume the immediate first tick

    loop {
        tokio::select! {
            biased;
            () = cancel.cancelled() => break,
            _ = interval.tick() => {
                let outcome = dashboard.poll_cycle(request).await;
                debug!(?outcome, ?period, "scheduled poll");
            }
        }
    }
}

/// Periodically refresh the unused-image count.
pub(crate) async fn unused_task(dashboard: Dashboard, period: Duration, cancel: CancellationToken) {
    let mut interval = tokio::time::interval(period);
    interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
    interval.tick().await; // consume the immediate first tick

    loop {
        tokio::select! {
            biased;
            () = cancel.cancelled() => break,
            _ = interval.tick() => {
                dashboard.refresh_unused().await;
            }
        }
    }
}

/// Run the first lazy metrics pass once `delay` has elapsed.
pub(crate) async fn deferred_fill_task(
    dashboard: Dashboard,
    delay: Duration,
    cancel: CancellationToken,
) {
    tokio::select! {
        biased;
        () = cancel.cancelled() => {}
        () = tokio::time::sleep(delay) => {
            dashboard.fill_visible_metrics().await;
        }
    }
}

/// Process on-demand triggers until cancelled or every sender is gone.
pub(crate) async fn trigger_task(
    dashboard: Dashboard,
    mut rx: mpsc::Receiver<Trigger>,
    cancel: CancellationToken,
) {
    loop {
        tokio::select! {
            biased;
            () = cancel.cancelled() => break,
            trigger = rx.recv() => {
                let Some(trigger) = trigger else { break };
                match trigger {
                    Trigger::Poll(request) => {
                        let outcome = dashboard.poll_cycle(request).await;
                        if outcome == PollOutcome::Skipped {
                            debug!("triggered poll skipped: cycle already running");
                        }
                    }
                    Trigger::FillVisible => {
                        dashboard.fill_visible_metrics().await;
                    }
                    Trigger::RefreshUnused => {
                        if dashboard.refresh_unused().await.is_none() {
                            warn!("unused image count unavailable");
                        }
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn guard_is_exclusive_and_released_on_drop() {
        let flag = AtomicBool::new(false);
        let guard = BusyGuard::try_acquire(&flag);
        assert!(guard.is_some());
        assert!(BusyGuard::try_acquire(&flag).is_none());
        drop(guard);
        assert!(BusyGuard::try_acquire(&flag).is_some());
    }

    #[test]
    fn cadences() {
        assert!(PollRequest::INITIAL.force && PollRequest::INITIAL.show_loading);
        assert!(!PollRequest::FAST.force && !PollRequest::FAST.show_loading);
        assert_eq!(PollRequest::SLOW, PollRequest::FAST);
        assert_eq!(PollRequest::USER, PollRequest::INITIAL);
    }
}
