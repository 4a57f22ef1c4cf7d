//! Overdue Sweeper
//!
//! Periodically returns active bookings whose rental period has elapsed.
//! Each booking goes through the same ledger transition as a manual
//! action, so a booking that a concurrent cancel/return already closed is
//! simply skipped. Storage failures are logged and retried on the next
//! tick; nothing here propagates to the caller.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::task::JoinHandle;
use tokio::time::Duration;
use tracing::{debug, info, warn};

use crate::application::bookings::BookingService;
use crate::domain::{DomainError, RepositoryProvider};
use crate::shared::shutdown::ShutdownSignal;

/// Outcome of one sweep.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SweepReport {
    /// Overdue bookings found by the scan
    pub scanned: usize,
    pub returned: usize,
    /// Closed concurrently (or no longer overdue) before we got to them
    pub skipped: usize,
    pub failed: usize,
}

pub struct OverdueSweeper {
    repos: Arc<dyn RepositoryProvider>,
    bookings: Arc<BookingService>,
    interval: Duration,
}

impl OverdueSweeper {
    pub fn new(
        repos: Arc<dyn RepositoryProvider>,
        bookings: Arc<BookingService>,
        interval: Duration,
    ) -> Self {
        Self {
            repos,
            bookings,
            interval,
        }
    }

    /// Spawn the sweep loop. The first tick fires immediately, so a sweep
    /// runs at start-up and then once per interval until `shutdown`.
    pub fn start(self: Arc<Self>, shutdown: ShutdownSignal) -> JoinHandle<()> {
        tokio::spawn(async move {
            info!(
                interval_secs = self.interval.as_secs(),
                "Overdue sweeper started"
            );

            let mut interval = tokio::time::interval(self.interval);

            loop {
                tokio::select! {
                    _ = interval.tick() => {
                        self.sweep_once(Utc::now()).await;
                    }
                    _ = shutdown.notified().wait() => {
                        info!("Overdue sweeper shutting down");
                        break;
                    }
                }
            }

            info!("Overdue sweeper stopped");
        })
    }

    /// Return every active booking whose end date is before `now`.
    pub async fn sweep_once(&self, now: DateTime<Utc>) -> SweepReport {
        metrics::counter!("rental_sweep_runs_total").increment(1);

        let overdue = match self.repos.bookings().find_overdue(now).await {
            Ok(overdue) => overdue,
            Err(e) => {
                metrics::counter!("rental_sweep_failures_total").increment(1);
                warn!(error = %e, "Overdue scan failed, retrying next tick");
                return SweepReport::default();
            }
        };

        let mut report = SweepReport {
            scanned: overdue.len(),
            ..Default::default()
        };
        if overdue.is_empty() {
            debug!("No overdue bookings");
            return report;
        }

        for booking in overdue {
            match self.bookings.expire(booking.id, now).await {
                Ok(_) => report.returned += 1,
                Err(DomainError::Conflict(reason)) => {
                    debug!(booking_id = booking.id, %reason, "Skipping booking");
                    report.skipped += 1;
                }
                Err(DomainError::NotFound { .. }) => report.skipped += 1,
                Err(e) => {
                    metrics::counter!("rental_sweep_failures_total").increment(1);
                    warn!(booking_id = booking.id, error = %e, "Failed to return overdue booking");
                    report.failed += 1;
                }
            }
        }

        metrics::counter!("rental_sweep_returned_total").increment(report.returned as u64);
        info!(
            scanned = report.scanned,
            returned = report.returned,
            skipped = report.skipped,
            failed = report.failed,
            "Overdue sweep finished"
        );
        report
    }
}
