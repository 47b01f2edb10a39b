use std::sync::Arc;

use chrono::{DateTime, Utc};
use shutterbook_domain::{EngineError, SlotRepository};

use crate::waitlist::WaitlistCoordinator;

/// Outcome of one sweep pass.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SweepReport {
    pub scanned: usize,
    pub reclaimed: usize,
    pub promoted: usize,
    pub failures: usize,
}

/// Recurring reclamation of lapsed holds. The read path already treats
/// stale holds as available; this pass keeps storage consistent and is
/// the only thing that drives waitlist promotion for abandoned holds.
pub struct ExpirySweeper {
    slots: Arc<dyn SlotRepository>,
    waitlist: Arc<WaitlistCoordinator>,
}

impl ExpirySweeper {
    pub fn new(slots: Arc<dyn SlotRepository>, waitlist: Arc<WaitlistCoordinator>) -> Self {
        Self { slots, waitlist }
    }

    /// One pass over every lapsed hold. Each reclaim is a conditional
    /// write keyed on the expiry the scan observed, so a hold renewed in
    /// between keeps its slot, and running the sweep twice cannot
    /// double-reclaim or double-notify. A failure on one slot is logged
    /// and the pass moves on.
    pub async fn sweep(&self, now: DateTime<Utc>) -> Result<SweepReport, EngineError> {
        let mut report = SweepReport::default();

        let expired = self.slots.expired_holds(now).await?;
        report.scanned = expired.len();

        for slot in expired {
            let Some(observed_until) = slot.held_until else {
                // A held row without an expiry is corrupt; skip it
                // rather than halting the sweep.
                tracing::warn!(slot_id = %slot.id, "held slot with no expiry, skipping");
                report.failures += 1;
                continue;
            };

            match self.slots.try_reclaim(slot.id, observed_until, now).await {
                Ok(true) => {
                    report.reclaimed += 1;
                    tracing::debug!(slot_id = %slot.id, "stale hold reclaimed");

                    let lapsed_contact = slot.held_by.clone().unwrap_or_default();
                    let released = match self.slots.get(slot.id).await {
                        Ok(s) => s,
                        Err(e) => {
                            tracing::warn!(slot_id = %slot.id, error = %e, "reclaimed slot vanished before promotion");
                            report.failures += 1;
                            continue;
                        }
                    };

                    // The lapsed hold may have been a promotion: expire
                    // that entry first, then promote the next in line.
                    match self
                        .waitlist
                        .on_promotion_lapsed(&released, &lapsed_contact, now)
                        .await
                    {
                        Ok(Some(_)) => report.promoted += 1,
                        Ok(None) => {}
                        Err(e) => {
                            tracing::warn!(slot_id = %slot.id, error = %e, "waitlist promotion failed");
                            report.failures += 1;
                        }
                    }
                }
                // Renewed (or otherwise moved on) between scan and
                // write; not ours to reclaim.
                Ok(false) => {}
                Err(e) => {
                    tracing::warn!(slot_id = %slot.id, error = %e, "failed to reclaim slot");
                    report.failures += 1;
                }
            }
        }

        Ok(report)
    }
}
