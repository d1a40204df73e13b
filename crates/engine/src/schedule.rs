// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Wall-clock pause/resume triggers.
//!
//! Each configured instant pauses or resumes the dispatcher once a day.
//! Re-arming adds whole days to the previous absolute fire time rather
//! than working with modular offsets, so a pause/resume pair straddling
//! midnight stays 24 hours apart.

use crate::runner::DispatchRunner;
use chrono::{DateTime, Duration as ChronoDuration, Utc};
use std::sync::Arc;
use tracing::{info, warn};

/// What a trigger does to the dispatcher when it fires.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScheduleAction {
    Pause,
    Resume,
}

/// Earliest fire time at or after `now`, stepping in whole days.
pub(crate) fn next_fire(configured: DateTime<Utc>, now: DateTime<Utc>) -> DateTime<Utc> {
    let mut next = configured;
    while next <= now {
        next += ChronoDuration::hours(24);
    }
    next
}

/// Arm a daily trigger.
///
/// A configured instant already in the past disables the trigger entirely
/// and returns `false`; otherwise the trigger task is spawned and re-arms
/// itself every 24 hours.
pub fn spawn_daily(
    runner: Arc<DispatchRunner>,
    at: DateTime<Utc>,
    action: ScheduleAction,
) -> bool {
    let now = Utc::now();
    if at <= now {
        info!(at = %at, ?action, "configured trigger time already passed; disabled");
        return false;
    }

    tokio::spawn(async move {
        let mut fire_at = at;
        loop {
            let now = Utc::now();
            fire_at = next_fire(fire_at, now);
            let delay = match (fire_at - now).to_std() {
                Ok(d) => d,
                Err(e) => {
                    warn!(error = %e, "trigger delay computation failed; disarming");
                    return;
                }
            };
            tokio::time::sleep(delay).await;

            match action {
                ScheduleAction::Pause => {
                    info!("scheduled pause");
                    runner.stop();
                }
                ScheduleAction::Resume => {
                    info!("scheduled resume");
                    runner.start();
                }
            }
            fire_at += ChronoDuration::hours(24);
        }
    });
    true
}

#[cfg(test)]
#[path = "schedule_tests.rs"]
mod tests;
