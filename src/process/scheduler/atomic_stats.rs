/*!
 * Lock-Free Scheduler Statistics
 * Atomic event counters, readable without taking the state lock
 */

use crate::monitoring::SchedulerEvent;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};

/// Scheduler statistics snapshot
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct SchedulerStats {
    /// Run segments dispatched
    pub admissions: u64,
    /// Times a process had to wait for a slot
    pub queued: u64,
    pub completions: u64,
    pub preemptions: u64,
    pub kills: u64,
    pub failures: u64,
    pub capacity: usize,
    pub running_now: usize,
    pub queued_now: usize,
    pub registered_now: usize,
}

/// Atomic counters fed from published events
///
/// # Performance
/// - Cache-line aligned to prevent false sharing
/// - Relaxed ordering; each counter is exact, cross-counter consistency is not guaranteed
#[repr(C, align(64))]
#[derive(Default)]
pub struct AtomicSchedulerStats {
    admissions: AtomicU64,
    queued: AtomicU64,
    completions: AtomicU64,
    preemptions: AtomicU64,
    kills: AtomicU64,
    failures: AtomicU64,
}

impl AtomicSchedulerStats {
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Count an event
    #[inline]
    pub fn record(&self, event: &SchedulerEvent) {
        let counter = match event {
            SchedulerEvent::ProcessStarted { .. } => &self.admissions,
            SchedulerEvent::ProcessQueued { .. } => &self.queued,
            SchedulerEvent::ProcessCompleted { .. } => &self.completions,
            SchedulerEvent::ProcessPreempted { .. } => &self.preemptions,
            SchedulerEvent::ProcessKilled { .. } => &self.kills,
            SchedulerEvent::ProcessFailed { .. } => &self.failures,
            SchedulerEvent::CapacityChanged { .. } => return,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    /// Counter values; live gauges are left at zero for the caller to fill
    #[inline]
    pub fn snapshot(&self) -> SchedulerStats {
        SchedulerStats {
            admissions: self.admissions.load(Ordering::Relaxed),
            queued: self.queued.load(Ordering::Relaxed),
            completions: self.completions.load(Ordering::Relaxed),
            preemptions: self.preemptions.load(Ordering::Relaxed),
            kills: self.kills.load(Ordering::Relaxed),
            failures: self.failures.load(Ordering::Relaxed),
            ..SchedulerStats::default()
        }
    }
}
