//! Cooperative periodic task runner.
//!
//! A fixed, ordered table of named tasks, each with its own interval and
//! last-run timestamp.  One [`PeriodicTaskRunner::tick`] walks the table
//! once and hands every due task to a [`TaskDelegate`]; the runner itself
//! knows nothing about radios, thresholds or servos.
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │  tick()                                                      │
//! │                                                              │
//! │   RadioMaintenance ─▶ SensorRead ─▶ ThresholdSync ─▶         │
//! │        (0 ms)          (500 ms)       (1000 ms)              │
//! │                                                              │
//! │   ─▶ LevelUpdate ─▶ TelemetryPublish                         │
//! │       (1000 ms)        (1000 ms)                             │
//! │                                                              │
//! │   due?  last_run == None  ||  now − last_run > interval      │
//! │         └──▶ delegate.run_task(id) ──▶ last_run = now        │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! Tasks run to completion and are never re-entered.  A task's own
//! blocking (an advertising window, a servo sweep) delays the tasks after
//! it in the same pass, which is why "now" is sampled per task.

use log::{debug, info, warn};

use crate::app::ports::{Clock, TaskDelegate};
use crate::config::SystemConfig;
use crate::error::Result;

// ═══════════════════════════════════════════════════════════════
//  Task identity
// ═══════════════════════════════════════════════════════════════

/// Every periodic task, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum TaskId {
    RadioMaintenance = 0,
    SensorRead = 1,
    ThresholdSync = 2,
    LevelUpdate = 3,
    TelemetryPublish = 4,
}

impl TaskId {
    pub const COUNT: usize = 5;

    /// Execution order.
    pub const ALL: [Self; Self::COUNT] = [
        Self::RadioMaintenance,
        Self::SensorRead,
        Self::ThresholdSync,
        Self::LevelUpdate,
        Self::TelemetryPublish,
    ];

    pub const fn label(self) -> &'static str {
        match self {
            Self::RadioMaintenance => "radio-maintenance",
            Self::SensorRead => "sensor-read",
            Self::ThresholdSync => "threshold-sync",
            Self::LevelUpdate => "level-update",
            Self::TelemetryPublish => "telemetry-publish",
        }
    }
}

// ═══════════════════════════════════════════════════════════════
//  Runner
// ═══════════════════════════════════════════════════════════════

/// Bookkeeping for one task.
#[derive(Debug, Clone, Copy)]
struct TaskEntry {
    id: TaskId,
    interval_ms: u32,
    /// `None` = never run; fires on the next tick.
    last_run_ms: Option<u64>,
    enabled: bool,
    runs: u32,
}

pub struct PeriodicTaskRunner {
    tasks: [TaskEntry; TaskId::COUNT],
}

impl PeriodicTaskRunner {
    /// Build the table with explicit intervals, indexed like [`TaskId::ALL`].
    pub fn new(intervals_ms: [u32; TaskId::COUNT]) -> Self {
        let tasks = TaskId::ALL.map(|id| TaskEntry {
            id,
            interval_ms: intervals_ms[id as usize],
            last_run_ms: None,
            enabled: true,
            runs: 0,
        });
        Self { tasks }
    }

    pub fn from_config(config: &SystemConfig) -> Self {
        Self::new([
            0,
            config.sensor_read_interval_ms,
            config.threshold_sync_interval_ms,
            config.level_update_interval_ms,
            config.telemetry_interval_ms,
        ])
    }

    /// Run every due task once, in order.
    ///
    /// Returns how many tasks ran.  Non-fatal task errors are logged and
    /// swallowed; a fatal one stops the pass and is returned.
    pub fn tick(&mut self, clock: &impl Clock, delegate: &mut impl TaskDelegate) -> Result<usize> {
        let mut ran = 0;
        for entry in self.tasks.iter_mut() {
            if !entry.enabled || !Self::due(entry, clock.now_ms()) {
                continue;
            }

            let result = delegate.run_task(entry.id);
            entry.last_run_ms = Some(clock.now_ms());
            entry.runs = entry.runs.saturating_add(1);
            ran += 1;

            if let Err(e) = result {
                if e.is_fatal() {
                    warn!("Task '{}' failed fatally: {}", entry.id.label(), e);
                    return Err(e);
                }
                warn!("Task '{}': {}", entry.id.label(), e);
            }
        }
        Ok(ran)
    }

    fn due(entry: &TaskEntry, now_ms: u64) -> bool {
        match entry.last_run_ms {
            None => true,
            Some(last) => now_ms.saturating_sub(last) > u64::from(entry.interval_ms),
        }
    }

    /// Whether `id` would run if a tick happened at `now_ms`.
    pub fn is_due(&self, id: TaskId, now_ms: u64) -> bool {
        let entry = &self.tasks[id as usize];
        entry.enabled && Self::due(entry, now_ms)
    }

    /// Enable or disable a single task.  A disabled task keeps its timestamp.
    pub fn set_enabled(&mut self, id: TaskId, enabled: bool) {
        let entry = &mut self.tasks[id as usize];
        if entry.enabled != enabled {
            info!(
                "Scheduler: '{}' {}",
                id.label(),
                if enabled { "enabled" } else { "disabled" }
            );
        }
        entry.enabled = enabled;
    }

    pub fn is_enabled(&self, id: TaskId) -> bool {
        self.tasks[id as usize].enabled
    }

    /// Mark every task as never run.
    pub fn reset(&mut self) {
        debug!("Scheduler: all tasks reset");
        for entry in self.tasks.iter_mut() {
            entry.last_run_ms = None;
        }
    }

    pub fn last_run(&self, id: TaskId) -> Option<u64> {
        self.tasks[id as usize].last_run_ms
    }

    pub fn interval_ms(&self, id: TaskId) -> u32 {
        self.tasks[id as usize].interval_ms
    }

    /// How many times `id` has run since construction.
    pub fn runs(&self, id: TaskId) -> u32 {
        self.tasks[id as usize].runs
    }
}

// ═══════════════════════════════════════════════════════════════
//  Tests
// ═══════════════════════════════════════════════════════════════
