//! Tick performance monitoring.
//!
//! Every tick is timed per phase. A tick over budget is logged with its
//! phase breakdown; a run of consecutive slow ticks escalates to a critical
//! log. Observability only: the loop never degrades the simulation.

use std::collections::VecDeque;
use std::time::{Duration, Instant};

use tracing::{error, warn};

use crate::game::constants::timing::{MAX_CONSEC_SLOW, SLOW_TICK_MS};

/// Wall-time measurement of one tick, phase by phase
pub struct TickTimer {
    start: Instant,
    last_mark: Instant,
    phases: Vec<(&'static str, Duration)>,
}

impl TickTimer {
    pub fn start() -> Self {
        let now = Instant::now();
        Self {
            start: now,
            last_mark: now,
            phases: Vec::with_capacity(8),
        }
    }

    /// Close the phase that ran since the previous mark
    pub fn mark(&mut self, phase: &'static str) {
        let now = Instant::now();
        self.phases.push((phase, now - self.last_mark));
        self.last_mark = now;
    }

    pub fn finish(self) -> TickReport {
        TickReport {
            total: self.start.elapsed(),
            phases: self.phases,
        }
    }
}

pub struct TickReport {
    pub total: Duration,
    pub phases: Vec<(&'static str, Duration)>,
}

impl TickReport {
    fn breakdown(&self) -> String {
        self.phases
            .iter()
            .map(|(name, d)| format!("{}={:.1}ms", name, d.as_secs_f64() * 1000.0))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

pub struct TickMonitor {
    /// Rolling window of recent tick durations
    durations: VecDeque<Duration>,
    max_samples: usize,
    slow_budget: Duration,
    consecutive_slow: u32,
}

impl TickMonitor {
    pub fn new() -> Self {
        Self {
            durations: VecDeque::with_capacity(120),
            max_samples: 120,
            slow_budget: Duration::from_millis(SLOW_TICK_MS),
            consecutive_slow: 0,
        }
    }

    pub fn record(&mut self, tick: u64, report: &TickReport) {
        self.durations.push_back(report.total);
        while self.durations.len() > self.max_samples {
            self.durations.pop_front();
        }

        if report.total > self.slow_budget {
            self.consecutive_slow += 1;
            warn!(
                tick,
                total_ms = report.total.as_secs_f64() * 1000.0,
                breakdown = %report.breakdown(),
                "slow tick"
            );
            if self.consecutive_slow >= MAX_CONSEC_SLOW {
                error!(
                    tick,
                    consecutive = self.consecutive_slow,
                    avg_ms = self.average_tick_duration().as_secs_f64() * 1000.0,
                    "sustained tick overload"
                );
            }
        } else {
            self.consecutive_slow = 0;
        }
    }

    pub fn average_tick_duration(&self) -> Duration {
        if self.durations.is_empty() {
            return Duration::ZERO;
        }
        let sum: Duration = self.durations.iter().sum();
        sum / self.durations.len() as u32
    }

    pub fn p95_tick_duration(&self) -> Duration {
        if self.durations.is_empty() {
            return Duration::ZERO;
        }
        let mut sorted: Vec<_> = self.durations.iter().copied().collect();
        sorted.sort();
        let idx = (sorted.len() as f32 * 0.95) as usize;
        sorted
            .get(idx.min(sorted.len() - 1))
            .copied()
            .unwrap_or(Duration::ZERO)
    }

    pub fn consecutive_slow(&self) -> u32 {
        self.consecutive_slow
    }
}

impl Default for TickMonitor {
    fn default() -> Self {
        Self::new()
    }
}
