pub mod recent;
pub mod timer;

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use self::recent::RecentLog;
use crate::cat::state::Activity;
use crate::cat::{AgentId, Cat};
use crate::ecs::systems::Simulation;
use crate::events::{CatEvent, EventBus, EventKind, SubscriptionId};

/// Activity changes to keep for the report.
const HISTORY_LEN: usize = 64;
/// Entries of history printed per report.
const HISTORY_SHOWN: usize = 8;

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ActivityRecord {
    /// Simulation time of the change (seconds).
    pub at: f32,
    pub agent: AgentId,
    pub activity: Activity,
}

/// Periodic text report: frame stats, per-phase timings, one line per cat
/// and the most recent activity changes.
pub struct DebugReport {
    bus: Rc<EventBus>,
    subscription: SubscriptionId,
    history: Rc<RefCell<RecentLog<ActivityRecord>>>,
    clock: Rc<Cell<f32>>,

    /// Seconds between reports; zero or less disables them.
    pub interval: f64,

    frame_count: u64,
    log_timer: f64,
    log_frame_count: u32,
    log_frame_sum: f64,
    log_frame_min: f64,
    log_frame_max: f64,
}

impl DebugReport {
    /// Start recording activity changes from `bus`.
    pub fn attach(bus: &Rc<EventBus>, interval: f64) -> Self {
        let history = Rc::new(RefCell::new(RecentLog::new(HISTORY_LEN)));
        let clock = Rc::new(Cell::new(0.0));

        let h = Rc::clone(&history);
        let c = Rc::clone(&clock);
        let subscription = bus.subscribe(EventKind::ActivityChanged, move |event| {
            if let CatEvent::ActivityChanged { agent, activity } = *event {
                h.borrow_mut().record(ActivityRecord {
                    at: c.get(),
                    agent,
                    activity,
                });
            }
        });

        Self {
            bus: Rc::clone(bus),
            subscription,
            history,
            clock,
            interval,
            frame_count: 0,
            log_timer: 0.0,
            log_frame_count: 0,
            log_frame_sum: 0.0,
            log_frame_min: f64::MAX,
            log_frame_max: 0.0,
        }
    }

    /// Simulation time stamped on activity changes recorded from now on.
    pub fn set_clock(&self, now: f32) {
        self.clock.set(now);
    }

    pub fn history(&self) -> Vec<ActivityRecord> {
        self.history.borrow().latest(usize::MAX).copied().collect()
    }

    /// Record one frame's wall time. Logs a full report every `interval`
    /// seconds; returns true when it did.
    pub fn record_frame(&mut self, frame_time: f64, sim: &Simulation) -> bool {
        self.frame_count += 1;
        self.log_frame_count += 1;
        self.log_frame_sum += frame_time;
        self.log_frame_min = self.log_frame_min.min(frame_time);
        self.log_frame_max = self.log_frame_max.max(frame_time);
        self.log_timer += frame_time;

        if self.interval <= 0.0 || self.log_timer < self.interval {
            return false;
        }

        let avg_ms = (self.log_frame_sum / self.log_frame_count as f64) * 1000.0;
        log::info!(
            "t={:.1}s | frame avg: {:.3}ms | min: {:.3}ms | max: {:.3}ms | frames: {}",
            sim.now(),
            avg_ms,
            self.log_frame_min * 1000.0,
            self.log_frame_max * 1000.0,
            self.frame_count,
        );
        log::info!("timings {}", sim.timers().summary());
        for line in status_lines(sim) {
            log::info!("{line}");
        }
        for record in self.history.borrow().latest(HISTORY_SHOWN) {
            let name = sim.cat(record.agent).map_or("?", |c| c.name.as_str());
            log::debug!("  {:>7.2}s {} -> {}", record.at, name, record.activity.label());
        }

        self.log_timer = 0.0;
        self.log_frame_count = 0;
        self.log_frame_sum = 0.0;
        self.log_frame_min = f64::MAX;
        self.log_frame_max = 0.0;
        true
    }
}

impl Drop for DebugReport {
    fn drop(&mut self) {
        self.bus.unsubscribe(self.subscription);
    }
}

/// One line per cat plus the player's health.
pub fn status_lines(sim: &Simulation) -> Vec<String> {
    let mut lines: Vec<String> = sim.cats().iter().map(status_line).collect();
    if let Some(health) = sim.scene.player_health() {
        lines.push(format!("player health {:.1}", health));
    }
    lines
}

pub fn status_line(cat: &Cat) -> String {
    let s = &cat.state;
    let mut line = format!(
        "{:<14} {:<24} hunger {:>5.1} anger {:>5.1} at ({:>5.2}, {:>5.2}) speed {:.2}",
        cat.name,
        s.activity().label(),
        s.hunger(),
        s.anger(),
        cat.position.x,
        cat.position.z,
        s.movement().current_speed,
    );
    if let Some(kind) = s.food().food_preference {
        line.push_str(&format!(" wants {}", kind.label()));
    }
    if cat.brain.attack_mode {
        line.push_str(" [attacking]");
    }
    if s.animation().is_meowing {
        line.push_str(" \"meow\"");
    }
    line
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cat::state::AgentState;

    #[test]
    fn history_stamps_activity_changes() {
        let bus = Rc::new(EventBus::new());
        let report = DebugReport::attach(&bus, 5.0);
        let mut state = AgentState::new(AgentId(3), Rc::clone(&bus));

        report.set_clock(1.5);
        state.set_activity(Activity::Walking);
        report.set_clock(2.0);
        state.set_activity(Activity::Idle);

        assert_eq!(
            report.history(),
            vec![
                ActivityRecord {
                    at: 1.5,
                    agent: AgentId(3),
                    activity: Activity::Walking
                },
                ActivityRecord {
                    at: 2.0,
                    agent: AgentId(3),
                    activity: Activity::Idle
                },
            ]
        );
    }

    #[test]
    fn dropping_report_unsubscribes() {
        let bus = Rc::new(EventBus::new());
        let report = DebugReport::attach(&bus, 5.0);
        assert_eq!(bus.subscriber_count(EventKind::ActivityChanged), 1);
        drop(report);
        assert_eq!(bus.subscriber_count(EventKind::ActivityChanged), 0);
    }
}
