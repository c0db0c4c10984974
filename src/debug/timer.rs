use instant::Instant;

/// Which phase of the simulation tick is being timed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum SystemPhase {
    Hunger = 0,
    Preference = 1,
    Mischief = 2,
    Attack = 3,
    Movement = 4,
    FoodSeeking = 5,
    Eating = 6,
    Scheduler = 7,
    Animation = 8,
}

const PHASE_COUNT: usize = 9;

impl SystemPhase {
    pub const ALL: [SystemPhase; PHASE_COUNT] = [
        Self::Hunger,
        Self::Preference,
        Self::Mischief,
        Self::Attack,
        Self::Movement,
        Self::FoodSeeking,
        Self::Eating,
        Self::Scheduler,
        Self::Animation,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Self::Hunger => "Hunger",
            Self::Preference => "Preference",
            Self::Mischief => "Mischief",
            Self::Attack => "Attack",
            Self::Movement => "Movement",
            Self::FoodSeeking => "Food Seek",
            Self::Eating => "Eating",
            Self::Scheduler => "Timers",
            Self::Animation => "Animation",
        }
    }
}

/// Per-phase timing with exponential moving average smoothing.
pub struct SystemTimers {
    /// EMA-smoothed duration in microseconds per phase.
    pub durations_us: [f64; PHASE_COUNT],
    start: Instant,
}

const EMA_ALPHA: f64 = 0.1;

impl SystemTimers {
    pub fn new() -> Self {
        Self {
            durations_us: [0.0; PHASE_COUNT],
            start: Instant::now(),
        }
    }

    /// Call before a phase runs.
    pub fn begin(&mut self) {
        self.start = Instant::now();
    }

    /// Call after a phase finishes. Folds the elapsed time into `phase`.
    pub fn end(&mut self, phase: SystemPhase) {
        let elapsed_us = self.start.elapsed().as_secs_f64() * 1_000_000.0;
        let idx = phase as usize;
        self.durations_us[idx] =
            self.durations_us[idx] * (1.0 - EMA_ALPHA) + elapsed_us * EMA_ALPHA;
    }

    pub fn get(&self, phase: SystemPhase) -> f64 {
        self.durations_us[phase as usize]
    }

    /// Sum of all phase durations (microseconds).
    pub fn total_us(&self) -> f64 {
        self.durations_us.iter().sum()
    }

    /// One line, slowest phases first, phases under a microsecond left out.
    pub fn summary(&self) -> String {
        let mut phases: Vec<(SystemPhase, f64)> = SystemPhase::ALL
            .iter()
            .map(|&p| (p, self.get(p)))
            .filter(|&(_, us)| us >= 1.0)
            .collect();
        phases.sort_by(|a, b| b.1.total_cmp(&a.1));
        let parts: Vec<String> = phases
            .iter()
            .map(|(p, us)| format!("{} {:.1}us", p.label(), us))
            .collect();
        format!("total {:.1}us [{}]", self.total_us(), parts.join(", "))
    }
}

impl Default for SystemTimers {
    fn default() -> Self {
        Self::new()
    }
}
