use crate::cat::AgentId;

/// One-shot deferred work driven by the frame clock. Whoever drains a task
/// re-checks the agent's state first, so a task that fires after the bowl
/// emptied or the cat left does nothing.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Task {
    /// Take one bite from the bowl of eating session `session`.
    EatBite { session: u32, bowl: hecs::Entity },
    /// End eating session `session`.
    FinishEating { session: u32 },
    /// Hide the meow bubble raised at `meowed_at`.
    HideMeow { meowed_at: f32 },
}

#[derive(Debug, Clone, Copy)]
struct Scheduled {
    due: f32,
    seq: u64,
    agent: AgentId,
    task: Task,
}

/// Frame clock plus a list of pending tasks.
pub struct Scheduler {
    now: f32,
    seq: u64,
    pending: Vec<Scheduled>,
}

impl Scheduler {
    pub fn new() -> Self {
        Self {
            now: 0.0,
            seq: 0,
            pending: Vec::with_capacity(16),
        }
    }

    /// Seconds since the simulation started.
    pub fn now(&self) -> f32 {
        self.now
    }

    /// Advance the clock by one frame. Returns the new time.
    pub fn advance(&mut self, dt: f32) -> f32 {
        self.now += dt.max(0.0);
        self.now
    }

    /// Run `task` for `agent` once, `delay` seconds from now.
    pub fn schedule(&mut self, agent: AgentId, delay: f32, task: Task) {
        self.pending.push(Scheduled {
            due: self.now + delay.max(0.0),
            seq: self.seq,
            agent,
            task,
        });
        self.seq += 1;
    }

    /// Remove and return every task whose time has come, earliest first.
    /// Tasks due at the same time come out in scheduling order.
    pub fn drain_due(&mut self) -> Vec<(AgentId, Task)> {
        let now = self.now;
        let mut due: Vec<Scheduled> = Vec::new();
        self.pending.retain(|s| {
            if s.due <= now {
                due.push(*s);
                false
            } else {
                true
            }
        });
        due.sort_by(|a, b| a.due.total_cmp(&b.due).then(a.seq.cmp(&b.seq)));
        due.into_iter().map(|s| (s.agent, s.task)).collect()
    }

    /// Drop everything pending for `agent`. Returns how many were dropped.
    pub fn cancel_agent(&mut self, agent: AgentId) -> usize {
        let before = self.pending.len();
        self.pending.retain(|s| s.agent != agent);
        before - self.pending.len()
    }

    pub fn pending_for(&self, agent: AgentId) -> usize {
        self.pending.iter().filter(|s| s.agent == agent).count()
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}

impl Default for Scheduler {
    fn default() -> Self {
        Self::new()
    }
}
