pub mod animation;
pub mod state;

use std::rc::Rc;

use glam::Vec3;

use crate::ecs::systems::behavior::Brain;
use crate::ecs::systems::movement::Steering;
use crate::events::EventBus;
use animation::Pose;
use state::AgentState;

/// Stable handle for one cat across the simulation, scheduler and events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct AgentId(pub u32);

/// One cat: where it is, what it feels, and the bookkeeping its behavior
/// and steering carry between frames.
pub struct Cat {
    pub id: AgentId,
    pub name: String,
    pub position: Vec3,
    pub state: AgentState,
    pub steering: Steering,
    pub brain: Brain,
    pub pose: Pose,
    /// Seeded per cat so sessions replay identically.
    pub rng: fastrand::Rng,
}

impl Cat {
    pub fn new(id: AgentId, name: impl Into<String>, position: Vec3, bus: Rc<EventBus>, seed: u64) -> Self {
        Self {
            id,
            name: name.into(),
            position,
            state: AgentState::new(id, bus),
            steering: Steering::new(),
            brain: Brain::default(),
            pose: Pose::default(),
            rng: fastrand::Rng::with_seed(seed),
        }
    }

    /// Unit vector the cat is facing, on the floor plane.
    pub fn forward(&self) -> Vec3 {
        let a = self.state.movement().facing_angle;
        Vec3::new(a.sin(), 0.0, a.cos())
    }
}

/// Pick a name for a freshly adopted cat.
pub fn generate_cat_name(rng: &mut fastrand::Rng) -> String {
    const TITLES: &[&str] = &["", "", "", "Sir ", "Lady ", "Captain ", "Little "];
    const NAMES: &[&str] = &[
        "Miso", "Pepper", "Biscuit", "Luna", "Mochi", "Noodle", "Salem", "Tofu",
        "Pickles", "Ginger", "Waffles", "Cleo",
    ];
    format!(
        "{}{}",
        TITLES[rng.usize(0..TITLES.len())],
        NAMES[rng.usize(0..NAMES.len())],
    )
}
