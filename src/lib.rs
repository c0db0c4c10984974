pub mod app;
pub mod cat;
pub mod debug;
pub mod ecs;
pub mod events;
pub mod house;
pub mod scheduler;
pub mod spatial;
pub mod temperament;
pub mod tuning;

pub use cat::state::{Activity, AgentState};
pub use cat::{AgentId, Cat};
pub use ecs::systems::Simulation;
pub use events::{CatEvent, EventBus, EventKind};
pub use tuning::Tuning;
