use std::rc::Rc;

use glam::Vec3;

use crate::cat::AgentId;
use crate::ecs::components::FoodKind;
use crate::events::{CatEvent, EventBus, StateChange};

pub const MAX_HUNGER: f32 = 100.0;

/// What the cat is visibly doing. Exactly one at a time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Activity {
    #[default]
    Idle,
    Walking,
    Eating,
    SearchingFood,
    GoingToBowl,
    Meowing,
    Rotating,
    HeardFood,
    KnockingProp,
    ChasingPlayer,
    AttackingPlayer,
}

impl Activity {
    pub fn label(self) -> &'static str {
        match self {
            Activity::Idle => "idle",
            Activity::Walking => "walking",
            Activity::Eating => "eating",
            Activity::SearchingFood => "searching for food",
            Activity::GoingToBowl => "going to bowl",
            Activity::Meowing => "meowing",
            Activity::Rotating => "turning",
            Activity::HeardFood => "heard food",
            Activity::KnockingProp => "knocking something over",
            Activity::ChasingPlayer => "chasing you",
            Activity::AttackingPlayer => "attacking you",
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct MovementState {
    /// Head of the waypoint queue: the point being walked to right now.
    pub target_position: Option<Vec3>,
    /// Final goal the behavior asked for. `None` cancels movement.
    pub destination: Option<Vec3>,
    pub current_speed: f32,
    /// Yaw in radians; 0 faces +z.
    pub facing_angle: f32,
    pub target_angle: f32,
    pub is_rotating: bool,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct FoodState {
    pub target_bowl: Option<hecs::Entity>,
    pub is_eating: bool,
    /// Clock time of the last reach-the-bowl check.
    pub last_bowl_check: f32,
    pub heard_food: bool,
    pub heard_food_bowl: Option<hecs::Entity>,
    pub last_food_sound: Option<f32>,
    pub food_preference: Option<FoodKind>,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct AnimationState {
    /// Tail oscillator phase.
    pub tail_wag: f32,
    /// Gait phase, advances with speed.
    pub walk_cycle: f32,
    pub is_meowing: bool,
    pub last_meow: Option<f32>,
}

/// The cat's mutable record. Hunger, anger and activity go through setters
/// that clamp and notify observers on the event bus.
pub struct AgentState {
    agent: AgentId,
    bus: Rc<EventBus>,
    hunger: f32,
    anger: f32,
    activity: Activity,
    movement: MovementState,
    food: FoodState,
    animation: AnimationState,
}

impl AgentState {
    pub fn new(agent: AgentId, bus: Rc<EventBus>) -> Self {
        Self {
            agent,
            bus,
            hunger: 0.0,
            anger: 0.0,
            activity: Activity::Idle,
            movement: MovementState::default(),
            food: FoodState::default(),
            animation: AnimationState::default(),
        }
    }

    pub fn agent(&self) -> AgentId {
        self.agent
    }

    pub fn hunger(&self) -> f32 {
        self.hunger
    }

    pub fn anger(&self) -> f32 {
        self.anger
    }

    pub fn activity(&self) -> Activity {
        self.activity
    }

    pub fn movement(&self) -> &MovementState {
        &self.movement
    }

    pub fn food(&self) -> &FoodState {
        &self.food
    }

    pub fn animation(&self) -> &AnimationState {
        &self.animation
    }

    pub fn bus(&self) -> &Rc<EventBus> {
        &self.bus
    }

    /// Stores `clamp(value, 0, 100)` and publishes it.
    pub fn set_hunger(&mut self, value: f32) {
        self.hunger = if value.is_nan() {
            0.0
        } else {
            value.clamp(0.0, MAX_HUNGER)
        };
        self.publish(StateChange::Hunger(self.hunger));
    }

    /// Stores `max(value, 0)` and publishes it.
    pub fn set_anger(&mut self, value: f32) {
        self.anger = if value.is_nan() { 0.0 } else { value.max(0.0) };
        self.publish(StateChange::Anger(self.anger));
    }

    /// Returns true (and notifies) only if the activity actually changed.
    pub fn set_activity(&mut self, activity: Activity) -> bool {
        if self.activity == activity {
            return false;
        }
        log::debug!(
            "cat {} {} -> {}",
            self.agent.0,
            self.activity.label(),
            activity.label()
        );
        self.activity = activity;
        self.bus.emit(CatEvent::ActivityChanged {
            agent: self.agent,
            activity,
        });
        true
    }

    pub fn update_movement(&mut self, f: impl FnOnce(&mut MovementState)) {
        f(&mut self.movement);
        self.movement.current_speed = self.movement.current_speed.max(0.0);
    }

    /// Mutate food state; changes to the target bowl or eating flag are published.
    pub fn update_food(&mut self, f: impl FnOnce(&mut FoodState)) {
        let before = self.food;
        f(&mut self.food);
        if before.target_bowl != self.food.target_bowl {
            self.publish(StateChange::TargetBowl(self.food.target_bowl));
        }
        if before.is_eating != self.food.is_eating {
            self.publish(StateChange::IsEating(self.food.is_eating));
        }
    }

    pub fn update_animation(&mut self, f: impl FnOnce(&mut AnimationState)) {
        f(&mut self.animation);
    }

    fn publish(&self, change: StateChange) {
        self.bus.emit(CatEvent::StateChanged {
            agent: self.agent,
            change,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::EventKind;
    use std::cell::RefCell;

    fn recording(kind: EventKind) -> (AgentState, Rc<RefCell<Vec<CatEvent>>>) {
        let bus = Rc::new(EventBus::new());
        let seen = Rc::new(RefCell::new(Vec::new()));
        let s = Rc::clone(&seen);
        bus.subscribe(kind, move |e| s.borrow_mut().push(e.clone()));
        (AgentState::new(AgentId(1), bus), seen)
    }

    #[test]
    fn hunger_is_clamped() {
        let (mut state, seen) = recording(EventKind::StateChanged);
        for (input, stored) in [(-5.0, 0.0), (42.5, 42.5), (250.0, 100.0), (f32::NAN, 0.0)] {
            state.set_hunger(input);
            assert_eq!(state.hunger(), stored);
        }
        assert_eq!(seen.borrow().len(), 4);
        assert_eq!(
            seen.borrow()[2],
            CatEvent::StateChanged {
                agent: AgentId(1),
                change: StateChange::Hunger(100.0)
            }
        );
    }

    #[test]
    fn anger_never_negative() {
        let (mut state, _) = recording(EventKind::StateChanged);
        state.set_anger(-3.0);
        assert_eq!(state.anger(), 0.0);
        state.set_anger(12.0);
        assert_eq!(state.anger(), 12.0);
    }

    #[test]
    fn activity_change_emits_once() {
        let (mut state, seen) = recording(EventKind::ActivityChanged);
        assert!(state.set_activity(Activity::Walking));
        assert!(!state.set_activity(Activity::Walking));
        assert!(!state.set_activity(Activity::Walking));
        assert_eq!(seen.borrow().len(), 1);
        assert!(state.set_activity(Activity::Idle));
        assert_eq!(seen.borrow().len(), 2);
    }

    #[test]
    fn food_updates_publish_only_watched_fields() {
        let (mut state, seen) = recording(EventKind::StateChanged);
        state.update_food(|f| f.last_bowl_check = 3.0);
        assert!(seen.borrow().is_empty());
        state.update_food(|f| {
            f.is_eating = true;
            f.heard_food = true;
        });
        assert_eq!(
            *seen.borrow(),
            vec![CatEvent::StateChanged {
                agent: AgentId(1),
                change: StateChange::IsEating(true)
            }]
        );
    }

    #[test]
    fn speed_never_negative() {
        let (mut state, _) = recording(EventKind::StateChanged);
        state.update_movement(|m| m.current_speed = -1.0);
        assert_eq!(state.movement().current_speed, 0.0);
    }
}
