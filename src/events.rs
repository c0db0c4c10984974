use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::rc::Rc;

use crate::cat::state::Activity;
use crate::cat::AgentId;
use crate::ecs::components::FoodKind;

/// Which field of the cat's state changed.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum StateChange {
    Hunger(f32),
    Anger(f32),
    TargetBowl(Option<hecs::Entity>),
    IsEating(bool),
}

#[derive(Debug, Clone, PartialEq)]
pub enum CatEvent {
    ActivityChanged { agent: AgentId, activity: Activity },
    StateChanged { agent: AgentId, change: StateChange },
    /// The cat wants a specific food (UI attention bubble).
    FoodDemanded { agent: AgentId, kind: FoodKind },
    PreferenceSatisfied { agent: AgentId, kind: FoodKind },
    Meowed { agent: AgentId },
    PropKnockedOver { agent: AgentId, prop: hecs::Entity },
    AttackModeChanged { agent: AgentId, active: bool },
    PlayerDamaged { agent: AgentId, amount: f32, health: f32 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    ActivityChanged,
    StateChanged,
    FoodDemanded,
    PreferenceSatisfied,
    Meowed,
    PropKnockedOver,
    AttackModeChanged,
    PlayerDamaged,
}

impl CatEvent {
    pub fn kind(&self) -> EventKind {
        match self {
            CatEvent::ActivityChanged { .. } => EventKind::ActivityChanged,
            CatEvent::StateChanged { .. } => EventKind::StateChanged,
            CatEvent::FoodDemanded { .. } => EventKind::FoodDemanded,
            CatEvent::PreferenceSatisfied { .. } => EventKind::PreferenceSatisfied,
            CatEvent::Meowed { .. } => EventKind::Meowed,
            CatEvent::PropKnockedOver { .. } => EventKind::PropKnockedOver,
            CatEvent::AttackModeChanged { .. } => EventKind::AttackModeChanged,
            CatEvent::PlayerDamaged { .. } => EventKind::PlayerDamaged,
        }
    }

    pub fn agent(&self) -> AgentId {
        match self {
            CatEvent::ActivityChanged { agent, .. }
            | CatEvent::StateChanged { agent, .. }
            | CatEvent::FoodDemanded { agent, .. }
            | CatEvent::PreferenceSatisfied { agent, .. }
            | CatEvent::Meowed { agent }
            | CatEvent::PropKnockedOver { agent, .. }
            | CatEvent::AttackModeChanged { agent, .. }
            | CatEvent::PlayerDamaged { agent, .. } => *agent,
        }
    }
}

pub type Handler = Rc<dyn Fn(&CatEvent)>;

/// Returned by [`EventBus::subscribe`]; pass back to unsubscribe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

/// Synchronous publish/subscribe between a cat and its observers (status
/// bar, hunger bar, audio). Shared as `Rc<EventBus>`; `emit` walks a snapshot
/// of the handlers, so one that subscribes, unsubscribes or panics mid-dispatch
/// leaves the registry intact.
pub struct EventBus {
    next_id: Cell<u64>,
    handlers: RefCell<HashMap<EventKind, Vec<(SubscriptionId, Handler)>>>,
}

impl EventBus {
    pub fn new() -> Self {
        Self {
            next_id: Cell::new(0),
            handlers: RefCell::new(HashMap::new()),
        }
    }

    /// Register `handler` for one event kind. Handlers run in registration order.
    pub fn subscribe<F>(&self, kind: EventKind, handler: F) -> SubscriptionId
    where
        F: Fn(&CatEvent) + 'static,
    {
        let id = SubscriptionId(self.next_id.get());
        self.next_id.set(id.0 + 1);
        self.handlers
            .borrow_mut()
            .entry(kind)
            .or_default()
            .push((id, Rc::new(handler)));
        id
    }

    /// Remove a handler. Returns false if it was already gone.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut handlers = self.handlers.borrow_mut();
        for list in handlers.values_mut() {
            if let Some(idx) = list.iter().position(|(sid, _)| *sid == id) {
                list.remove(idx);
                return true;
            }
        }
        false
    }

    /// Invoke every current subscriber of the event's kind.
    pub fn emit(&self, event: CatEvent) {
        let snapshot: Vec<Handler> = match self.handlers.borrow().get(&event.kind()) {
            Some(list) => list.iter().map(|(_, h)| Rc::clone(h)).collect(),
            None => return,
        };
        for handler in snapshot {
            handler(&event);
        }
    }

    pub fn subscriber_count(&self, kind: EventKind) -> usize {
        self.handlers.borrow().get(&kind).map_or(0, Vec::len)
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::panic::{catch_unwind, AssertUnwindSafe};

    fn meow() -> CatEvent {
        CatEvent::Meowed { agent: AgentId(0) }
    }

    #[test]
    fn delivers_in_registration_order() {
        let bus = EventBus::new();
        let seen = Rc::new(RefCell::new(Vec::new()));
        for n in 0..3 {
            let seen = Rc::clone(&seen);
            bus.subscribe(EventKind::Meowed, move |_| seen.borrow_mut().push(n));
        }
        bus.emit(meow());
        assert_eq!(*seen.borrow(), vec![0, 1, 2]);
    }

    #[test]
    fn only_matching_kind_is_called() {
        let bus = EventBus::new();
        let hits = Rc::new(Cell::new(0));
        let h = Rc::clone(&hits);
        bus.subscribe(EventKind::ActivityChanged, move |_| h.set(h.get() + 1));
        bus.emit(meow());
        assert_eq!(hits.get(), 0);
    }

    #[test]
    fn unsubscribe_stops_delivery() {
        let bus = EventBus::new();
        let hits = Rc::new(Cell::new(0));
        let h = Rc::clone(&hits);
        let id = bus.subscribe(EventKind::Meowed, move |_| h.set(h.get() + 1));
        bus.emit(meow());
        assert!(bus.unsubscribe(id));
        assert!(!bus.unsubscribe(id));
        bus.emit(meow());
        assert_eq!(hits.get(), 1);
        assert_eq!(bus.subscriber_count(EventKind::Meowed), 0);
    }

    #[test]
    fn handler_may_unsubscribe_itself_mid_dispatch() {
        let bus = Rc::new(EventBus::new());
        let hits = Rc::new(Cell::new(0));
        let slot: Rc<Cell<Option<SubscriptionId>>> = Rc::new(Cell::new(None));

        let (b, s, h) = (Rc::clone(&bus), Rc::clone(&slot), Rc::clone(&hits));
        let id = bus.subscribe(EventKind::Meowed, move |_| {
            h.set(h.get() + 1);
            if let Some(id) = s.get() {
                b.unsubscribe(id);
            }
        });
        slot.set(Some(id));

        bus.emit(meow());
        bus.emit(meow());
        assert_eq!(hits.get(), 1);
    }

    #[test]
    fn panicking_handler_leaves_registry_intact() {
        let bus = EventBus::new();
        let hits = Rc::new(Cell::new(0));
        bus.subscribe(EventKind::Meowed, |_| panic!("observer blew up"));
        let h = Rc::clone(&hits);
        bus.subscribe(EventKind::Meowed, move |_| h.set(h.get() + 1));

        let result = catch_unwind(AssertUnwindSafe(|| bus.emit(meow())));
        assert!(result.is_err());
        assert_eq!(bus.subscriber_count(EventKind::Meowed), 2);

        // Registry is still borrowable and usable.
        let extra = bus.subscribe(EventKind::Meowed, |_| {});
        assert!(bus.unsubscribe(extra));
    }
}
