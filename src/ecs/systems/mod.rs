pub mod behavior;
pub mod movement;

use std::rc::Rc;

use glam::Vec3;

use crate::cat::animation::animate;
use crate::cat::{AgentId, Cat};
use crate::debug::timer::{SystemPhase, SystemTimers};
use crate::ecs::components::Food;
use crate::events::EventBus;
use crate::scheduler::Scheduler;
use crate::spatial::rooms::RoomGraph;
use crate::spatial::Scene;
use crate::tuning::Tuning;

/// Everything a behavior rule may look at or touch besides the cat itself.
pub struct Env<'a> {
    pub scene: &'a mut Scene,
    pub rooms: &'a RoomGraph,
    pub scheduler: &'a mut Scheduler,
    pub tuning: &'a Tuning,
    pub timers: &'a mut SystemTimers,
    /// Simulation clock at the start of this frame (seconds).
    pub now: f32,
}

/// The cats plus the house they live in, advanced one frame at a time.
pub struct Simulation {
    pub scene: Scene,
    pub rooms: RoomGraph,
    pub tuning: Tuning,
    bus: Rc<EventBus>,
    cats: Vec<Cat>,
    scheduler: Scheduler,
    timers: SystemTimers,
    next_id: u32,
}

impl Simulation {
    pub fn new(scene: Scene, rooms: RoomGraph, tuning: Tuning, bus: Rc<EventBus>) -> Self {
        Self {
            scene,
            rooms,
            tuning,
            bus,
            cats: Vec::new(),
            scheduler: Scheduler::new(),
            timers: SystemTimers::new(),
            next_id: 0,
        }
    }

    pub fn bus(&self) -> &Rc<EventBus> {
        &self.bus
    }

    pub fn now(&self) -> f32 {
        self.scheduler.now()
    }

    pub fn timers(&self) -> &SystemTimers {
        &self.timers
    }

    pub fn pending_tasks(&self) -> usize {
        self.scheduler.len()
    }

    pub fn cats(&self) -> &[Cat] {
        &self.cats
    }

    pub fn cat(&self, id: AgentId) -> Option<&Cat> {
        self.cats.iter().find(|c| c.id == id)
    }

    pub fn cat_mut(&mut self, id: AgentId) -> Option<&mut Cat> {
        self.cats.iter_mut().find(|c| c.id == id)
    }

    /// Add a cat and register it with every bowl so it hears feeding.
    pub fn spawn_cat(&mut self, name: impl Into<String>, position: Vec3, seed: u64) -> AgentId {
        let id = AgentId(self.next_id);
        self.next_id += 1;
        let cat = Cat::new(id, name, position, Rc::clone(&self.bus), seed);
        for bowl in self.scene.bowls() {
            if let Some(mut b) = self.scene.bowl_mut(bowl) {
                b.register_cat(id);
            }
        }
        log::info!("{} (cat {}) moves in at ({:.1}, {:.1})", cat.name, id.0, position.x, position.z);
        self.cats.push(cat);
        id
    }

    /// Remove a cat, its bowl registrations and any timers it still has pending.
    pub fn despawn_cat(&mut self, id: AgentId) -> bool {
        let Some(index) = self.cats.iter().position(|c| c.id == id) else {
            return false;
        };
        let cat = self.cats.remove(index);
        for bowl in self.scene.bowls() {
            if let Some(mut b) = self.scene.bowl_mut(bowl) {
                b.unregister_cat(id);
            }
        }
        let cancelled = self.scheduler.cancel_agent(id);
        log::info!("{} leaves ({} pending timers dropped)", cat.name, cancelled);
        true
    }

    /// Place a bowl; every current cat registers with it.
    pub fn spawn_bowl(&mut self, pos: Vec3) -> hecs::Entity {
        let bowl = self.scene.spawn_bowl(pos);
        if let Some(mut b) = self.scene.bowl_mut(bowl) {
            for cat in &self.cats {
                b.register_cat(cat.id);
            }
        }
        bowl
    }

    /// Fill a bowl. Registered cats hear it; returns false if the bowl is
    /// missing or still has food in it.
    pub fn add_food(&mut self, bowl: hecs::Entity, food: Food) -> bool {
        let listeners = {
            let Some(mut b) = self.scene.bowl_mut(bowl) else {
                return false;
            };
            if !b.add_food(food) {
                return false;
            }
            let cats = b.cats().to_vec();
            cats
        };
        log::info!("poured {} into bowl {:?}", food.kind.label(), bowl);

        let now = self.now();
        for cat in self.cats.iter_mut().filter(|c| listeners.contains(&c.id)) {
            if behavior::hear_food(cat, bowl, now, &self.tuning) {
                log::debug!("{} perks up at the sound of food", cat.name);
            }
        }
        true
    }

    /// Stand every knocked-over prop back up.
    pub fn tidy_props(&mut self) -> usize {
        let count = self.scene.reset_props();
        if count > 0 {
            log::info!("tidied up {} knocked-over props", count);
        }
        count
    }

    /// Advance one frame: behavior for every cat, then due timers, then poses.
    pub fn tick(&mut self, dt: f32) {
        if !(dt.is_finite() && dt > 0.0) {
            return;
        }
        let now = self.scheduler.advance(dt);
        let mut env = Env {
            scene: &mut self.scene,
            rooms: &self.rooms,
            scheduler: &mut self.scheduler,
            tuning: &self.tuning,
            timers: &mut self.timers,
            now,
        };

        for cat in &mut self.cats {
            behavior::update(cat, &mut env, dt);
        }

        env.timers.begin();
        for (agent, task) in env.scheduler.drain_due() {
            match self.cats.iter_mut().find(|c| c.id == agent) {
                Some(cat) => behavior::apply_task(cat, task, &mut env),
                None => log::trace!("dropping task for departed cat {}", agent.0),
            }
        }
        env.timers.end(SystemPhase::Scheduler);

        env.timers.begin();
        for cat in &mut self.cats {
            cat.pose = animate(&mut cat.state, env.tuning.max_speed, dt);
        }
        env.timers.end(SystemPhase::Animation);
    }
}
