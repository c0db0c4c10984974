use glam::Vec3;

use crate::cat::state::Activity;
use crate::cat::Cat;
use crate::debug::timer::SystemPhase;
use crate::ecs::components::{FoodKind, Prop};
use crate::ecs::systems::movement::{self, heading};
use crate::ecs::systems::Env;
use crate::events::CatEvent;
use crate::scheduler::Task;
use crate::spatial::{flat_distance, Scene};
use crate::tuning::Tuning;

/// An eating session in progress; bites carry its id so stale ones are ignored.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EatingSession {
    pub id: u32,
    pub bowl: hecs::Entity,
}

/// Timers and goals the behavior rules carry from frame to frame.
#[derive(Debug, Clone, Default)]
pub struct Brain {
    /// Prop being stalked for knocking over.
    pub mischief_target: Option<hecs::Entity>,
    /// Time spent next to the mischief target.
    pub mischief_timer: f32,
    /// Consecutive seconds above the very-hungry line.
    pub angry_duration: f32,
    pub attack_mode: bool,
    pub attack_timer: f32,
    /// Clock time of the last food-preference demand.
    pub last_demand: Option<f32>,
    pub eating: Option<EatingSession>,
    sessions: u32,
}

impl Brain {
    fn release_mischief(&mut self) {
        self.mischief_target = None;
        self.mischief_timer = 0.0;
    }
}

/// One step of the per-frame decision pass.
pub struct Rule {
    pub name: &'static str,
    pub phase: SystemPhase,
    pub run: fn(&mut Cat, &mut Env<'_>, f32),
}

/// Evaluated top to bottom every frame. Earlier rules see nothing of later
/// ones; later rules see this frame's hunger and anger.
pub const RULES: [Rule; 7] = [
    Rule {
        name: "hunger",
        phase: SystemPhase::Hunger,
        run: accrue_hunger,
    },
    Rule {
        name: "food preference",
        phase: SystemPhase::Preference,
        run: demand_food,
    },
    Rule {
        name: "mischief",
        phase: SystemPhase::Mischief,
        run: mischief,
    },
    Rule {
        name: "attack",
        phase: SystemPhase::Attack,
        run: attack,
    },
    Rule {
        name: "movement",
        phase: SystemPhase::Movement,
        run: walk_or_wander,
    },
    Rule {
        name: "food seeking",
        phase: SystemPhase::FoodSeeking,
        run: seek_food,
    },
    Rule {
        name: "eating",
        phase: SystemPhase::Eating,
        run: check_bowl,
    },
];

/// Run every rule once for this frame.
pub fn update(cat: &mut Cat, env: &mut Env<'_>, dt: f32) {
    for rule in &RULES {
        env.timers.begin();
        (rule.run)(cat, env, dt);
        env.timers.end(rule.phase);
    }
}

// ---------------------------------------------------------------------------
// Rules
// ---------------------------------------------------------------------------

fn accrue_hunger(cat: &mut Cat, env: &mut Env<'_>, dt: f32) {
    let t = env.tuning;
    if !cat.state.food().is_eating {
        cat.state.set_hunger(cat.state.hunger() + t.hunger_rate * dt);
    }
    refresh_anger(cat, t);

    if cat.state.hunger() > t.very_hungry_threshold {
        cat.brain.angry_duration += dt;
    } else {
        cat.brain.angry_duration = 0.0;
    }
}

fn refresh_anger(cat: &mut Cat, t: &Tuning) {
    let anger = ((cat.state.hunger() - t.hungry_threshold) * 2.0).max(0.0);
    cat.state.set_anger(anger);
}

fn demand_food(cat: &mut Cat, env: &mut Env<'_>, _dt: f32) {
    let t = env.tuning;
    if cat.state.hunger() <= t.hungry_threshold || env.scene.any_bowl_has_food() {
        return;
    }
    let due = match (cat.state.food().food_preference, cat.brain.last_demand) {
        (Some(_), Some(at)) => env.now - at >= t.preference_cooldown,
        _ => true,
    };
    if !due {
        return;
    }

    let kind = FoodKind::ALL[cat.rng.usize(0..FoodKind::ALL.len())];
    cat.state.update_food(|f| f.food_preference = Some(kind));
    cat.brain.last_demand = Some(env.now);
    log::info!("{} is demanding {}", cat.name, kind.label());
    cat.state.bus().emit(CatEvent::FoodDemanded { agent: cat.id, kind });
}

fn mischief(cat: &mut Cat, env: &mut Env<'_>, dt: f32) {
    let t = env.tuning;

    if let Some(prop) = cat.brain.mischief_target {
        let standing = env.scene.prop(prop).is_some_and(|p| !p.is_knocked_over);
        let Some(prop_pos) = env.scene.position(prop).filter(|_| standing) else {
            // Gone or already on the floor.
            cat.brain.release_mischief();
            cat.state.set_activity(Activity::Idle);
            return;
        };

        cat.state.set_activity(Activity::KnockingProp);
        if flat_distance(cat.position, prop_pos) > t.knock_distance {
            cat.brain.mischief_timer = 0.0;
            movement::move_towards(cat, prop_pos, env.scene, env.rooms, t, dt);
            return;
        }

        if cat.state.movement().destination.is_some() {
            movement::stop(cat);
        }
        let face = heading(cat.position, prop_pos);
        cat.state.update_movement(|m| {
            m.facing_angle = face;
            m.target_angle = face;
        });

        cat.brain.mischief_timer += dt;
        if cat.brain.mischief_timer >= t.knock_pause {
            if let Some(mut p) = env.scene.prop_mut(prop) {
                p.knock_over();
                log::info!("{} knocked over the {}", cat.name, p.name);
            }
            cat.state
                .bus()
                .emit(CatEvent::PropKnockedOver { agent: cat.id, prop });
            cat.brain.release_mischief();
            cat.state.set_activity(Activity::Idle);
        }
        return;
    }

    if cat.state.food().is_eating
        || cat.brain.angry_duration <= t.mischief_delay
        || env.scene.any_bowl_has_food()
    {
        return;
    }
    if cat.rng.f32() >= t.mischief_chance(cat.brain.angry_duration) {
        return;
    }
    let Some(prop) = pick_mischief_target(cat, env.scene) else {
        return;
    };
    log::info!("{} is eyeing something breakable", cat.name);
    cat.brain.mischief_target = Some(prop);
    cat.brain.mischief_timer = 0.0;
    cat.state.set_activity(Activity::KnockingProp);
}

/// Nearest standing prop; if the nearest one is already down, any other
/// standing prop at random.
fn pick_mischief_target(cat: &mut Cat, scene: &Scene) -> Option<hecs::Entity> {
    let nearest = scene.find_nearest::<Prop>(cat.position, |_| true)?;
    if scene.prop(nearest.entity).is_some_and(|p| !p.is_knocked_over) {
        return Some(nearest.entity);
    }
    let standing = scene.find_all::<Prop>(|p| !p.is_knocked_over);
    if standing.is_empty() {
        return None;
    }
    Some(standing[cat.rng.usize(0..standing.len())].entity)
}

fn attack(cat: &mut Cat, env: &mut Env<'_>, dt: f32) {
    let t = env.tuning;
    let player = env.scene.player_position();
    let engaged = cat.state.anger() >= t.annoyed_anger
        && !env.scene.any_bowl_has_food()
        && env.scene.all_props_knocked_over()
        && player.is_some();

    let Some(player) = player.filter(|_| engaged) else {
        if cat.brain.attack_mode {
            cat.brain.attack_mode = false;
            cat.brain.attack_timer = 0.0;
            movement::stop(cat);
            cat.state.set_activity(Activity::Idle);
            log::info!("{} calms down", cat.name);
            cat.state.bus().emit(CatEvent::AttackModeChanged {
                agent: cat.id,
                active: false,
            });
        }
        return;
    };

    if !cat.brain.attack_mode {
        cat.brain.attack_mode = true;
        cat.brain.attack_timer = 0.0;
        cat.state.update_food(|f| f.target_bowl = None);
        log::info!("{} has had enough and goes for you", cat.name);
        cat.state.bus().emit(CatEvent::AttackModeChanged {
            agent: cat.id,
            active: true,
        });
    }
    cat.brain.attack_timer += dt;

    let chase = Vec3::new(player.x, cat.position.y, player.z);
    if flat_distance(cat.position, chase) > t.attack_range {
        cat.state.set_activity(Activity::ChasingPlayer);
        movement::move_towards(cat, chase, env.scene, env.rooms, t, dt);
        return;
    }

    movement::stop(cat);
    let face = heading(cat.position, chase);
    cat.state.update_movement(|m| {
        m.destination = Some(chase);
        m.facing_angle = face;
        m.target_angle = face;
    });
    cat.state.set_activity(Activity::AttackingPlayer);

    let amount = t.attack_damage_rate * dt;
    if let Some(health) = env.scene.change_player_health(-amount) {
        log::trace!("{} scratches you, health {:.1}", cat.name, health);
        cat.state.bus().emit(CatEvent::PlayerDamaged {
            agent: cat.id,
            amount,
            health,
        });
    }
}

fn walk_or_wander(cat: &mut Cat, env: &mut Env<'_>, dt: f32) {
    if cat.brain.attack_mode || cat.brain.mischief_target.is_some() || cat.state.food().is_eating {
        return;
    }
    let t = env.tuning;

    let Some(destination) = cat.state.movement().destination else {
        if cat.rng.f32() < t.wander_chance {
            let point = env
                .rooms
                .locate(cat.position)
                .and_then(|room| env.rooms.random_point(room, t.wander_margin, &mut cat.rng))
                .filter(|&p| !movement::is_blocked(p, env.scene, t));
            if let Some(point) = point {
                cat.state.update_movement(|m| m.destination = Some(point));
                if cat.state.activity() == Activity::Idle {
                    cat.state.set_activity(Activity::Walking);
                }
            }
        }
        return;
    };

    if !movement::move_towards(cat, destination, env.scene, env.rooms, t, dt) {
        return;
    }

    // Arrived. At a stocked bowl: wait for the eating check.
    if let Some(bowl) = cat.state.food().target_bowl {
        let at_bowl = env.scene.bowl_has_food(bowl)
            && env
                .scene
                .position(bowl)
                .is_some_and(|p| flat_distance(cat.position, p) <= t.reach_radius);
        if at_bowl {
            return;
        }
    }
    if cat.state.hunger() > t.hungry_threshold {
        if let Some(found) = env.scene.nearest_bowl_with_food(cat.position, t.food_detection_range) {
            head_for_bowl(cat, found.entity, found.position);
            cat.state.set_activity(Activity::GoingToBowl);
            return;
        }
    }
    if cat.state.activity() != Activity::SearchingFood {
        cat.state.set_activity(Activity::Idle);
    }
}

fn seek_food(cat: &mut Cat, env: &mut Env<'_>, _dt: f32) {
    if cat.brain.attack_mode || cat.brain.mischief_target.is_some() || cat.state.food().is_eating {
        return;
    }
    let t = env.tuning;
    let food = *cat.state.food();

    if food.heard_food {
        cat.state.update_food(|f| f.heard_food = false);
        let heard = food
            .heard_food_bowl
            .filter(|&b| env.scene.bowl_has_food(b))
            .and_then(|b| env.scene.position(b).map(|p| (b, p)));
        if let Some((bowl, pos)) = heard {
            log::debug!("{} heard food being poured", cat.name);
            head_for_bowl(cat, bowl, pos);
            cat.state.set_activity(Activity::HeardFood);
            return;
        }
    }

    if cat.state.hunger() <= t.hungry_threshold {
        return;
    }
    if food.target_bowl.is_some_and(|b| env.scene.bowl_has_food(b)) {
        return;
    }

    match env.scene.nearest_bowl_with_food(cat.position, t.food_detection_range) {
        Some(found) => {
            log::debug!("{} spotted food at {:?}", cat.name, found.entity);
            head_for_bowl(cat, found.entity, found.position);
            cat.state.set_activity(Activity::GoingToBowl);
        }
        None => {
            if food.target_bowl.is_some() {
                cat.state.update_food(|f| f.target_bowl = None);
            }
            cat.state.set_activity(Activity::SearchingFood);
            maybe_meow(cat, env);
        }
    }
}

fn check_bowl(cat: &mut Cat, env: &mut Env<'_>, _dt: f32) {
    if cat.brain.attack_mode {
        return;
    }
    let t = env.tuning;
    if env.now - cat.state.food().last_bowl_check < t.bowl_check_interval {
        return;
    }
    let now = env.now;
    cat.state.update_food(|f| f.last_bowl_check = now);

    if cat.state.food().is_eating {
        return;
    }
    let Some(bowl) = cat.state.food().target_bowl else {
        return;
    };
    let Some(bowl_pos) = env.scene.position(bowl) else {
        cat.state.update_food(|f| f.target_bowl = None);
        return;
    };
    if !env.scene.bowl_has_food(bowl) || flat_distance(cat.position, bowl_pos) > t.reach_radius {
        return;
    }
    start_eating(cat, env, bowl, bowl_pos);
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn head_for_bowl(cat: &mut Cat, bowl: hecs::Entity, pos: Vec3) {
    cat.state.update_food(|f| f.target_bowl = Some(bowl));
    cat.state.update_movement(|m| m.destination = Some(pos));
}

fn maybe_meow(cat: &mut Cat, env: &mut Env<'_>) {
    let now = env.now;
    let recent = cat
        .state
        .animation()
        .last_meow
        .is_some_and(|at| now - at < env.tuning.meow_interval);
    if recent {
        return;
    }
    cat.state.update_animation(|a| {
        a.is_meowing = true;
        a.last_meow = Some(now);
    });
    log::debug!("{}: meow", cat.name);
    cat.state.bus().emit(CatEvent::Meowed { agent: cat.id });
    env.scheduler
        .schedule(cat.id, env.tuning.meow_duration, Task::HideMeow { meowed_at: now });
}

/// Settle next to the bowl, face it and book the bites for one session.
fn start_eating(cat: &mut Cat, env: &mut Env<'_>, bowl: hecs::Entity, bowl_pos: Vec3) {
    let t = env.tuning;
    let mut away = cat.position - bowl_pos;
    away.y = 0.0;
    let away = away.try_normalize().unwrap_or(-cat.forward());
    cat.position = Vec3::new(bowl_pos.x, cat.position.y, bowl_pos.z) + away * t.eat_distance;

    movement::stop(cat);
    let face = heading(cat.position, bowl_pos);
    cat.state.update_movement(|m| {
        m.facing_angle = face;
        m.target_angle = face;
    });

    cat.brain.sessions += 1;
    let session = cat.brain.sessions;
    cat.brain.eating = Some(EatingSession { id: session, bowl });
    cat.state.update_food(|f| {
        f.is_eating = true;
        f.target_bowl = None;
    });
    cat.state.set_activity(Activity::Eating);
    log::info!("{} starts eating", cat.name);

    let bites = t.bites_per_session.max(1);
    for i in 1..=bites {
        let delay = t.eat_session * i as f32 / bites as f32;
        env.scheduler
            .schedule(cat.id, delay, Task::EatBite { session, bowl });
    }
    env.scheduler
        .schedule(cat.id, t.eat_session, Task::FinishEating { session });
}

fn in_session(cat: &Cat, session: u32) -> bool {
    cat.state.food().is_eating && cat.brain.eating.is_some_and(|s| s.id == session)
}

fn finish_eating(cat: &mut Cat) {
    cat.brain.eating = None;
    cat.state.update_food(|f| f.is_eating = false);
    cat.state.set_activity(Activity::Idle);
}

/// Stop eating now. Pending bites for the session become no-ops.
pub fn cancel_eating(cat: &mut Cat) -> bool {
    if !cat.state.food().is_eating {
        return false;
    }
    finish_eating(cat);
    true
}

/// Apply a deferred task that has come due. Each task re-checks the current
/// state first; stale tasks do nothing.
pub fn apply_task(cat: &mut Cat, task: Task, env: &mut Env<'_>) {
    let t = env.tuning;
    match task {
        Task::EatBite { session, bowl } => {
            if !in_session(cat, session) {
                return;
            }
            let eaten = env
                .scene
                .bowl_mut(bowl)
                .and_then(|mut b| b.consume(t.bite_fraction()));
            let Some((kind, nutrition)) = eaten else {
                finish_eating(cat);
                return;
            };
            cat.state.set_hunger(cat.state.hunger() - nutrition);
            refresh_anger(cat, t);

            if cat.state.food().food_preference == Some(kind) {
                cat.state.update_food(|f| f.food_preference = None);
                log::info!("{} got the {} it wanted", cat.name, kind.label());
                cat.state
                    .bus()
                    .emit(CatEvent::PreferenceSatisfied { agent: cat.id, kind });
            }
            if !env.scene.bowl_has_food(bowl) {
                log::debug!("{} licked the bowl clean", cat.name);
                finish_eating(cat);
            }
        }
        Task::FinishEating { session } => {
            if in_session(cat, session) {
                finish_eating(cat);
            }
        }
        Task::HideMeow { meowed_at } => {
            let current = cat.state.animation().last_meow == Some(meowed_at);
            if current && cat.state.animation().is_meowing {
                cat.state.update_animation(|a| a.is_meowing = false);
            }
        }
    }
}

/// Food was poured into `bowl`. Returns whether the cat took notice.
pub fn hear_food(cat: &mut Cat, bowl: hecs::Entity, now: f32, tuning: &Tuning) -> bool {
    let busy = cat.state.food().is_eating
        || cat.brain.mischief_target.is_some()
        || cat.brain.attack_mode;
    if busy || cat.state.hunger() < tuning.curious_hunger {
        return false;
    }
    cat.state.update_food(|f| {
        f.heard_food = true;
        f.heard_food_bowl = Some(bowl);
        f.last_food_sound = Some(now);
    });
    true
}
