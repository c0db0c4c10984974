use std::cell::Cell;
use std::rc::Rc;
use std::time::Duration;

use clap::Parser;
use glam::Vec3;
use instant::Instant;

use crate::cat::generate_cat_name;
use crate::debug::{status_lines, DebugReport};
use crate::ecs::components::{Food, FoodKind};
use crate::ecs::systems::Simulation;
use crate::events::{CatEvent, EventBus, EventKind, SubscriptionId};
use crate::house;
use crate::temperament::Temperament;
use crate::tuning::Tuning;

/// Max accumulated time before we clamp (prevents spiral of death).
const MAX_ACCUMULATOR: f64 = 0.25;
/// Longest run accepted; the f32 clock stops resolving small ticks beyond it.
const MAX_SECONDS: f64 = 86_400.0;
/// Spacing between cats spawned together.
const SPAWN_SPREAD: f32 = 0.6;

/// Headless run of house cats: feeds them, tidies up after them and logs
/// what they get up to.
#[derive(Parser, Debug, Clone)]
#[command(name = "roomcat", version, about)]
pub struct Args {
    /// Simulated seconds to run for.
    #[arg(long, default_value_t = 120.0, allow_negative_numbers = true)]
    pub seconds: f64,

    /// Fixed tick length in seconds.
    #[arg(long, default_value_t = 1.0 / 60.0, allow_negative_numbers = true)]
    pub dt: f64,

    /// RNG seed; random when omitted.
    #[arg(long)]
    pub seed: Option<u64>,

    /// placid, normal or feral.
    #[arg(long, default_value = "normal")]
    pub temperament: String,

    /// How many cats to adopt.
    #[arg(long, default_value_t = 1)]
    pub cats: usize,

    /// Pour food every N simulated seconds; 0 never feeds.
    #[arg(long, default_value_t = 45.0, allow_negative_numbers = true)]
    pub feed_every: f64,

    /// Stand knocked-over props back up every N seconds; 0 never tidies.
    #[arg(long, default_value_t = 60.0, allow_negative_numbers = true)]
    pub tidy_every: f64,

    /// Pace the simulation against the wall clock.
    #[arg(long)]
    pub realtime: bool,

    /// Status report interval in seconds; 0 disables.
    #[arg(long, default_value_t = 5.0, allow_negative_numbers = true)]
    pub report_every: f64,
}

impl Args {
    fn validate(&self) -> Result<Temperament, Box<dyn std::error::Error>> {
        if !(self.dt.is_finite() && self.dt > 0.0 && self.dt <= MAX_ACCUMULATOR) {
            return Err(format!("--dt must be in (0, {MAX_ACCUMULATOR}], got {}", self.dt).into());
        }
        if !(self.seconds.is_finite() && (0.0..=MAX_SECONDS).contains(&self.seconds)) {
            return Err(format!("--seconds must be in [0, {MAX_SECONDS}], got {}", self.seconds).into());
        }
        if self.cats == 0 {
            return Err("--cats must be at least 1".into());
        }
        for (flag, v) in [
            ("--feed-every", self.feed_every),
            ("--tidy-every", self.tidy_every),
            ("--report-every", self.report_every),
        ] {
            if !(v.is_finite() && v >= 0.0) {
                return Err(format!("{flag} must be non-negative, got {v}").into());
            }
        }
        Temperament::from_label(&self.temperament).ok_or_else(|| {
            let known: Vec<&str> = Temperament::all().iter().map(|t| t.label()).collect();
            format!(
                "unknown temperament '{}' (expected one of: {})",
                self.temperament,
                known.join(", ")
            )
            .into()
        })
    }
}

// ---------------------------------------------------------------------------
// Event tally
// ---------------------------------------------------------------------------

/// Running totals gathered from the event bus for the end-of-run summary.
#[derive(Default)]
struct Tally {
    meows: Cell<u32>,
    demands: Cell<u32>,
    treats: Cell<u32>,
    knocked: Cell<u32>,
    attacks: Cell<u32>,
    damage: Cell<f32>,
}

fn attach_tally(bus: &EventBus) -> (Rc<Tally>, Vec<SubscriptionId>) {
    let tally = Rc::new(Tally::default());
    let kinds = [
        EventKind::Meowed,
        EventKind::FoodDemanded,
        EventKind::PreferenceSatisfied,
        EventKind::PropKnockedOver,
        EventKind::AttackModeChanged,
        EventKind::PlayerDamaged,
    ];
    let ids = kinds
        .into_iter()
        .map(|kind| {
            let t = Rc::clone(&tally);
            bus.subscribe(kind, move |event| match *event {
                CatEvent::Meowed { .. } => t.meows.set(t.meows.get() + 1),
                CatEvent::FoodDemanded { .. } => t.demands.set(t.demands.get() + 1),
                CatEvent::PreferenceSatisfied { .. } => t.treats.set(t.treats.get() + 1),
                CatEvent::PropKnockedOver { .. } => t.knocked.set(t.knocked.get() + 1),
                CatEvent::AttackModeChanged { active: true, .. } => {
                    t.attacks.set(t.attacks.get() + 1)
                }
                CatEvent::PlayerDamaged { amount, .. } => t.damage.set(t.damage.get() + amount),
                _ => {}
            })
        })
        .collect();
    (tally, ids)
}

// ---------------------------------------------------------------------------
// Household script
// ---------------------------------------------------------------------------

/// The human side of the run: feeds on a timer, rotating bowls, and tidies.
struct Household {
    bowls: Vec<hecs::Entity>,
    next_bowl: usize,
    feed_every: f64,
    tidy_every: f64,
    feed_timer: f64,
    tidy_timer: f64,
    rng: fastrand::Rng,
}

impl Household {
    fn step(&mut self, sim: &mut Simulation, dt: f64) {
        if self.feed_every > 0.0 && !self.bowls.is_empty() {
            self.feed_timer += dt;
            if self.feed_timer >= self.feed_every {
                self.feed_timer = 0.0;
                let bowl = self.bowls[self.next_bowl % self.bowls.len()];
                self.next_bowl += 1;
                let kind = FoodKind::ALL[self.rng.usize(0..FoodKind::ALL.len())];
                if !sim.add_food(bowl, Food::full(kind)) {
                    log::debug!("bowl {:?} still has food, skipping", bowl);
                }
            }
        }
        if self.tidy_every > 0.0 {
            self.tidy_timer += dt;
            if self.tidy_timer >= self.tidy_every {
                self.tidy_timer = 0.0;
                sim.tidy_props();
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

pub fn run() -> Result<(), Box<dyn std::error::Error>> {
    run_with(Args::parse())
}

pub fn run_with(args: Args) -> Result<(), Box<dyn std::error::Error>> {
    let temperament = args.validate()?;
    let seed = args.seed.unwrap_or_else(|| fastrand::u64(..));
    let mut rng = fastrand::Rng::with_seed(seed);

    let mut tuning = Tuning::default();
    temperament.apply(&mut tuning);
    log::info!(
        "temperament {} | seed {} | {:.0}s at dt {:.4}",
        temperament.label(),
        seed,
        args.seconds,
        args.dt
    );

    let flat = house::default_flat();
    let bus = Rc::new(EventBus::new());
    let (tally, tally_ids) = attach_tally(&bus);
    let mut report = DebugReport::attach(&bus, args.report_every);

    let mut sim = Simulation::new(flat.scene, flat.rooms, tuning, Rc::clone(&bus));
    for i in 0..args.cats {
        let offset = Vec3::new(i as f32 * SPAWN_SPREAD, 0.0, 0.0);
        let name = generate_cat_name(&mut rng);
        sim.spawn_cat(name, flat.cat_spawn + offset, rng.u64(..));
    }

    let mut household = Household {
        bowls: flat.bowls,
        next_bowl: 0,
        feed_every: args.feed_every,
        tidy_every: args.tidy_every,
        feed_timer: 0.0,
        tidy_timer: 0.0,
        rng: fastrand::Rng::with_seed(rng.u64(..)),
    };

    let tick = args.dt;
    let mut accumulator = 0.0f64;
    let mut tick_count: u64 = 0;
    let mut last_frame = Instant::now();
    let started = Instant::now();

    while (sim.now() as f64) < args.seconds {
        let frame_time = if args.realtime {
            std::thread::sleep(Duration::from_secs_f64(tick));
            let now = Instant::now();
            let elapsed = now.duration_since(last_frame).as_secs_f64();
            last_frame = now;
            elapsed
        } else {
            tick
        };

        accumulator = (accumulator + frame_time).min(MAX_ACCUMULATOR);
        while accumulator >= tick {
            household.step(&mut sim, tick);
            report.set_clock(sim.now());
            sim.tick(tick as f32);
            accumulator -= tick;
            tick_count += 1;
        }
        report.record_frame(frame_time, &sim);
    }

    log::info!(
        "done: {} ticks, {:.1}s simulated in {:.2}s",
        tick_count,
        sim.now(),
        started.elapsed().as_secs_f64()
    );
    for line in status_lines(&sim) {
        log::info!("{line}");
    }
    log::info!(
        "meows {} | demands {} | treats {} | props knocked {} | attacks {} | damage {:.1}",
        tally.meows.get(),
        tally.demands.get(),
        tally.treats.get(),
        tally.knocked.get(),
        tally.attacks.get(),
        tally.damage.get()
    );

    for id in tally_ids {
        bus.unsubscribe(id);
    }
    Ok(())
}
