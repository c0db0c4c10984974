use std::f32::consts::{PI, TAU};

use crate::cat::state::{Activity, AgentState};

/// Procedural pose for one frame. Consumed by whatever draws the cat.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Pose {
    /// Vertical body offset (metres).
    pub body_bob: f32,
    /// Positive looks up.
    pub head_pitch: f32,
    /// Sideways tail swing (radians).
    pub tail_angle: f32,
    /// Leg swing angles: front-left, front-right, back-left, back-right.
    pub legs: [f32; 4],
}

/// Gait offsets per leg (diagonal pairs in phase).
const LEG_PHASE: [f32; 4] = [0.0, PI, PI, 0.0];
/// Gait cycles per second at full speed.
const STRIDE_RATE: f32 = 9.0;
const LEG_SWING: f32 = 0.5;
const BOB_HEIGHT: f32 = 0.012;
/// Tail wags per second when calm.
const TAIL_RATE: f32 = 1.2;

/// Advance the gait and tail oscillators and build this frame's pose.
/// Reads movement/activity only; never makes behavior decisions.
pub fn animate(state: &mut AgentState, max_speed: f32, dt: f32) -> Pose {
    let speed_ratio = (state.movement().current_speed / max_speed.max(f32::EPSILON)).min(1.0);
    let anger = state.anger();
    let rotating = state.movement().is_rotating;

    // Turning in place still shuffles the feet a little.
    let gait = if rotating { speed_ratio.max(0.3) } else { speed_ratio };
    let tail_rate = TAIL_RATE * (1.0 + anger / 25.0);

    state.update_animation(|a| {
        a.walk_cycle = (a.walk_cycle + dt * STRIDE_RATE * gait).rem_euclid(TAU);
        a.tail_wag = (a.tail_wag + dt * tail_rate * TAU).rem_euclid(TAU);
    });

    let anim = *state.animation();
    let mut legs = [0.0; 4];
    for (leg, phase) in legs.iter_mut().zip(LEG_PHASE) {
        *leg = (anim.walk_cycle + phase).sin() * LEG_SWING * gait;
    }

    let head_pitch = if anim.is_meowing {
        0.35
    } else {
        match state.activity() {
            Activity::Eating => -0.6,
            Activity::KnockingProp => -0.25,
            Activity::SearchingFood | Activity::HeardFood => 0.15,
            Activity::ChasingPlayer | Activity::AttackingPlayer => -0.1,
            _ => 0.0,
        }
    };

    // Lashing tail when angry, lazy sway otherwise.
    let tail_amplitude = 0.2 + (anger / 100.0).min(0.6);

    Pose {
        body_bob: (anim.walk_cycle * 2.0).sin().abs() * BOB_HEIGHT * gait,
        head_pitch,
        tail_angle: anim.tail_wag.sin() * tail_amplitude,
        legs,
    }
}
