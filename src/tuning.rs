/// Every rate, radius and threshold the cat's behavior and steering read.
///
/// Units: world units (metres), seconds, radians. Hunger lives in `[0, 100]`.
#[derive(Debug, Clone)]
pub struct Tuning {
    // --- Needs ---
    /// Hunger gained per second while not eating.
    pub hunger_rate: f32,
    /// Above this the cat goes looking for food and anger starts to build.
    pub hungry_threshold: f32,
    /// Time spent above this feeds `angry_duration`.
    pub very_hungry_threshold: f32,
    /// Anger at which the UI shows the cat as annoyed; gate for attack mode.
    pub annoyed_anger: f32,
    /// Minimum hunger before a food sound pulls the cat over.
    pub curious_hunger: f32,
    /// Seconds between food-preference demands while no bowl has food.
    pub preference_cooldown: f32,

    // --- Mischief ---
    /// Seconds above the very-hungry line before mischief rolls start.
    pub mischief_delay: f32,
    /// Base per-frame mischief chance once the delay has passed.
    pub mischief_base_chance: f32,
    /// Added to the chance per second of accumulated anger time.
    pub mischief_chance_growth: f32,
    pub mischief_max_chance: f32,
    /// How close the cat gets to a prop before swatting it.
    pub knock_distance: f32,
    /// Pause next to the prop before it goes over.
    pub knock_pause: f32,

    // --- Attack ---
    pub attack_range: f32,
    /// Player health lost per second while in range.
    pub attack_damage_rate: f32,

    // --- Wandering and food ---
    /// Per-frame chance an idle cat picks a new wander point.
    pub wander_chance: f32,
    /// Keep wander points this far from room edges.
    pub wander_margin: f32,
    pub food_detection_range: f32,
    pub reach_radius: f32,
    /// Seconds between "am I at the bowl?" checks.
    pub bowl_check_interval: f32,
    /// Length of one eating session.
    pub eat_session: f32,
    /// Bites taken per session.
    pub bites_per_session: u32,
    /// Seconds to empty a full bowl.
    pub bowl_empty_time: f32,
    /// Gap kept between the cat and the bowl while eating.
    pub eat_distance: f32,
    pub meow_interval: f32,
    pub meow_duration: f32,

    // --- Steering ---
    pub max_speed: f32,
    pub acceleration: f32,
    pub deceleration: f32,
    /// Radians per second.
    pub rotation_speed: f32,
    /// Heading error above which the cat turns instead of accelerating.
    pub turn_threshold: f32,
    /// Heading error above which the cat turns in place without moving.
    pub turn_in_place_gate: f32,
    pub snap_distance: f32,
    pub snap_angle: f32,
    pub arrival_distance: f32,
    pub min_speed: f32,

    // --- Collision ---
    pub ray_count: u32,
    pub collision_radius: f32,
    /// Ray height above the floor.
    pub ray_height: f32,
    /// Consecutive blocked frames before a detour is inserted.
    pub block_threshold: u32,
    /// Max offset of a detour point from the blocked target.
    pub detour_spread: f32,
}

impl Default for Tuning {
    fn default() -> Self {
        Self {
            hunger_rate: 1.0,
            hungry_threshold: 60.0,
            very_hungry_threshold: 80.0,
            annoyed_anger: 40.0,
            curious_hunger: 30.0,
            preference_cooldown: 10.0,

            mischief_delay: 2.0,
            mischief_base_chance: 0.1,
            mischief_chance_growth: 0.2,
            mischief_max_chance: 0.95,
            knock_distance: 0.3,
            knock_pause: 1.0,

            attack_range: 0.5,
            attack_damage_rate: 6.0,

            wander_chance: 0.01,
            wander_margin: 0.6,
            food_detection_range: 12.0,
            reach_radius: 0.6,
            bowl_check_interval: 1.0,
            eat_session: 1.0,
            bites_per_session: 4,
            bowl_empty_time: 10.0,
            eat_distance: 0.35,
            meow_interval: 5.0,
            meow_duration: 2.0,

            max_speed: 1.2,
            acceleration: 2.5,
            deceleration: 4.0,
            rotation_speed: 4.0,
            turn_threshold: 0.1,
            turn_in_place_gate: 0.3,
            snap_distance: 2.0,
            snap_angle: 0.2,
            arrival_distance: 0.15,
            min_speed: 0.05,

            ray_count: 8,
            collision_radius: 0.25,
            ray_height: 0.15,
            block_threshold: 20,
            detour_spread: 1.0,
        }
    }
}

impl Tuning {
    /// Bowl fill drained by one bite.
    pub fn bite_fraction(&self) -> f32 {
        let per_second = 1.0 / self.bowl_empty_time.max(f32::EPSILON);
        per_second * self.eat_session / self.bites_per_session.max(1) as f32
    }

    /// Per-frame mischief chance after `angry_duration` seconds of simmering.
    pub fn mischief_chance(&self, angry_duration: f32) -> f32 {
        (self.mischief_base_chance + self.mischief_chance_growth * angry_duration)
            .min(self.mischief_max_chance)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ten_sessions_empty_a_full_bowl() {
        let t = Tuning::default();
        let per_session = t.bite_fraction() * t.bites_per_session as f32;
        assert!((per_session * 10.0 - 1.0).abs() < 1e-5);
    }

    #[test]
    fn mischief_chance_caps() {
        let t = Tuning::default();
        assert!((t.mischief_chance(0.0) - 0.1).abs() < 1e-6);
        assert!((t.mischief_chance(2.5) - 0.6).abs() < 1e-6);
        assert_eq!(t.mischief_chance(100.0), 0.95);
    }
}
