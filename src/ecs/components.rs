use glam::Vec3;

use crate::cat::AgentId;
use crate::spatial::Aabb;

/// World position of a scene object (floor level, metres).
#[derive(Debug, Clone, Copy)]
pub struct Position(pub Vec3);

// ---------------------------------------------------------------------------
// Food and bowls
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FoodKind {
    Kibble,
    Tuna,
    Chicken,
    Salmon,
}

impl FoodKind {
    pub const ALL: [FoodKind; 4] = [
        FoodKind::Kibble,
        FoodKind::Tuna,
        FoodKind::Chicken,
        FoodKind::Salmon,
    ];

    pub fn label(self) -> &'static str {
        match self {
            FoodKind::Kibble => "kibble",
            FoodKind::Tuna => "tuna",
            FoodKind::Chicken => "chicken",
            FoodKind::Salmon => "salmon",
        }
    }

    /// Hunger removed by eating one full bowl.
    pub fn nutrition(self) -> f32 {
        match self {
            FoodKind::Kibble => 70.0,
            FoodKind::Tuna => 90.0,
            FoodKind::Chicken => 85.0,
            FoodKind::Salmon => 100.0,
        }
    }
}

/// A serving of food sitting in a bowl.
#[derive(Debug, Clone, Copy)]
pub struct Food {
    pub kind: FoodKind,
    /// Remaining fill in `[0, 1]`.
    pub fill: f32,
}

impl Food {
    pub fn full(kind: FoodKind) -> Self {
        Self { kind, fill: 1.0 }
    }

    /// Eat up to `fraction` of a full bowl. Returns the nutrition gained.
    pub fn consume(&mut self, fraction: f32) -> f32 {
        let eaten = fraction.clamp(0.0, 1.0).min(self.fill);
        self.fill = (self.fill - eaten).max(0.0);
        eaten * self.kind.nutrition()
    }

    pub fn is_empty(&self) -> bool {
        self.fill <= f32::EPSILON
    }
}

/// Food bowl. Cats register so they can hear it being filled.
#[derive(Debug, Clone, Default)]
pub struct Bowl {
    pub current_food: Option<Food>,
    cats: Vec<AgentId>,
}

impl Bowl {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn has_food(&self) -> bool {
        self.current_food.is_some_and(|f| !f.is_empty())
    }

    pub fn can_accept_food(&self) -> bool {
        !self.has_food()
    }

    /// Fill the bowl. Refused while there is still food in it.
    pub fn add_food(&mut self, food: Food) -> bool {
        if !self.can_accept_food() {
            return false;
        }
        self.current_food = Some(Food {
            fill: food.fill.clamp(0.0, 1.0),
            ..food
        });
        true
    }

    /// Eat from the bowl. An emptied serving is cleared out.
    pub fn consume(&mut self, fraction: f32) -> Option<(FoodKind, f32)> {
        let food = self.current_food.as_mut()?;
        let kind = food.kind;
        let nutrition = food.consume(fraction);
        if food.is_empty() {
            self.current_food = None;
        }
        Some((kind, nutrition))
    }

    pub fn fill(&self) -> f32 {
        self.current_food.map_or(0.0, |f| f.fill)
    }

    pub fn register_cat(&mut self, cat: AgentId) {
        if !self.cats.contains(&cat) {
            self.cats.push(cat);
        }
    }

    pub fn unregister_cat(&mut self, cat: AgentId) {
        self.cats.retain(|&c| c != cat);
    }

    pub fn cats(&self) -> &[AgentId] {
        &self.cats
    }
}

// ---------------------------------------------------------------------------
// Props, furniture, player
// ---------------------------------------------------------------------------

/// Something the cat can knock over (flower pots, mugs).
#[derive(Debug, Clone)]
pub struct Prop {
    pub name: String,
    pub is_knocked_over: bool,
}

impl Prop {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            is_knocked_over: false,
        }
    }

    /// Returns false if it was already on the floor.
    pub fn knock_over(&mut self) -> bool {
        let was_standing = !self.is_knocked_over;
        self.is_knocked_over = true;
        was_standing
    }

    pub fn reset(&mut self) {
        self.is_knocked_over = false;
    }
}

/// Name prefixes of geometry the cat cannot walk through.
pub const COLLIDABLE_PREFIXES: [&str; 5] = ["table", "chair", "shelf", "wall", "bed"];

/// Static geometry with a name tag, e.g. `"table_kitchen"` or `"wall_shared"`.
/// Walls may carry holes (door openings) the cat walks through.
#[derive(Debug, Clone)]
pub struct Collider {
    pub name: String,
    pub bounds: Aabb,
    pub holes: Vec<Aabb>,
}

impl Collider {
    pub fn new(name: impl Into<String>, bounds: Aabb) -> Self {
        Self {
            name: name.into(),
            bounds,
            holes: Vec::new(),
        }
    }

    pub fn with_hole(mut self, hole: Aabb) -> Self {
        self.holes.push(hole);
        self
    }

    pub fn is_collidable(&self) -> bool {
        let name = self.name.to_ascii_lowercase();
        COLLIDABLE_PREFIXES.iter().any(|p| name.starts_with(p))
    }

    pub fn in_hole(&self, point: Vec3) -> bool {
        self.holes.iter().any(|h| h.contains(point))
    }
}

pub const MAX_PLAYER_HEALTH: f32 = 100.0;

#[derive(Debug, Clone, Copy)]
pub struct Player {
    pub health: f32,
}

impl Player {
    pub fn new() -> Self {
        Self {
            health: MAX_PLAYER_HEALTH,
        }
    }

    /// Apply a health delta, clamped to `[0, MAX_PLAYER_HEALTH]`. Returns the new health.
    pub fn change_health(&mut self, delta: f32) -> f32 {
        self.health = (self.health + delta).clamp(0.0, MAX_PLAYER_HEALTH);
        self.health
    }
}

impl Default for Player {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bowl_refuses_refill_while_food_remains() {
        let mut bowl = Bowl::new();
        assert!(bowl.add_food(Food::full(FoodKind::Tuna)));
        assert!(!bowl.can_accept_food());
        assert!(!bowl.add_food(Food::full(FoodKind::Kibble)));
        assert_eq!(bowl.current_food.map(|f| f.kind), Some(FoodKind::Tuna));
    }

    #[test]
    fn bowl_empties_after_consuming_everything() {
        let mut bowl = Bowl::new();
        bowl.add_food(Food::full(FoodKind::Kibble));
        let (kind, nutrition) = bowl.consume(0.6).unwrap();
        assert_eq!(kind, FoodKind::Kibble);
        assert!((nutrition - 42.0).abs() < 1e-4);
        let (_, rest) = bowl.consume(0.6).unwrap();
        assert!((rest - 28.0).abs() < 1e-4);
        assert!(!bowl.has_food());
        assert!(bowl.consume(0.1).is_none());
        assert!(bowl.can_accept_food());
    }

    #[test]
    fn registration_is_deduplicated() {
        let mut bowl = Bowl::new();
        bowl.register_cat(AgentId(1));
        bowl.register_cat(AgentId(1));
        bowl.register_cat(AgentId(2));
        assert_eq!(bowl.cats(), &[AgentId(1), AgentId(2)]);
        bowl.unregister_cat(AgentId(1));
        assert_eq!(bowl.cats(), &[AgentId(2)]);
    }

    #[test]
    fn prop_knock_over_and_reset() {
        let mut prop = Prop::new("flower_sill");
        assert!(prop.knock_over());
        assert!(!prop.knock_over());
        prop.reset();
        assert!(!prop.is_knocked_over);
    }

    #[test]
    fn collidable_by_name_prefix() {
        let b = Aabb::new(Vec3::ZERO, Vec3::ONE);
        assert!(Collider::new("Table_kitchen", b).is_collidable());
        assert!(Collider::new("wall_shared", b).is_collidable());
        assert!(!Collider::new("rug", b).is_collidable());
    }

    #[test]
    fn player_health_clamps() {
        let mut p = Player::new();
        assert_eq!(p.change_health(25.0), MAX_PLAYER_HEALTH);
        assert_eq!(p.change_health(-150.0), 0.0);
    }
}
