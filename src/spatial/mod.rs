pub mod rooms;

use glam::Vec3;

use crate::ecs::components::{Bowl, Collider, Player, Position, Prop};

/// Axis-aligned box in world space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb {
    pub min: Vec3,
    pub max: Vec3,
}

impl Aabb {
    pub fn new(a: Vec3, b: Vec3) -> Self {
        Self {
            min: a.min(b),
            max: a.max(b),
        }
    }

    /// Box resting on the floor, centred on `center` in x/z.
    pub fn on_floor(center: Vec3, size: Vec3) -> Self {
        let half = Vec3::new(size.x * 0.5, 0.0, size.z * 0.5);
        Self::new(
            Vec3::new(center.x, 0.0, center.z) - half,
            Vec3::new(center.x, size.y, center.z) + half,
        )
    }

    pub fn contains(&self, p: Vec3) -> bool {
        p.cmpge(self.min).all() && p.cmple(self.max).all()
    }

    /// Slab test. Returns the entry distance along `dir` (unit length), or
    /// `Some(0.0)` when the origin is already inside.
    pub fn ray_hit(&self, origin: Vec3, dir: Vec3, max_dist: f32) -> Option<f32> {
        let mut t_min = 0.0f32;
        let mut t_max = max_dist;
        for axis in 0..3 {
            let o = origin[axis];
            let d = dir[axis];
            let (lo, hi) = (self.min[axis], self.max[axis]);
            if d.abs() < 1e-8 {
                if o < lo || o > hi {
                    return None;
                }
                continue;
            }
            let inv = 1.0 / d;
            let mut t0 = (lo - o) * inv;
            let mut t1 = (hi - o) * inv;
            if t0 > t1 {
                std::mem::swap(&mut t0, &mut t1);
            }
            t_min = t_min.max(t0);
            t_max = t_max.min(t1);
            if t_min > t_max {
                return None;
            }
        }
        Some(t_min)
    }
}

/// Nearest ray intersection against collidable geometry.
#[derive(Debug, Clone, Copy)]
pub struct RayHit {
    pub entity: hecs::Entity,
    pub distance: f32,
    pub point: Vec3,
}

/// A scene object found by a spatial query.
#[derive(Debug, Clone, Copy)]
pub struct Found {
    pub entity: hecs::Entity,
    pub position: Vec3,
    pub distance: f32,
}

/// Horizontal (x/z) distance; heights are ignored for reach checks.
pub fn flat_distance(a: Vec3, b: Vec3) -> f32 {
    let d = b - a;
    (d.x * d.x + d.z * d.z).sqrt()
}

/// Everything the cat can see or touch: bowls, props, furniture, the player.
///
/// Behavior code queries through this service rather than walking scene
/// storage directly.
pub struct Scene {
    world: hecs::World,
    player: Option<hecs::Entity>,
}

impl Scene {
    pub fn new() -> Self {
        Self {
            world: hecs::World::new(),
            player: None,
        }
    }

    pub fn spawn_bowl(&mut self, pos: Vec3) -> hecs::Entity {
        self.world.spawn((Position(pos), Bowl::new()))
    }

    pub fn spawn_prop(&mut self, name: &str, pos: Vec3) -> hecs::Entity {
        self.world.spawn((Position(pos), Prop::new(name)))
    }

    pub fn spawn_collider(&mut self, collider: Collider) -> hecs::Entity {
        let center = (collider.bounds.min + collider.bounds.max) * 0.5;
        self.world.spawn((Position(center), collider))
    }

    /// Place the player. Replaces any previous player.
    pub fn spawn_player(&mut self, pos: Vec3) -> hecs::Entity {
        if let Some(old) = self.player.take() {
            let _ = self.world.despawn(old);
        }
        let e = self.world.spawn((Position(pos), Player::new()));
        self.player = Some(e);
        e
    }

    pub fn despawn(&mut self, entity: hecs::Entity) -> bool {
        if self.player == Some(entity) {
            self.player = None;
        }
        self.world.despawn(entity).is_ok()
    }

    pub fn position(&self, entity: hecs::Entity) -> Option<Vec3> {
        self.world.get::<&Position>(entity).ok().map(|p| p.0)
    }

    pub fn set_position(&mut self, entity: hecs::Entity, pos: Vec3) -> bool {
        match self.world.get::<&mut Position>(entity) {
            Ok(mut p) => {
                p.0 = pos;
                true
            }
            Err(_) => false,
        }
    }

    // -----------------------------------------------------------------------
    // Generic queries
    // -----------------------------------------------------------------------

    /// Every entity carrying `C` that passes `pred`.
    pub fn find_all<C: hecs::Component>(&self, pred: impl Fn(&C) -> bool) -> Vec<Found> {
        self.world
            .query::<(&Position, &C)>()
            .iter()
            .filter_map(|(entity, (pos, c))| {
                pred(c).then(|| Found {
                    entity,
                    position: pos.0,
                    distance: 0.0,
                })
            })
            .collect()
    }

    /// Closest entity carrying `C` that passes `pred`, by horizontal distance.
    pub fn find_nearest<C: hecs::Component>(
        &self,
        point: Vec3,
        pred: impl Fn(&C) -> bool,
    ) -> Option<Found> {
        let mut best: Option<Found> = None;
        for (entity, (pos, c)) in self.world.query::<(&Position, &C)>().iter() {
            if !pred(c) {
                continue;
            }
            let distance = flat_distance(point, pos.0);
            if best.map_or(true, |b| distance < b.distance) {
                best = Some(Found {
                    entity,
                    position: pos.0,
                    distance,
                });
            }
        }
        best
    }

    // -----------------------------------------------------------------------
    // Bowls
    // -----------------------------------------------------------------------

    pub fn bowl(&self, entity: hecs::Entity) -> Option<hecs::Ref<'_, Bowl>> {
        self.world.get::<&Bowl>(entity).ok()
    }

    pub fn bowl_mut(&self, entity: hecs::Entity) -> Option<hecs::RefMut<'_, Bowl>> {
        self.world.get::<&mut Bowl>(entity).ok()
    }

    pub fn bowl_has_food(&self, entity: hecs::Entity) -> bool {
        self.bowl(entity).is_some_and(|b| b.has_food())
    }

    pub fn any_bowl_has_food(&self) -> bool {
        self.world.query::<&Bowl>().iter().any(|(_, b)| b.has_food())
    }

    pub fn nearest_bowl_with_food(&self, point: Vec3, range: f32) -> Option<Found> {
        self.find_nearest::<Bowl>(point, Bowl::has_food)
            .filter(|f| f.distance <= range)
    }

    pub fn bowls(&self) -> Vec<hecs::Entity> {
        self.world.query::<&Bowl>().iter().map(|(e, _)| e).collect()
    }

    // -----------------------------------------------------------------------
    // Props
    // -----------------------------------------------------------------------

    pub fn prop(&self, entity: hecs::Entity) -> Option<hecs::Ref<'_, Prop>> {
        self.world.get::<&Prop>(entity).ok()
    }

    pub fn prop_mut(&self, entity: hecs::Entity) -> Option<hecs::RefMut<'_, Prop>> {
        self.world.get::<&mut Prop>(entity).ok()
    }

    /// Vacuously true when the scene has no props.
    pub fn all_props_knocked_over(&self) -> bool {
        self.world
            .query::<&Prop>()
            .iter()
            .all(|(_, p)| p.is_knocked_over)
    }

    /// Stand every knocked-over prop back up. Returns how many were reset.
    pub fn reset_props(&mut self) -> usize {
        let mut count = 0;
        for (_, prop) in self.world.query_mut::<&mut Prop>() {
            if prop.is_knocked_over {
                prop.reset();
                count += 1;
            }
        }
        count
    }

    // -----------------------------------------------------------------------
    // Player
    // -----------------------------------------------------------------------

    pub fn player(&self) -> Option<hecs::Entity> {
        self.player
    }

    pub fn player_position(&self) -> Option<Vec3> {
        self.position(self.player?)
    }

    pub fn player_health(&self) -> Option<f32> {
        let e = self.player?;
        self.world.get::<&Player>(e).ok().map(|p| p.health)
    }

    /// Returns the player's new health, or None with no player present.
    pub fn change_player_health(&mut self, delta: f32) -> Option<f32> {
        let e = self.player?;
        let mut player = self.world.get::<&mut Player>(e).ok()?;
        Some(player.change_health(delta))
    }

    // -----------------------------------------------------------------------
    // Collision
    // -----------------------------------------------------------------------

    /// Nearest hit within `max_dist` against collidable geometry. Hits that
    /// land inside a wall opening do not count.
    pub fn raycast(&self, origin: Vec3, dir: Vec3, max_dist: f32) -> Option<RayHit> {
        let dir = dir.try_normalize()?;
        let mut best: Option<RayHit> = None;
        for (entity, collider) in self.world.query::<&Collider>().iter() {
            if !collider.is_collidable() {
                continue;
            }
            let Some(distance) = collider.bounds.ray_hit(origin, dir, max_dist) else {
                continue;
            };
            let point = origin + dir * distance;
            if collider.in_hole(point) {
                continue;
            }
            if best.map_or(true, |b| distance < b.distance) {
                best = Some(RayHit {
                    entity,
                    distance,
                    point,
                });
            }
        }
        best
    }
}

impl Default for Scene {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ecs::components::{Food, FoodKind};

    #[test]
    fn ray_hits_box_front_face() {
        let b = Aabb::new(Vec3::new(1.0, 0.0, -1.0), Vec3::new(2.0, 1.0, 1.0));
        let t = b.ray_hit(Vec3::new(0.0, 0.5, 0.0), Vec3::X, 10.0).unwrap();
        assert!((t - 1.0).abs() < 1e-5);
        assert!(b.ray_hit(Vec3::new(0.0, 0.5, 0.0), -Vec3::X, 10.0).is_none());
        assert!(b.ray_hit(Vec3::new(0.0, 0.5, 0.0), Vec3::X, 0.5).is_none());
    }

    #[test]
    fn ray_from_inside_reports_zero() {
        let b = Aabb::new(Vec3::splat(-1.0), Vec3::splat(1.0));
        assert_eq!(b.ray_hit(Vec3::ZERO, Vec3::Z, 5.0), Some(0.0));
    }

    #[test]
    fn raycast_ignores_non_collidable_and_holes() {
        let mut scene = Scene::new();
        scene.spawn_collider(Collider::new(
            "rug",
            Aabb::new(Vec3::new(0.5, 0.0, -1.0), Vec3::new(0.6, 1.0, 1.0)),
        ));
        let wall = Collider::new(
            "wall_shared",
            Aabb::new(Vec3::new(1.0, 0.0, -5.0), Vec3::new(1.1, 2.5, 5.0)),
        )
        .with_hole(Aabb::new(Vec3::new(0.9, 0.0, -0.5), Vec3::new(1.2, 2.0, 0.5)));
        scene.spawn_collider(wall);

        let origin = Vec3::new(0.0, 0.15, 0.0);
        assert!(scene.raycast(origin, Vec3::X, 5.0).is_none());

        let beside_door = Vec3::new(0.0, 0.15, 2.0);
        let hit = scene.raycast(beside_door, Vec3::X, 5.0).unwrap();
        assert!((hit.distance - 1.0).abs() < 1e-5);
    }

    #[test]
    fn nearest_bowl_with_food_respects_range() {
        let mut scene = Scene::new();
        let near = scene.spawn_bowl(Vec3::new(1.0, 0.0, 0.0));
        let far = scene.spawn_bowl(Vec3::new(8.0, 0.0, 0.0));
        scene.bowl_mut(far).unwrap().add_food(Food::full(FoodKind::Tuna));

        assert!(scene.nearest_bowl_with_food(Vec3::ZERO, 5.0).is_none());
        let found = scene.nearest_bowl_with_food(Vec3::ZERO, 10.0).unwrap();
        assert_eq!(found.entity, far);

        scene.bowl_mut(near).unwrap().add_food(Food::full(FoodKind::Kibble));
        assert_eq!(scene.nearest_bowl_with_food(Vec3::ZERO, 10.0).unwrap().entity, near);
        assert!(scene.any_bowl_has_food());
    }

    #[test]
    fn props_knocked_and_reset() {
        let mut scene = Scene::new();
        assert!(scene.all_props_knocked_over());
        let a = scene.spawn_prop("flower_a", Vec3::X);
        scene.spawn_prop("flower_b", Vec3::Z);
        assert!(!scene.all_props_knocked_over());
        scene.prop_mut(a).unwrap().knock_over();
        assert_eq!(scene.find_all::<Prop>(|p| !p.is_knocked_over).len(), 1);
        assert_eq!(scene.reset_props(), 1);
    }

    #[test]
    fn player_damage_without_player_is_none() {
        let mut scene = Scene::new();
        assert!(scene.change_player_health(-5.0).is_none());
        scene.spawn_player(Vec3::ZERO);
        assert_eq!(scene.change_player_health(-5.0), Some(95.0));
    }
}
