use std::collections::VecDeque;
use std::f32::consts::{PI, TAU};

use glam::Vec3;

use crate::cat::Cat;
use crate::spatial::rooms::{RoomGraph, RoomId};
use crate::spatial::Scene;
use crate::tuning::Tuning;

/// Two targets closer than this are the same target.
const SAME_TARGET_EPSILON: f32 = 1e-3;
/// Random detour candidates tried before giving up until the next threshold.
const DETOUR_TRIES: u32 = 32;
/// Look-ahead for the first stride towards a detour candidate.
const DETOUR_FIRST_STRIDE: f32 = 0.05;

/// Per-cat steering bookkeeping carried between frames.
#[derive(Debug, Clone, Default)]
pub struct Steering {
    waypoints: VecDeque<Vec3>,
    blocked_frames: u32,
    /// The queue head is a detour we inserted, not part of the route.
    detour_at_head: bool,
}

impl Steering {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn waypoints(&self) -> &VecDeque<Vec3> {
        &self.waypoints
    }

    pub fn blocked_frames(&self) -> u32 {
        self.blocked_frames
    }

    pub fn detouring(&self) -> bool {
        self.detour_at_head
    }

    pub fn clear(&mut self) {
        self.waypoints.clear();
        self.blocked_frames = 0;
        self.detour_at_head = false;
    }
}

/// Wrap an angle into `[-PI, PI]`.
pub fn wrap_angle(a: f32) -> f32 {
    let wrapped = (a + PI).rem_euclid(TAU) - PI;
    if wrapped < -PI {
        wrapped + TAU
    } else {
        wrapped
    }
}

/// Yaw that faces from `from` towards `to` on the floor plane.
pub fn heading(from: Vec3, to: Vec3) -> f32 {
    let d = to - from;
    d.x.atan2(d.z)
}

/// Stop dead and forget the route. Keeps facing.
pub fn stop(cat: &mut Cat) {
    cat.steering.clear();
    cat.state.update_movement(|m| {
        m.target_position = None;
        m.destination = None;
        m.current_speed = 0.0;
        m.is_rotating = false;
    });
}

/// Steer `cat` one frame towards `target`.
///
/// Routes through the door when the target is in another room, turns before
/// walking, casts a ray fan around the next position and inserts a detour
/// after repeated blocking. A detour that stays blocked is swapped for a new
/// one. Returns true once the final target is reached and the cat has braked
/// below `min_speed`.
pub fn move_towards(
    cat: &mut Cat,
    target: Vec3,
    scene: &Scene,
    rooms: &RoomGraph,
    tuning: &Tuning,
    dt: f32,
) -> bool {
    let stale = cat
        .steering
        .waypoints
        .back()
        .map_or(true, |tail| tail.distance(target) > SAME_TARGET_EPSILON);
    if stale {
        rebuild_route(cat, target, rooms);
    }

    let Some(head) = cat.steering.waypoints.front().copied() else {
        return false;
    };

    let mut to_head = head - cat.position;
    to_head.y = 0.0;
    let dist = to_head.length();

    if dist < tuning.arrival_distance {
        return arrive(cat, tuning, dt);
    }

    // --- Turn ---
    let movement = *cat.state.movement();
    let target_angle = to_head.x.atan2(to_head.z);
    let error = wrap_angle(target_angle - movement.facing_angle);
    let mut facing = movement.facing_angle;
    let mut speed = movement.current_speed;
    let rotating = error.abs() > tuning.turn_threshold;

    if rotating {
        if dist < tuning.snap_distance && error.abs() < tuning.snap_angle {
            facing = target_angle;
        } else {
            facing += error.signum() * (tuning.rotation_speed * dt).min(error.abs());
        }
        speed = (speed - tuning.deceleration * dt).max(0.0);
    } else {
        speed = (speed + tuning.acceleration * dt).min(tuning.max_speed);
    }
    let facing = wrap_angle(facing);

    cat.state.update_movement(|m| {
        m.target_angle = target_angle;
        m.facing_angle = facing;
        m.current_speed = speed;
        m.is_rotating = rotating;
    });

    // Turn in place until roughly lined up. Gated on this frame's error.
    if error.abs() > tuning.turn_in_place_gate || speed <= 0.0 {
        return false;
    }

    // --- Translate ---
    let step = (speed * dt).min(dist);
    let next = cat.position + cat.forward() * step;

    if is_blocked(next, scene, tuning) {
        cat.steering.blocked_frames += 1;
        if cat.steering.blocked_frames >= tuning.block_threshold {
            cat.steering.blocked_frames = 0;
            // At most one detour queued at a time; a stuck one is swapped.
            let mut near = head;
            if cat.steering.detour_at_head {
                cat.steering.waypoints.pop_front();
                cat.steering.detour_at_head = false;
                near = cat.steering.waypoints.front().copied().unwrap_or(head);
            }
            insert_detour(cat, near, scene, rooms, tuning);
        }
    } else {
        cat.position = next;
        cat.steering.blocked_frames = 0;
    }
    false
}

fn rebuild_route(cat: &mut Cat, target: Vec3, rooms: &RoomGraph) {
    let route = rooms.route(cat.position, target);
    if route.len() > 1 {
        log::debug!(
            "cat {} routing via door at ({:.2}, {:.2})",
            cat.id.0,
            route[0].x,
            route[0].z
        );
    }
    cat.steering.waypoints = route.into();
    cat.steering.blocked_frames = 0;
    cat.steering.detour_at_head = false;
    sync_head(cat);
    cat.state.update_movement(|m| m.destination = Some(target));
}

fn sync_head(cat: &mut Cat) {
    let head = cat.steering.waypoints.front().copied();
    cat.state.update_movement(|m| m.target_position = head);
}

/// Within arrival distance of the current waypoint.
fn arrive(cat: &mut Cat, tuning: &Tuning, dt: f32) -> bool {
    if cat.steering.waypoints.len() > 1 {
        cat.steering.waypoints.pop_front();
        cat.steering.blocked_frames = 0;
        cat.steering.detour_at_head = false;
        sync_head(cat);
        return false;
    }

    // Final target: brake, report arrival only once nearly stopped.
    let speed = (cat.state.movement().current_speed - tuning.deceleration * dt).max(0.0);
    if speed >= tuning.min_speed {
        cat.state.update_movement(|m| {
            m.current_speed = speed;
            m.is_rotating = false;
        });
        return false;
    }
    stop(cat);
    true
}

/// Cast `ray_count` horizontal rays out of `at`; any hit inside the
/// collision radius blocks the move.
pub fn is_blocked(at: Vec3, scene: &Scene, tuning: &Tuning) -> bool {
    let origin = Vec3::new(at.x, at.y + tuning.ray_height, at.z);
    let rays = tuning.ray_count.max(1);
    (0..rays).any(|i| {
        let angle = i as f32 * TAU / rays as f32;
        let dir = Vec3::new(angle.sin(), 0.0, angle.cos());
        match scene.raycast(origin, dir, tuning.collision_radius) {
            Some(hit) => {
                log::trace!("ray hit {:?} at {:.2}", hit.entity, hit.distance);
                true
            }
            None => false,
        }
    })
}

/// Queue a random detour in front of the route. Candidates alternate between
/// the area around `near` and the area around the cat; one is taken only if
/// it lies in the cat's room, is clear of furniture and the first stride
/// towards it is open. Returns false when every candidate was rejected.
fn insert_detour(
    cat: &mut Cat,
    near: Vec3,
    scene: &Scene,
    rooms: &RoomGraph,
    tuning: &Tuning,
) -> bool {
    let home = rooms.locate(cat.position);
    let spread = tuning.detour_spread;
    for attempt in 0..DETOUR_TRIES {
        let anchor = if attempt % 2 == 0 { near } else { cat.position };
        let offset = Vec3::new(
            (cat.rng.f32() * 2.0 - 1.0) * spread,
            0.0,
            (cat.rng.f32() * 2.0 - 1.0) * spread,
        );
        let detour = anchor + offset;
        if !detour_is_open(cat.position, detour, home, scene, rooms, tuning) {
            continue;
        }
        log::warn!(
            "cat {} stuck near ({:.2}, {:.2}), detouring via ({:.2}, {:.2})",
            cat.id.0,
            cat.position.x,
            cat.position.z,
            detour.x,
            detour.z
        );
        cat.steering.waypoints.push_front(detour);
        cat.steering.detour_at_head = true;
        sync_head(cat);
        return true;
    }
    log::warn!(
        "cat {} stuck near ({:.2}, {:.2}) with no open detour",
        cat.id.0,
        cat.position.x,
        cat.position.z
    );
    sync_head(cat);
    false
}

fn detour_is_open(
    from: Vec3,
    detour: Vec3,
    home: Option<RoomId>,
    scene: &Scene,
    rooms: &RoomGraph,
    tuning: &Tuning,
) -> bool {
    let Some(room) = rooms.locate(detour) else {
        return false;
    };
    if home.is_some_and(|h| h != room) {
        return false;
    }
    let mut dir = detour - from;
    dir.y = 0.0;
    if dir.length() <= tuning.collision_radius {
        return false;
    }
    let dir = dir.normalize();
    !is_blocked(detour, scene, tuning)
        && [DETOUR_FIRST_STRIDE, tuning.collision_radius]
            .iter()
            .all(|&reach| !is_blocked(from + dir * reach, scene, tuning))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cat::AgentId;
    use crate::ecs::components::Collider;
    use crate::events::EventBus;
    use crate::spatial::Aabb;
    use glam::Vec2;
    use std::rc::Rc;

    fn flat() -> RoomGraph {
        RoomGraph::split_on_x(0.0, Vec2::new(-5.0, -4.0), Vec2::new(5.0, 4.0), Vec3::ZERO)
    }

    fn cat_at(pos: Vec3) -> Cat {
        Cat::new(AgentId(0), "Miso", pos, Rc::new(EventBus::new()), 42)
    }

    fn facing(cat: &mut Cat, target: Vec3) {
        let a = heading(cat.position, target);
        cat.state.update_movement(|m| m.facing_angle = a);
    }

    #[test]
    fn wrap_angle_range() {
        for a in [-10.0f32, -PI, 0.0, 3.5, 7.0, 100.0] {
            let w = wrap_angle(a);
            assert!((-PI..=PI).contains(&w), "{a} -> {w}");
            assert!(((a - w) / TAU - ((a - w) / TAU).round()).abs() < 1e-3);
        }
    }

    #[test]
    fn cross_room_target_queues_door_first() {
        let (scene, rooms, tuning) = (Scene::new(), flat(), Tuning::default());
        let mut cat = cat_at(Vec3::new(-3.0, 0.0, 1.0));
        let target = Vec3::new(3.0, 0.0, -1.0);
        move_towards(&mut cat, target, &scene, &rooms, &tuning, 0.016);
        let queue: Vec<Vec3> = cat.steering.waypoints().iter().copied().collect();
        assert_eq!(queue, vec![Vec3::ZERO, target]);
        assert_eq!(cat.state.movement().target_position, Some(Vec3::ZERO));
        assert_eq!(cat.state.movement().destination, Some(target));
    }

    #[test]
    fn same_room_target_is_direct() {
        let (scene, rooms, tuning) = (Scene::new(), flat(), Tuning::default());
        let mut cat = cat_at(Vec3::new(1.0, 0.0, 1.0));
        let target = Vec3::new(3.0, 0.0, -1.0);
        move_towards(&mut cat, target, &scene, &rooms, &tuning, 0.016);
        let queue: Vec<Vec3> = cat.steering.waypoints().iter().copied().collect();
        assert_eq!(queue, vec![target]);
    }

    #[test]
    fn large_heading_error_turns_in_place() {
        let (scene, rooms, tuning) = (Scene::new(), flat(), Tuning::default());
        let start = Vec3::new(1.0, 0.0, 0.0);
        let mut cat = cat_at(start);
        // Facing +z, target straight behind.
        move_towards(&mut cat, Vec3::new(1.0, 0.0, -3.0), &scene, &rooms, &tuning, 0.016);
        assert_eq!(cat.position, start);
        assert!(cat.state.movement().is_rotating);
        assert!(cat.state.movement().facing_angle.abs() > 0.0);
    }

    #[test]
    fn walks_to_target_and_reports_stopped() {
        let (scene, rooms, tuning) = (Scene::new(), flat(), Tuning::default());
        let mut cat = cat_at(Vec3::new(1.0, 0.0, 0.0));
        let target = Vec3::new(3.0, 0.0, 2.0);
        let mut reached = false;
        for _ in 0..2000 {
            reached = move_towards(&mut cat, target, &scene, &rooms, &tuning, 0.016);
            if reached {
                break;
            }
        }
        assert!(reached);
        assert!(cat.position.distance(target) < tuning.arrival_distance);
        assert!(cat.state.movement().current_speed < tuning.min_speed);
        assert!(cat.state.movement().target_position.is_none());
        assert!(cat.steering.waypoints().is_empty());
    }

    #[test]
    fn crosses_door_into_other_room() {
        let mut scene = Scene::new();
        let wall = Collider::new(
            "wall_shared",
            Aabb::new(Vec3::new(-0.05, 0.0, -4.0), Vec3::new(0.05, 2.5, 4.0)),
        )
        .with_hole(Aabb::new(Vec3::new(-0.1, 0.0, -0.7), Vec3::new(0.1, 2.0, 0.7)));
        scene.spawn_collider(wall);
        let (rooms, tuning) = (flat(), Tuning::default());
        let mut cat = cat_at(Vec3::new(-2.0, 0.0, 0.0));
        let target = Vec3::new(2.0, 0.0, 1.0);
        let mut reached = false;
        for _ in 0..3000 {
            if move_towards(&mut cat, target, &scene, &rooms, &tuning, 0.016) {
                reached = true;
                break;
            }
        }
        assert!(reached, "stuck at {:?}", cat.position);
        assert!(rooms.locate(cat.position) == rooms.locate(target));
    }

    #[test]
    fn never_reports_reached_while_fast() {
        let (scene, rooms, tuning) = (Scene::new(), flat(), Tuning::default());
        let mut cat = cat_at(Vec3::new(1.0, 0.0, 0.0));
        let target = Vec3::new(1.0, 0.0, 0.1);
        cat.state.update_movement(|m| m.current_speed = tuning.max_speed);
        assert!(!move_towards(&mut cat, target, &scene, &rooms, &tuning, 0.016));
        assert!(cat.state.movement().current_speed > tuning.min_speed);
    }

    fn shelf_scene() -> Scene {
        let mut scene = Scene::new();
        scene.spawn_collider(Collider::new(
            "shelf_books",
            Aabb::new(Vec3::new(1.0, 0.0, 0.9), Vec3::new(3.0, 1.5, 1.1)),
        ));
        scene
    }

    #[test]
    fn blocked_path_inserts_detour_after_threshold() {
        let scene = shelf_scene();
        let (rooms, tuning) = (flat(), Tuning::default());
        let start = Vec3::new(2.0, 0.0, 0.64);
        let mut cat = cat_at(start);
        let target = Vec3::new(2.0, 0.0, 3.0);
        facing(&mut cat, target);
        cat.state.update_movement(|m| m.current_speed = 1.0);

        for _ in 0..tuning.block_threshold - 1 {
            move_towards(&mut cat, target, &scene, &rooms, &tuning, 0.016);
        }
        assert_eq!(cat.steering.blocked_frames(), tuning.block_threshold - 1);
        assert_eq!(cat.steering.waypoints().len(), 1);

        move_towards(&mut cat, target, &scene, &rooms, &tuning, 0.016);
        assert_eq!(cat.steering.blocked_frames(), 0);
        assert_eq!(cat.steering.waypoints().len(), 2);
        assert!(cat.steering.detouring());
        assert_eq!(cat.steering.waypoints().back(), Some(&target));
        assert_eq!(cat.position, start);

        let detour = cat.steering.waypoints()[0];
        assert_eq!(cat.state.movement().target_position, Some(detour));
        assert!(!is_blocked(detour, &scene, &tuning));
        assert_eq!(rooms.locate(detour), rooms.locate(start));
    }

    #[test]
    fn unreachable_detour_is_replaced() {
        let scene = shelf_scene();
        let (rooms, tuning) = (flat(), Tuning::default());
        let start = Vec3::new(2.0, 0.0, 0.64);
        let mut cat = cat_at(start);
        let target = Vec3::new(2.0, 0.0, 3.0);
        move_towards(&mut cat, target, &scene, &rooms, &tuning, 0.016);

        // A detour on the far side of the shelf, straight through it.
        let hopeless = Vec3::new(2.0, 0.0, 1.6);
        cat.steering.waypoints.push_front(hopeless);
        cat.steering.detour_at_head = true;
        facing(&mut cat, hopeless);
        cat.state.update_movement(|m| m.current_speed = 1.0);

        for _ in 0..tuning.block_threshold {
            move_towards(&mut cat, target, &scene, &rooms, &tuning, 0.016);
        }
        let queue: Vec<Vec3> = cat.steering.waypoints().iter().copied().collect();
        assert_eq!(queue.len(), 2, "{queue:?}");
        assert_ne!(queue[0], hopeless);
        assert_eq!(queue[1], target);
        assert!(cat.steering.detouring());
    }

    #[test]
    fn blocked_cat_gets_moving_again() {
        let scene = shelf_scene();
        let (rooms, tuning) = (flat(), Tuning::default());
        let start = Vec3::new(2.0, 0.0, 0.64);
        let mut cat = cat_at(start);
        let target = Vec3::new(2.0, 0.0, 3.0);
        move_towards(&mut cat, target, &scene, &rooms, &tuning, 0.016);
        cat.steering.waypoints.push_front(Vec3::new(2.0, 0.0, 1.6));
        cat.steering.detour_at_head = true;

        let mut furthest = 0.0f32;
        for _ in 0..600 {
            move_towards(&mut cat, target, &scene, &rooms, &tuning, 0.016);
            furthest = furthest.max(cat.position.distance(start));
        }
        assert!(furthest > 0.3, "cat froze at {:?}", cat.position);
    }

    #[test]
    fn corner_of_the_bed_does_not_pin_the_cat() {
        let flat = crate::house::default_flat();
        let tuning = Tuning::default();
        let mut cat = cat_at(Vec3::new(3.197, 0.0, 1.54));
        let pot = Vec3::new(2.0, 0.0, 2.9);
        move_towards(&mut cat, pot, &flat.scene, &flat.rooms, &tuning, 1.0 / 60.0);
        // Stale detour that clips the bed corner on the way.
        cat.steering.waypoints.push_front(Vec3::new(2.297, 0.0, 2.962));
        cat.steering.detour_at_head = true;

        let mut reached = false;
        for _ in 0..(60 * 60) {
            if move_towards(&mut cat, pot, &flat.scene, &flat.rooms, &tuning, 1.0 / 60.0) {
                reached = true;
                break;
            }
        }
        assert!(reached, "cat pinned at {:?}", cat.position);
    }

    #[test]
    fn dining_table_in_the_way_of_the_door_is_walked_around() {
        let flat = crate::house::default_flat();
        let tuning = Tuning::default();
        let start = Vec3::new(-2.5, 0.0, 3.0);
        assert!(!is_blocked(start, &flat.scene, &tuning));
        let mut cat = cat_at(start);
        let bowl = Vec3::new(3.0, 0.0, -3.0);

        let mut reached = false;
        for _ in 0..(60 * 60) {
            if move_towards(&mut cat, bowl, &flat.scene, &flat.rooms, &tuning, 1.0 / 60.0) {
                reached = true;
                break;
            }
        }
        assert!(reached, "cat pinned at {:?}", cat.position);
    }

    #[test]
    fn turn_gate_uses_error_before_turning() {
        let (scene, rooms, tuning) = (Scene::new(), flat(), Tuning::default());
        let start = Vec3::new(1.0, 0.0, 0.0);
        let mut cat = cat_at(start);
        let target = Vec3::new(4.0, 0.0, 0.0);
        // 0.35 rad off, more than one frame of turning closes.
        let a = heading(start, target) - 0.35;
        cat.state.update_movement(|m| {
            m.facing_angle = a;
            m.current_speed = 1.0;
        });
        move_towards(&mut cat, target, &scene, &rooms, &tuning, 0.02);
        assert_eq!(cat.position, start);
        assert!(cat.state.movement().is_rotating);
    }

    #[test]
    fn stop_clears_route() {
        let (scene, rooms, tuning) = (Scene::new(), flat(), Tuning::default());
        let mut cat = cat_at(Vec3::new(-3.0, 0.0, 0.0));
        move_towards(&mut cat, Vec3::new(3.0, 0.0, 0.0), &scene, &rooms, &tuning, 0.016);
        stop(&mut cat);
        assert!(cat.steering.waypoints().is_empty());
        assert!(cat.state.movement().destination.is_none());
    }
}
