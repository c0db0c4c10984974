use glam::{Vec2, Vec3};

use crate::ecs::components::Collider;
use crate::spatial::rooms::RoomGraph;
use crate::spatial::{Aabb, Scene};

const WALL_HEIGHT: f32 = 2.5;
const WALL_THICKNESS: f32 = 0.1;
/// Half-width of the doorway in the shared wall.
const DOOR_HALF_WIDTH: f32 = 0.7;

/// A furnished two-room flat ready to drop cats into.
pub struct House {
    pub scene: Scene,
    pub rooms: RoomGraph,
    pub bowls: Vec<hecs::Entity>,
    pub props: Vec<hecs::Entity>,
    pub cat_spawn: Vec3,
}

/// Living room to the west, bedroom to the east, one door between them at
/// the origin. Floor spans x in [-5, 5], z in [-4, 4].
pub fn default_flat() -> House {
    let min = Vec2::new(-5.0, -4.0);
    let max = Vec2::new(5.0, 4.0);
    let rooms = RoomGraph::split_on_x(0.0, min, max, Vec3::ZERO);
    let mut scene = Scene::new();
    let t = WALL_THICKNESS * 0.5;

    // Outer walls.
    for (name, a, b) in [
        ("wall_north", Vec3::new(min.x, 0.0, max.y - t), Vec3::new(max.x, WALL_HEIGHT, max.y + t)),
        ("wall_south", Vec3::new(min.x, 0.0, min.y - t), Vec3::new(max.x, WALL_HEIGHT, min.y + t)),
        ("wall_west", Vec3::new(min.x - t, 0.0, min.y), Vec3::new(min.x + t, WALL_HEIGHT, max.y)),
        ("wall_east", Vec3::new(max.x - t, 0.0, min.y), Vec3::new(max.x + t, WALL_HEIGHT, max.y)),
    ] {
        scene.spawn_collider(Collider::new(name, Aabb::new(a, b)));
    }

    let shared = Collider::new(
        "wall_shared",
        Aabb::new(Vec3::new(-t, 0.0, min.y), Vec3::new(t, WALL_HEIGHT, max.y)),
    )
    .with_hole(Aabb::new(
        Vec3::new(-WALL_THICKNESS, 0.0, -DOOR_HALF_WIDTH),
        Vec3::new(WALL_THICKNESS, 2.0, DOOR_HALF_WIDTH),
    ));
    scene.spawn_collider(shared);

    // Furniture. The rug is walkable and only there for looks.
    for (name, center, size) in [
        ("table_dining", Vec3::new(-2.5, 0.0, 2.0), Vec3::new(1.4, 0.75, 0.9)),
        ("chair_dining", Vec3::new(-2.5, 0.0, 1.1), Vec3::new(0.45, 0.9, 0.45)),
        ("chair_reading", Vec3::new(-4.3, 0.0, 3.2), Vec3::new(0.7, 0.9, 0.7)),
        ("shelf_books", Vec3::new(1.0, 0.0, 3.6), Vec3::new(1.2, 1.8, 0.35)),
        ("bed", Vec3::new(3.8, 0.0, 2.8), Vec3::new(1.6, 0.5, 2.0)),
        ("rug_bedroom", Vec3::new(2.0, 0.0, 0.0), Vec3::new(2.0, 0.01, 1.5)),
    ] {
        scene.spawn_collider(Collider::new(name, Aabb::on_floor(center, size)));
    }

    let props = vec![
        scene.spawn_prop("flower_pot_window", Vec3::new(-4.4, 0.0, -1.0)),
        scene.spawn_prop("vase_tall", Vec3::new(-1.2, 0.0, 2.0)),
        scene.spawn_prop("flower_pot_shelf", Vec3::new(2.0, 0.0, 2.9)),
    ];

    let bowls = vec![
        scene.spawn_bowl(Vec3::new(-4.0, 0.0, -3.0)),
        scene.spawn_bowl(Vec3::new(3.0, 0.0, -3.0)),
    ];

    scene.spawn_player(Vec3::new(-1.5, 1.6, -0.5));

    log::debug!(
        "built flat: {} rooms, {} bowls, {} props",
        2,
        bowls.len(),
        props.len()
    );

    House {
        scene,
        rooms,
        bowls,
        props,
        cat_spawn: Vec3::new(2.0, 0.0, -1.0),
    }
}
