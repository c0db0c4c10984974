use glam::{Vec2, Vec3};

/// Index into [`RoomGraph`]'s room list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RoomId(pub u16);

/// Floor rectangle on the x/z plane.
#[derive(Debug, Clone)]
pub struct Room {
    pub name: String,
    pub min: Vec2,
    pub max: Vec2,
}

impl Room {
    fn contains(&self, p: Vec3) -> bool {
        p.x >= self.min.x && p.x <= self.max.x && p.z >= self.min.y && p.z <= self.max.y
    }
}

/// Opening between two rooms, e.g. a doorway in a shared wall.
#[derive(Debug, Clone, Copy)]
pub struct Passage {
    pub a: RoomId,
    pub b: RoomId,
    pub center: Vec3,
}

/// Which room a point is in, and where to walk to get into a neighbour.
#[derive(Debug, Clone, Default)]
pub struct RoomGraph {
    rooms: Vec<Room>,
    passages: Vec<Passage>,
}

impl RoomGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Two rooms either side of a wall at `wall_x`, spanning `min`..`max`
    /// (x/z), joined by one door at `door`.
    pub fn split_on_x(wall_x: f32, min: Vec2, max: Vec2, door: Vec3) -> Self {
        let mut graph = Self::new();
        let west = graph.add_room("west", min, Vec2::new(wall_x, max.y));
        let east = graph.add_room("east", Vec2::new(wall_x, min.y), max);
        graph.connect(west, east, door);
        graph
    }

    pub fn add_room(&mut self, name: &str, min: Vec2, max: Vec2) -> RoomId {
        let id = RoomId(self.rooms.len() as u16);
        self.rooms.push(Room {
            name: name.to_string(),
            min: min.min(max),
            max: min.max(max),
        });
        id
    }

    pub fn connect(&mut self, a: RoomId, b: RoomId, center: Vec3) {
        self.passages.push(Passage { a, b, center });
    }

    pub fn room(&self, id: RoomId) -> Option<&Room> {
        self.rooms.get(id.0 as usize)
    }

    /// First room containing `p`. Points on a shared boundary belong to
    /// the room added first.
    pub fn locate(&self, p: Vec3) -> Option<RoomId> {
        self.rooms
            .iter()
            .position(|r| r.contains(p))
            .map(|i| RoomId(i as u16))
    }

    /// Centre of the opening between `a` and `b`, if they are adjacent.
    pub fn connection(&self, a: RoomId, b: RoomId) -> Option<Vec3> {
        self.passages
            .iter()
            .find(|p| (p.a == a && p.b == b) || (p.a == b && p.b == a))
            .map(|p| p.center)
    }

    /// False when either point lies outside every room.
    pub fn different_rooms(&self, p: Vec3, q: Vec3) -> bool {
        match (self.locate(p), self.locate(q)) {
            (Some(a), Some(b)) => a != b,
            _ => false,
        }
    }

    /// Intermediate points needed to walk from `from` to `to`.
    pub fn route(&self, from: Vec3, to: Vec3) -> Vec<Vec3> {
        let (Some(a), Some(b)) = (self.locate(from), self.locate(to)) else {
            return vec![to];
        };
        if a == b {
            return vec![to];
        }
        match self.connection(a, b) {
            Some(door) => vec![door, to],
            None => vec![to],
        }
    }

    /// Uniform floor point at least `margin` from the room's edges.
    pub fn random_point(&self, id: RoomId, margin: f32, rng: &mut fastrand::Rng) -> Option<Vec3> {
        let room = self.room(id)?;
        let lo = room.min + Vec2::splat(margin);
        let hi = room.max - Vec2::splat(margin);
        let (lo, hi) = if lo.cmple(hi).all() {
            (lo, hi)
        } else {
            let c = (room.min + room.max) * 0.5;
            (c, c)
        };
        let x = lo.x + rng.f32() * (hi.x - lo.x);
        let z = lo.y + rng.f32() * (hi.y - lo.y);
        Some(Vec3::new(x, 0.0, z))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn flat() -> RoomGraph {
        RoomGraph::split_on_x(0.0, Vec2::new(-5.0, -4.0), Vec2::new(5.0, 4.0), Vec3::ZERO)
    }

    #[test]
    fn locates_by_x() {
        let g = flat();
        assert_eq!(g.locate(Vec3::new(-2.0, 0.0, 1.0)), Some(RoomId(0)));
        assert_eq!(g.locate(Vec3::new(2.0, 0.0, 1.0)), Some(RoomId(1)));
        assert_eq!(g.locate(Vec3::new(9.0, 0.0, 0.0)), None);
        assert!(g.different_rooms(Vec3::new(-1.0, 0.0, 0.0), Vec3::new(1.0, 0.0, 0.0)));
    }

    #[test]
    fn cross_room_route_goes_through_door() {
        let g = flat();
        let target = Vec3::new(3.0, 0.0, 2.0);
        assert_eq!(g.route(Vec3::new(-3.0, 0.0, -1.0), target), vec![Vec3::ZERO, target]);
        assert_eq!(g.route(Vec3::new(1.0, 0.0, -1.0), target), vec![target]);
    }

    #[test]
    fn random_point_stays_inside_margin() {
        let g = flat();
        let mut rng = fastrand::Rng::with_seed(3);
        for _ in 0..100 {
            let p = g.random_point(RoomId(1), 0.5, &mut rng).unwrap();
            assert!(p.x >= 0.5 && p.x <= 4.5);
            assert!(p.z >= -3.5 && p.z <= 3.5);
        }
    }
}
