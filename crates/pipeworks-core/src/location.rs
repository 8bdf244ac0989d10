//! Cell coordinates, the six-connected neighborhood, and region keys.

use crate::id::WorldId;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Width of a region along x and z, in cells. Regions span the full height.
pub const REGION_SIZE: i32 = 16;

// ---------------------------------------------------------------------------
// Face
// ---------------------------------------------------------------------------

/// One of the six axis-aligned faces of a cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Face {
    Up,
    Down,
    North,
    South,
    East,
    West,
}

impl Face {
    /// All six faces, in the order discovery visits neighbors.
    pub const ALL: [Face; 6] = [
        Face::Up,
        Face::Down,
        Face::North,
        Face::South,
        Face::East,
        Face::West,
    ];

    /// Unit offset `(dx, dy, dz)` for this face. North is -z.
    pub fn offset(self) -> (i32, i32, i32) {
        match self {
            Face::Up => (0, 1, 0),
            Face::Down => (0, -1, 0),
            Face::North => (0, 0, -1),
            Face::South => (0, 0, 1),
            Face::East => (1, 0, 0),
            Face::West => (-1, 0, 0),
        }
    }

    pub fn opposite(self) -> Face {
        match self {
            Face::Up => Face::Down,
            Face::Down => Face::Up,
            Face::North => Face::South,
            Face::South => Face::North,
            Face::East => Face::West,
            Face::West => Face::East,
        }
    }
}

// ---------------------------------------------------------------------------
// Location
// ---------------------------------------------------------------------------

/// A cell address: world plus integer coordinates.
///
/// Equality, hashing and ordering use all four fields, so the same `(x, y, z)`
/// in two worlds are distinct locations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Location {
    pub world: WorldId,
    pub x: i32,
    pub y: i32,
    pub z: i32,
}

impl Location {
    pub fn new(world: WorldId, x: i32, y: i32, z: i32) -> Self {
        Self { world, x, y, z }
    }

    /// The adjacent location across `face`, or `None` past the coordinate
    /// range.
    pub fn offset(&self, face: Face) -> Option<Location> {
        let (dx, dy, dz) = face.offset();
        Some(Location {
            world: self.world,
            x: self.x.checked_add(dx)?,
            y: self.y.checked_add(dy)?,
            z: self.z.checked_add(dz)?,
        })
    }

    /// The in-range neighbors in [`Face::ALL`] order. Cells on the edge of the
    /// coordinate range have fewer than six.
    pub fn neighbors(&self) -> impl Iterator<Item = Location> + '_ {
        Face::ALL.into_iter().filter_map(move |face| self.offset(face))
    }

    /// The face of `self` that touches `other`, if the two are adjacent.
    pub fn face_towards(&self, other: &Location) -> Option<Face> {
        Face::ALL
            .into_iter()
            .find(|&face| self.offset(face) == Some(*other))
    }

    /// Key of the region containing this location.
    pub fn region(&self) -> RegionKey {
        RegionKey {
            world: self.world,
            x: self.x.div_euclid(REGION_SIZE),
            z: self.z.div_euclid(REGION_SIZE),
        }
    }

    /// Manhattan distance, or `None` across worlds.
    pub fn manhattan_distance(&self, other: &Location) -> Option<u64> {
        if self.world != other.world {
            return None;
        }
        let axis = |a: i32, b: i32| (i64::from(a) - i64::from(b)).unsigned_abs();
        Some(axis(self.x, other.x) + axis(self.y, other.y) + axis(self.z, other.z))
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:({}, {}, {})", self.world.0, self.x, self.y, self.z)
    }
}

/// A region column: world plus region coordinates along x and z.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct RegionKey {
    pub world: WorldId,
    pub x: i32,
    pub z: i32,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(x: i32, y: i32, z: i32) -> Location {
        Location::new(WorldId(0), x, y, z)
    }

    #[test]
    fn offsets_are_unit_and_opposite_cancels() {
        let origin = at(3, 4, 5);
        for face in Face::ALL {
            let there = origin.offset(face).unwrap();
            assert_eq!(origin.manhattan_distance(&there), Some(1));
            assert_eq!(there.offset(face.opposite()), Some(origin));
        }
    }

    #[test]
    fn neighbors_follow_face_order() {
        let n: Vec<Location> = at(0, 0, 0).neighbors().collect();
        assert_eq!(n.len(), 6);
        assert_eq!(n[0], at(0, 1, 0));
        assert_eq!(n[1], at(0, -1, 0));
        assert_eq!(n[2], at(0, 0, -1));
        assert_eq!(n[5], at(-1, 0, 0));
    }

    #[test]
    fn face_towards_adjacent_only() {
        assert_eq!(at(0, 0, 0).face_towards(&at(1, 0, 0)), Some(Face::East));
        assert_eq!(at(0, 0, 0).face_towards(&at(2, 0, 0)), None);
    }

    #[test]
    fn worlds_distinguish_locations() {
        let a = Location::new(WorldId(0), 1, 2, 3);
        let b = Location::new(WorldId(1), 1, 2, 3);
        assert_ne!(a, b);
        assert_eq!(a.manhattan_distance(&b), None);
    }

    #[test]
    fn coordinate_edges_have_no_neighbor_beyond() {
        let corner = at(i32::MAX, i32::MIN, 0);
        assert_eq!(corner.offset(Face::East), None);
        assert_eq!(corner.offset(Face::Down), None);
        assert_eq!(corner.offset(Face::West), Some(at(i32::MAX - 1, i32::MIN, 0)));
        assert_eq!(corner.neighbors().count(), 4);
        assert_eq!(
            at(i32::MIN, 0, 0).manhattan_distance(&at(i32::MAX, 0, 0)),
            Some(u64::from(u32::MAX))
        );
    }

    #[test]
    fn region_rounds_toward_negative_infinity() {
        assert_eq!(at(0, 0, 0).region(), at(15, 200, 15).region());
        assert_ne!(at(-1, 0, 0).region(), at(0, 0, 0).region());
        assert_eq!(at(-1, 0, -16).region().x, -1);
        assert_eq!(at(-1, 0, -16).region().z, -1);
    }
}
