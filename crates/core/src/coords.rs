//! Installation geometry.
//!
//! The Cloud is laid out as floors stacked 10 blocks apart below a fixed
//! ceiling. Each floor has corridors 15 blocks apart along X, and every
//! corridor holds units alternating between its left wall (even slots) and its
//! right wall (odd slots), two units per 4 blocks of depth along Z.
//!
//! A unit's schematic is addressed by [`CellOffset`] (row, layer, column)
//! relative to the unit's base coordinate, which is the north half of its
//! access chest. Rows run across the corridor and are mirrored between walls.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Distance between corridor center lines along X.
pub const CORRIDOR_SPACING: i32 = 15;
/// Y coordinate of the access chests on floor 0.
pub const CEILING_Y: i32 = 73;
/// Vertical distance between floors.
pub const FLOOR_SPACING: i32 = 10;

const LEFT_WALL_X: i32 = 2;
const RIGHT_WALL_X: i32 = -3;
const DEPTH_ORIGIN_Z: i32 = 28;
const FLOOR_DEPTH_Z: i32 = 10;
const SLOT_PAIR_DEPTH_Z: i32 = 4;
const CELL_ROW_ORIGIN: i32 = 5;
const CELL_COL_ORIGIN: i32 = 3;

/// Absolute block coordinate in the overworld.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize,
)]
pub struct WorldPos {
    /// East-west; east is positive.
    pub x: i32,
    /// Height.
    pub y: i32,
    /// North-south; south is positive.
    pub z: i32,
}

impl WorldPos {
    /// Construct a coordinate.
    pub const fn new(x: i32, y: i32, z: i32) -> Self {
        Self { x, y, z }
    }

    /// Translate by the given deltas.
    pub const fn offset(self, dx: i32, dy: i32, dz: i32) -> Self {
        Self {
            x: self.x + dx,
            y: self.y + dy,
            z: self.z + dz,
        }
    }
}

impl From<(i32, i32, i32)> for WorldPos {
    fn from((x, y, z): (i32, i32, i32)) -> Self {
        Self { x, y, z }
    }
}

impl fmt::Display for WorldPos {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {}", self.x, self.y, self.z)
    }
}

/// Which corridor wall a unit is built against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WallSide {
    /// Even slots; the unit extends toward +X from the corridor.
    Left,
    /// Odd slots; the unit extends toward -X from the corridor.
    Right,
}

impl WallSide {
    /// Wall side for a slot index.
    pub const fn of_slot(slot: u32) -> Self {
        if slot % 2 == 0 {
            WallSide::Left
        } else {
            WallSide::Right
        }
    }

    /// +1 on the left wall, -1 on the right wall: the X direction pointing
    /// away from the corridor into the wall.
    pub const fn outward(self) -> i32 {
        match self {
            WallSide::Left => 1,
            WallSide::Right => -1,
        }
    }

    /// Pick between a left-wall and a right-wall value.
    pub fn pick<T>(self, left: T, right: T) -> T {
        match self {
            WallSide::Left => left,
            WallSide::Right => right,
        }
    }
}

/// Relative position of a schematic cell within a unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CellOffset {
    /// Distance across the corridor, mirrored between walls.
    pub row: i32,
    /// Vertical offset from the access chest.
    pub layer: i32,
    /// Position along the corridor.
    pub col: i32,
}

impl CellOffset {
    /// Construct an offset as `(row, layer, col)`.
    pub const fn new(row: i32, layer: i32, col: i32) -> Self {
        Self { row, layer, col }
    }
}

impl fmt::Display for CellOffset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {}", self.row, self.layer, self.col)
    }
}

/// One storage unit's place in the installation.
///
/// Ordering is by floor, then corridor, then slot, which is also the order in
/// which the layout lists units.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct LogicalPosition {
    /// Floor index, 0 being the topmost.
    pub floor: u32,
    /// Offset from the central corridor; may be negative.
    pub corridor: i32,
    /// Index along the corridor; even slots are on the left wall.
    pub slot: u32,
}

impl LogicalPosition {
    /// Construct a logical position.
    pub const fn new(floor: u32, corridor: i32, slot: u32) -> Self {
        Self {
            floor,
            corridor,
            slot,
        }
    }

    /// Wall the unit is built against.
    pub const fn wall(self) -> WallSide {
        WallSide::of_slot(self.slot)
    }

    /// World coordinate of the north half of the access chest.
    pub fn base(self) -> WorldPos {
        base_coordinate(self.floor, self.corridor, self.slot)
    }

    /// Resolve a schematic cell of this unit to a world coordinate.
    pub fn cell(self, offset: CellOffset) -> WorldPos {
        relative_to_absolute(self.base(), offset, self.wall())
    }

    /// Inverse of [`LogicalPosition::base`]. Returns `None` for coordinates
    /// that are not the base of any unit.
    pub fn from_base(pos: WorldPos) -> Option<Self> {
        let floor_span = CEILING_Y - pos.y;
        if floor_span < 0 || floor_span % FLOOR_SPACING != 0 {
            return None;
        }
        let floor = floor_span / FLOOR_SPACING;

        let depth = pos.z - DEPTH_ORIGIN_Z - FLOOR_DEPTH_Z * floor;
        if depth < 0 || depth % SLOT_PAIR_DEPTH_Z != 0 {
            return None;
        }
        let pair = (depth / SLOT_PAIR_DEPTH_Z) as u32;

        let (wall, corridor) = if (pos.x - LEFT_WALL_X).rem_euclid(CORRIDOR_SPACING) == 0 {
            (
                WallSide::Left,
                (pos.x - LEFT_WALL_X).div_euclid(CORRIDOR_SPACING),
            )
        } else if (pos.x - RIGHT_WALL_X).rem_euclid(CORRIDOR_SPACING) == 0 {
            (
                WallSide::Right,
                (pos.x - RIGHT_WALL_X).div_euclid(CORRIDOR_SPACING),
            )
        } else {
            return None;
        };

        let slot = 2 * pair + u32::from(wall == WallSide::Right);
        Some(Self::new(floor as u32, corridor, slot))
    }
}

impl fmt::Display for LogicalPosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "floor {}, corridor {}, slot {}",
            self.floor, self.corridor, self.slot
        )
    }
}

/// Base coordinate (north half of the access chest) of a unit.
pub fn base_coordinate(floor: u32, corridor: i32, slot: u32) -> WorldPos {
    let floor = floor as i32;
    let x = match WallSide::of_slot(slot) {
        WallSide::Left => CORRIDOR_SPACING * corridor + LEFT_WALL_X,
        WallSide::Right => CORRIDOR_SPACING * corridor + RIGHT_WALL_X,
    };
    let y = CEILING_Y - FLOOR_SPACING * floor;
    let z = DEPTH_ORIGIN_Z + FLOOR_DEPTH_Z * floor + SLOT_PAIR_DEPTH_Z * (slot / 2) as i32;
    WorldPos::new(x, y, z)
}

/// Resolve a schematic cell relative to `base` on the given wall.
pub fn relative_to_absolute(base: WorldPos, offset: CellOffset, wall: WallSide) -> WorldPos {
    let x = match wall {
        WallSide::Left => base.x + CELL_ROW_ORIGIN - offset.row,
        WallSide::Right => base.x - CELL_ROW_ORIGIN + offset.row,
    };
    WorldPos::new(x, base.y + offset.layer, base.z + CELL_COL_ORIGIN - offset.col)
}

/// Inverse of [`relative_to_absolute`].
pub fn absolute_to_relative(base: WorldPos, pos: WorldPos, wall: WallSide) -> CellOffset {
    let row = match wall {
        WallSide::Left => base.x + CELL_ROW_ORIGIN - pos.x,
        WallSide::Right => pos.x - base.x + CELL_ROW_ORIGIN,
    };
    CellOffset::new(row, pos.y - base.y, base.z + CELL_COL_ORIGIN - pos.z)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_coordinate_left_and_right_walls() {
        assert_eq!(base_coordinate(0, 0, 0), WorldPos::new(2, 73, 28));
        assert_eq!(base_coordinate(0, 0, 1), WorldPos::new(-3, 73, 28));
        assert_eq!(base_coordinate(1, 1, 0), WorldPos::new(17, 63, 38));
        assert_eq!(base_coordinate(2, -2, 5), WorldPos::new(-33, 53, 56));
    }

    #[test]
    fn access_chest_cell_is_base() {
        let pos = LogicalPosition::new(3, -1, 6);
        assert_eq!(pos.cell(CellOffset::new(5, 0, 3)), pos.base());
        assert_eq!(
            pos.cell(CellOffset::new(5, 0, 2)),
            pos.base().offset(0, 0, 1)
        );
    }

    #[test]
    fn rows_mirror_between_walls() {
        let base = WorldPos::new(0, 0, 0);
        let offset = CellOffset::new(2, -7, 4);
        let left = relative_to_absolute(base, offset, WallSide::Left);
        let right = relative_to_absolute(base, offset, WallSide::Right);
        assert_eq!(left.x, 3);
        assert_eq!(right.x, -3);
        assert_eq!(left.y, right.y);
        assert_eq!(left.z, right.z);
    }

    #[test]
    fn from_base_rejects_non_bases() {
        assert_eq!(LogicalPosition::from_base(WorldPos::new(2, 72, 28)), None);
        assert_eq!(LogicalPosition::from_base(WorldPos::new(3, 73, 28)), None);
        assert_eq!(LogicalPosition::from_base(WorldPos::new(2, 73, 30)), None);
        assert_eq!(LogicalPosition::from_base(WorldPos::new(2, 83, 18)), None);
    }

    #[test]
    fn from_base_inverts_base() {
        for floor in 0..7 {
            for corridor in -3..=3 {
                for slot in 0..12 {
                    let pos = LogicalPosition::new(floor, corridor, slot);
                    assert_eq!(LogicalPosition::from_base(pos.base()), Some(pos));
                }
            }
        }
    }

    #[test]
    fn logical_position_ordering() {
        let a = LogicalPosition::new(0, 3, 9);
        let b = LogicalPosition::new(1, -3, 0);
        let c = LogicalPosition::new(1, -3, 1);
        assert!(a < b);
        assert!(b < c);
    }

    #[test]
    fn world_pos_display() {
        assert_eq!(WorldPos::new(-35, 6, 38).to_string(), "-35 6 38");
    }
}
