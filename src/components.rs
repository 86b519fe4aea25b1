use std::hash::{Hash, Hasher};

use crate::maps::MapId;

/// Unique entity identifier. Never use raw u64 where an Entity is meant.
/// Never cast between Entity and Turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Entity(pub u64);

impl Hash for Entity {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.0.hash(state);
    }
}

/// Committed-turn counter. Never use raw u64 where a Turn is meant.
/// Never cast between Turn and Entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Turn(pub u64);

/// Spatial position on the tile grid of the map the entity belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Position {
    pub x: i32,
    pub y: i32,
}

/// Cardinal step direction for movement intents.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    North,
    South,
    West,
    East,
}

impl Direction {
    /// Grid delta for one step. North is -y, matching row 0 at the top.
    pub fn delta(self) -> (i32, i32) {
        match self {
            Direction::North => (0, -1),
            Direction::South => (0, 1),
            Direction::West => (-1, 0),
            Direction::East => (1, 0),
        }
    }

    /// The tile one step from `from` in this direction.
    pub fn step_from(self, from: Position) -> Position {
        let (dx, dy) = self.delta();
        Position {
            x: from.x + dx,
            y: from.y + dy,
        }
    }
}

/// Name of the entity (creature type, item type, etc.).
#[derive(Debug, Clone)]
pub struct Name {
    pub value: String,
}

/// Marker for entities that refuse to share their tile. Movement into a
/// blocker's tile is rejected with a collision.
#[derive(Debug, Clone, Copy)]
pub struct Blocker;

/// Back-reference recording which map instance the entity belongs to.
/// For the actor taking the active turn this must equal the registry's
/// active map; anything else is a consistency bug.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MapContext {
    pub map: MapId,
}

/// Body slot an item can occupy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EquipSlot {
    Head,
    Body,
    MainHand,
    OffHand,
}

impl EquipSlot {
    pub fn label(self) -> &'static str {
        match self {
            EquipSlot::Head => "head",
            EquipSlot::Body => "body",
            EquipSlot::MainHand => "main hand",
            EquipSlot::OffHand => "off hand",
        }
    }
}

/// Items that can be worn or wielded, and where.
#[derive(Debug, Clone, Copy)]
pub struct Equippable {
    pub slot: EquipSlot,
}

/// Present on an item while it is worn or wielded.
#[derive(Debug, Clone, Copy)]
pub struct Equipped {
    pub owner: Entity,
    pub slot: EquipSlot,
}

/// Present on an item while it sits in an actor's inventory.
#[derive(Debug, Clone, Copy)]
pub struct CarriedBy {
    pub owner: Entity,
}
