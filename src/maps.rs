use std::collections::HashMap;

use slotmap::{SlotMap, new_key_type};
use smallvec::SmallVec;

use crate::components::Position;

new_key_type! {
    /// Handle into the map-instance arena. Stable across registrations.
    pub struct MapId;
}

// ---------------------------------------------------------------------------
// Tiles
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TileKind {
    Floor,
    Wall,
    StairsUp,
    StairsDown,
}

impl TileKind {
    pub fn is_passable(self) -> bool {
        !matches!(self, TileKind::Wall)
    }

    /// One-line description for the examine action.
    pub fn description(self) -> &'static str {
        match self {
            TileKind::Floor => "a stretch of bare floor",
            TileKind::Wall => "solid wall",
            TileKind::StairsUp => "a staircase leading up",
            TileKind::StairsDown => "a staircase leading down",
        }
    }

    /// The stairs kind a traveller using this tile should arrive on, if
    /// this tile is stairs at all.
    pub fn reciprocal_stairs(self) -> Option<TileKind> {
        match self {
            TileKind::StairsDown => Some(TileKind::StairsUp),
            TileKind::StairsUp => Some(TileKind::StairsDown),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MapKind {
    Overworld,
    Dungeon,
}

// ---------------------------------------------------------------------------
// Map instances
// ---------------------------------------------------------------------------

/// Authored landing for one tile: stepping through leads to exactly this
/// map and these coordinates.
#[derive(Debug, Clone, Copy)]
pub struct TransitionTarget {
    pub map: MapId,
    pub x: i32,
    pub y: i32,
}

/// One concrete level/area: a tile grid plus per-tile transition metadata.
/// Instances come from the generator fully populated; nothing in the core
/// invents tiles after registration.
#[derive(Debug)]
pub struct MapInstance {
    kind: MapKind,
    level: u32,
    width: usize,
    height: usize,
    tiles: Vec<TileKind>,
    transitions: HashMap<(i32, i32), TransitionTarget>,
}

impl MapInstance {
    pub fn new(kind: MapKind, level: u32, width: usize, height: usize) -> Self {
        let size = width * height;
        Self {
            kind,
            level,
            width,
            height,
            tiles: vec![TileKind::Floor; size],
            transitions: HashMap::new(),
        }
    }

    pub fn kind(&self) -> MapKind {
        self.kind
    }

    pub fn level(&self) -> u32 {
        self.level
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    fn index(&self, x: i32, y: i32) -> Option<usize> {
        if x >= 0 && y >= 0 && (x as usize) < self.width && (y as usize) < self.height {
            Some(y as usize * self.width + x as usize)
        } else {
            None
        }
    }

    pub fn tile(&self, x: i32, y: i32) -> Option<TileKind> {
        self.index(x, y).map(|i| self.tiles[i])
    }

    pub fn set_tile(&mut self, x: i32, y: i32, tile: TileKind) {
        if let Some(i) = self.index(x, y) {
            self.tiles[i] = tile;
        }
    }

    /// Out-of-bounds tiles are not walkable.
    pub fn is_walkable(&self, x: i32, y: i32) -> bool {
        self.tile(x, y).is_some_and(TileKind::is_passable)
    }

    pub fn transition_at(&self, x: i32, y: i32) -> Option<TransitionTarget> {
        self.transitions.get(&(x, y)).copied()
    }

    pub fn set_transition(&mut self, x: i32, y: i32, target: TransitionTarget) {
        if self.index(x, y).is_some() {
            self.transitions.insert((x, y), target);
        }
    }

    /// First tile of the given kind in row-major order, so repeated scans
    /// of the same grid always agree.
    pub fn find_tile(&self, kind: TileKind) -> Option<Position> {
        for y in 0..self.height {
            for x in 0..self.width {
                if self.tiles[y * self.width + x] == kind {
                    return Some(Position {
                        x: x as i32,
                        y: y as i32,
                    });
                }
            }
        }
        None
    }

    /// Every plain floor tile, row-major.
    pub fn floor_tiles(&self) -> Vec<Position> {
        let mut out = Vec::new();
        for y in 0..self.height {
            for x in 0..self.width {
                if self.tiles[y * self.width + x] == TileKind::Floor {
                    out.push(Position {
                        x: x as i32,
                        y: y as i32,
                    });
                }
            }
        }
        out
    }

    pub fn center(&self) -> Position {
        Position {
            x: (self.width / 2) as i32,
            y: (self.height / 2) as i32,
        }
    }
}

// ---------------------------------------------------------------------------
// Registry
// ---------------------------------------------------------------------------

/// Owns every registered map instance, the active pointer, the return
/// memory, and the transition guard. Passed by reference to the systems
/// that need it; there is no hidden global.
pub struct MapRegistry {
    instances: SlotMap<MapId, MapInstance>,
    by_key: HashMap<(MapKind, u32), SmallVec<[MapId; 2]>>,
    active: Option<MapId>,
    previous: Option<MapId>,
    last_positions: HashMap<MapId, Position>,
    in_transition: bool,
}

impl MapRegistry {
    pub fn new() -> Self {
        Self {
            instances: SlotMap::with_key(),
            by_key: HashMap::new(),
            active: None,
            previous: None,
            last_positions: HashMap::new(),
            in_transition: false,
        }
    }

    /// Register a generated instance. Registration order is preserved per
    /// (kind, level) key; `find` always returns the earliest registration.
    pub fn register(&mut self, map: MapInstance) -> MapId {
        let key = (map.kind(), map.level());
        let id = self.instances.insert(map);
        self.by_key.entry(key).or_default().push(id);
        id
    }

    /// Deterministic first match for a (kind, level) key.
    pub fn find(&self, kind: MapKind, level: u32) -> Option<MapId> {
        self.by_key
            .get(&(kind, level))
            .and_then(|ids| ids.first().copied())
    }

    pub fn get(&self, id: MapId) -> Option<&MapInstance> {
        self.instances.get(id)
    }

    pub fn get_mut(&mut self, id: MapId) -> Option<&mut MapInstance> {
        self.instances.get_mut(id)
    }

    pub fn active(&self) -> Option<MapId> {
        self.active
    }

    pub fn active_map(&self) -> Option<&MapInstance> {
        self.active.and_then(|id| self.instances.get(id))
    }

    /// Switch the active pointer, the single source of truth other systems
    /// query. Records the outgoing instance and, when given, the departing
    /// actor's position on it for later return transitions.
    pub fn set_active(&mut self, id: MapId, departing: Option<Position>) {
        if let Some(current) = self.active {
            self.previous = Some(current);
            if let Some(pos) = departing {
                self.last_positions.insert(current, pos);
            }
        }
        self.active = Some(id);
    }

    pub fn previous(&self) -> Option<MapId> {
        self.previous
    }

    /// Where the actor last stood on this instance, if it was ever left.
    pub fn last_position(&self, id: MapId) -> Option<Position> {
        self.last_positions.get(&id).copied()
    }

    /// Take the transition guard. Returns false if a transition is already
    /// in progress, in which case the caller must not proceed.
    pub fn begin_transition(&mut self) -> bool {
        if self.in_transition {
            return false;
        }
        self.in_transition = true;
        true
    }

    /// Release the transition guard. Runs on every exit path of the
    /// orchestrator, success or failure.
    pub fn end_transition(&mut self) {
        self.in_transition = false;
    }

    pub fn in_transition(&self) -> bool {
        self.in_transition
    }

    pub fn len(&self) -> usize {
        self.instances.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instances.is_empty()
    }
}
