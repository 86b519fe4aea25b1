use crate::components::{Direction, Entity, EquipSlot, Position, Turn};
use crate::maps::{MapId, TileKind};

/// All event kinds the core produces. Every variant includes turn: Turn,
/// the turn the event happened on. Dispatch is exhaustive matching at the
/// consumer; there is no dynamic payload inspection.
#[derive(Debug, Clone)]
pub enum Event {
    /// A proposed step, recorded before the resolver rules on it.
    MoveIntent {
        entity: Entity,
        from: Position,
        to: Position,
        dir: Direction,
        turn: Turn,
    },
    /// A committed step.
    Moved {
        entity: Entity,
        from: Position,
        to: Position,
        turn: Turn,
    },
    /// A step rejected by terrain. `at` is the tile that refused entry.
    MoveBlocked {
        entity: Entity,
        at: Position,
        turn: Turn,
    },
    /// A step rejected by a blocking occupant of the contested tile.
    Collision {
        mover: Entity,
        occupant: Entity,
        at: Position,
        turn: Turn,
    },
    Rested {
        entity: Entity,
        turn: Turn,
    },
    /// The acting entity committed its one action for the turn. Downstream
    /// consumers (AI, status effects) key off this.
    TurnCompleted {
        entity: Entity,
        turn: Turn,
    },
    /// The actor looked at the tile underfoot.
    MapExamined {
        entity: Entity,
        at: Position,
        tile: TileKind,
        turn: Turn,
    },
    /// The actor crossed from one map instance to another.
    MapChanged {
        entity: Entity,
        from: MapId,
        to: MapId,
        turn: Turn,
    },
    ItemUnequipped {
        actor: Entity,
        item: Entity,
        slot: EquipSlot,
        turn: Turn,
    },
    ItemEquipped {
        actor: Entity,
        item: Entity,
        slot: EquipSlot,
        turn: Turn,
    },
    /// One user-facing log line.
    Message {
        text: String,
        turn: Turn,
    },
}

impl Event {
    /// The turn the event happened on.
    pub fn turn(&self) -> Turn {
        match self {
            Event::MoveIntent { turn, .. }
            | Event::Moved { turn, .. }
            | Event::MoveBlocked { turn, .. }
            | Event::Collision { turn, .. }
            | Event::Rested { turn, .. }
            | Event::TurnCompleted { turn, .. }
            | Event::MapExamined { turn, .. }
            | Event::MapChanged { turn, .. }
            | Event::ItemUnequipped { turn, .. }
            | Event::ItemEquipped { turn, .. }
            | Event::Message { turn, .. } => *turn,
        }
    }
}

/// Ring buffer for events. Fixed capacity, overwrites oldest entries.
pub struct EventLog {
    buffer: Vec<Option<Event>>,
    capacity: usize,
    write_pos: usize,
    count: usize,
}

impl EventLog {
    /// Create a new EventLog with the given max capacity.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1); // minimum 1
        Self {
            buffer: (0..capacity).map(|_| None).collect(),
            capacity,
            write_pos: 0,
            count: 0,
        }
    }

    /// Create an EventLog with the default capacity of 512.
    pub fn default_capacity() -> Self {
        Self::new(512)
    }

    /// Push an event into the ring buffer. Overwrites oldest if full.
    pub fn push(&mut self, event: Event) {
        self.buffer[self.write_pos] = Some(event);
        self.write_pos = (self.write_pos + 1) % self.capacity;
        if self.count < self.capacity {
            self.count += 1;
        }
    }

    /// Iterate over all events from oldest to newest.
    pub fn iter(&self) -> impl Iterator<Item = &Event> {
        let start = if self.count < self.capacity {
            0
        } else {
            self.write_pos
        };

        (0..self.count).filter_map(move |i| {
            let idx = (start + i) % self.capacity;
            self.buffer[idx].as_ref()
        })
    }

    /// Return the most recent n events (newest last).
    pub fn recent(&self, n: usize) -> Vec<&Event> {
        let n = n.min(self.count);
        let start = if self.count < self.capacity {
            self.count.saturating_sub(n)
        } else {
            (self.write_pos + self.capacity - n) % self.capacity
        };

        (0..n)
            .filter_map(|i| {
                let idx = (start + i) % self.capacity;
                self.buffer[idx].as_ref()
            })
            .collect()
    }

    /// Total number of events currently stored.
    pub fn len(&self) -> usize {
        self.count
    }

    /// Whether the log is empty.
    pub fn is_empty(&self) -> bool {
        self.count == 0
    }
}
