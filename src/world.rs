use std::collections::{HashMap, HashSet};

use rand::SeedableRng;
use rand::rngs::StdRng;

use crate::camera::Camera;
use crate::components::*;
use crate::events::EventLog;
use crate::maps::MapRegistry;

/// Per-turn bookkeeping for downstream turn consumers (AI, status
/// effects). Consumers set their flag after handling a TurnCompleted; the
/// transition orchestrator clears them on arrival so the first turn on a
/// new map is not mistaken for one already handled.
#[derive(Debug, Clone, Copy, Default)]
pub struct TurnFlags {
    pub ai_processed: bool,
    pub effects_processed: bool,
}

impl TurnFlags {
    pub fn reset(&mut self) {
        *self = TurnFlags::default();
    }
}

pub struct World {
    // Entity tracking
    pub alive: HashSet<Entity>,
    next_entity_id: u64,

    // Property tables
    pub positions: HashMap<Entity, Position>,
    pub map_contexts: HashMap<Entity, MapContext>,
    pub blockers: HashMap<Entity, Blocker>,
    pub names: HashMap<Entity, Name>,
    pub equippables: HashMap<Entity, Equippable>,
    pub equipped: HashMap<Entity, Equipped>,
    pub carried_by: HashMap<Entity, CarriedBy>,

    // Infrastructure
    pub maps: MapRegistry,
    pub camera: Camera,
    pub events: EventLog,
    pub rng: StdRng,
    pub turn: Turn,
    /// Player-controlled entity; the actor whose turns the translator runs.
    pub player: Option<Entity>,
    pub turn_flags: TurnFlags,
}

impl World {
    /// Create a new World with all fields initialized and a deterministic
    /// RNG seed. Seeding here is the only way randomness enters the core.
    pub fn new_with_seed(seed: u64) -> Self {
        Self {
            alive: HashSet::new(),
            next_entity_id: 1, // 0 is reserved/unused

            positions: HashMap::new(),
            map_contexts: HashMap::new(),
            blockers: HashMap::new(),
            names: HashMap::new(),
            equippables: HashMap::new(),
            equipped: HashMap::new(),
            carried_by: HashMap::new(),

            maps: MapRegistry::new(),
            camera: Camera::new(21, 15),
            events: EventLog::default_capacity(),
            rng: StdRng::seed_from_u64(seed),
            turn: Turn(0),
            player: None,
            turn_flags: TurnFlags::default(),
        }
    }

    /// Spawn a new entity. Returns the Entity with a unique ID.
    /// The entity is added to the alive set but has no components yet.
    pub fn spawn(&mut self) -> Entity {
        let entity = Entity(self.next_entity_id);
        self.next_entity_id += 1;
        self.alive.insert(entity);
        entity
    }

    /// Remove an entity from ALL tables, including ownership mappings
    /// where it is the owner.
    /// CRITICAL: Every property table MUST have a .remove() call here.
    /// If you add a new property table to World, add a corresponding
    /// remove here.
    pub fn despawn(&mut self, entity: Entity) {
        self.alive.remove(&entity);
        if self.player == Some(entity) {
            self.player = None;
        }
        self.positions.remove(&entity);
        self.map_contexts.remove(&entity);
        self.blockers.remove(&entity);
        self.names.remove(&entity);
        self.equippables.remove(&entity);
        self.equipped.remove(&entity);
        self.carried_by.remove(&entity);
        self.equipped.retain(|_, eq| eq.owner != entity);
        self.carried_by.retain(|_, c| c.owner != entity);
    }

    /// Display name for messages; "something" when the entity is unnamed.
    pub fn name_of(&self, entity: Entity) -> &str {
        self.names
            .get(&entity)
            .map_or("something", |n| n.value.as_str())
    }
}

/// Validate world invariants. Run between turns in debug builds.
/// Checks that no property table holds a dead entity, that ownership
/// mappings point at live owners, that the acting player's map context
/// matches the registry's active map, and that the transition guard is
/// idle (it is only ever held inside the orchestrator call).
#[cfg(debug_assertions)]
pub fn validate_world(world: &World) {
    for entity in world.positions.keys() {
        assert!(
            world.alive.contains(entity),
            "zombie entity {:?} in positions but not in alive",
            entity
        );
    }

    for entity in world.map_contexts.keys() {
        assert!(
            world.alive.contains(entity),
            "zombie entity {:?} in map_contexts but not in alive",
            entity
        );
    }

    for entity in world.blockers.keys() {
        assert!(
            world.alive.contains(entity),
            "zombie entity {:?} in blockers but not in alive",
            entity
        );
    }

    for entity in world.names.keys() {
        assert!(
            world.alive.contains(entity),
            "zombie entity {:?} in names but not in alive",
            entity
        );
    }

    for entity in world.equippables.keys() {
        assert!(
            world.alive.contains(entity),
            "zombie entity {:?} in equippables but not in alive",
            entity
        );
    }

    for (entity, eq) in world.equipped.iter() {
        assert!(
            world.alive.contains(entity),
            "zombie entity {:?} in equipped but not in alive",
            entity
        );
        assert!(
            world.alive.contains(&eq.owner),
            "equipped item {:?} owned by dead entity {:?}",
            entity,
            eq.owner
        );
        let carried = world.carried_by.get(entity);
        assert!(
            carried.is_some_and(|c| c.owner == eq.owner),
            "equipped item {:?} is not carried by its wearer {:?}",
            entity,
            eq.owner
        );
    }

    for (entity, c) in world.carried_by.iter() {
        assert!(
            world.alive.contains(entity),
            "zombie entity {:?} in carried_by but not in alive",
            entity
        );
        assert!(
            world.alive.contains(&c.owner),
            "item {:?} carried by dead entity {:?}",
            entity,
            c.owner
        );
    }

    for (entity, ctx) in world.map_contexts.iter() {
        assert!(
            world.maps.get(ctx.map).is_some(),
            "entity {:?} has map context for an unregistered map",
            entity
        );
    }

    if let Some(player) = world.player
        && let Some(ctx) = world.map_contexts.get(&player)
        && let Some(active) = world.maps.active()
    {
        assert!(
            ctx.map == active,
            "player map context disagrees with the active map"
        );
    }

    assert!(
        !world.maps.in_transition(),
        "transition guard held outside the orchestrator"
    );
}
