use crate::components::{Direction, Entity, Position};
use crate::events::Event;
use crate::world::World;

/// One proposed step, produced by the input translator and resolved
/// within the same tick. Never stored.
#[derive(Debug, Clone, Copy)]
pub struct MoveIntent {
    pub entity: Entity,
    pub from: Position,
    pub to: Position,
    pub dir: Direction,
}

/// How the resolver ruled on an intent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveOutcome {
    /// Position committed to the destination.
    Moved,
    /// Terrain refused entry; position unchanged.
    BlockedByTerrain,
    /// A blocking occupant holds the tile; position unchanged.
    BlockedByEntity(Entity),
    /// Required data was missing; nothing was emitted.
    Aborted,
}

/// Rule on a movement intent against the active map and commit the new
/// position on success. Admissibility in order: terrain first, then
/// blocking occupancy. Occupancy is re-checked here at resolution time,
/// never reserved ahead, so intents resolve in emission order with no
/// queued overlap. Each ruled intent leaves an intent record followed by
/// exactly one signal: Moved, MoveBlocked, or Collision. An aborted
/// intent leaves nothing.
pub fn resolve_move(world: &mut World, intent: MoveIntent) -> MoveOutcome {
    let turn = world.turn;

    let Some(&from) = world.positions.get(&intent.entity) else {
        log::warn!("movement intent for {:?} with no position", intent.entity);
        return MoveOutcome::Aborted;
    };
    let Some(active_id) = world.maps.active() else {
        log::warn!("movement intent with no active map");
        return MoveOutcome::Aborted;
    };

    world.events.push(Event::MoveIntent {
        entity: intent.entity,
        from,
        to: intent.to,
        dir: intent.dir,
        turn,
    });

    let walkable = world
        .maps
        .get(active_id)
        .is_some_and(|map| map.is_walkable(intent.to.x, intent.to.y));
    if !walkable {
        world.events.push(Event::MoveBlocked {
            entity: intent.entity,
            at: intent.to,
            turn,
        });
        return MoveOutcome::BlockedByTerrain;
    }

    // Blocking occupants of the destination, on the same map only.
    // Sorted so a doubly-occupied tile reports the same entity every run.
    let mut occupants: Vec<Entity> = world
        .blockers
        .keys()
        .filter(|&&e| e != intent.entity)
        .filter(|&&e| {
            world
                .map_contexts
                .get(&e)
                .is_some_and(|ctx| ctx.map == active_id)
        })
        .filter(|&&e| world.positions.get(&e) == Some(&intent.to))
        .copied()
        .collect();
    occupants.sort_by_key(|e| e.0);

    if let Some(&occupant) = occupants.first() {
        world.events.push(Event::Collision {
            mover: intent.entity,
            occupant,
            at: intent.to,
            turn,
        });
        return MoveOutcome::BlockedByEntity(occupant);
    }

    if let Some(pos) = world.positions.get_mut(&intent.entity) {
        *pos = intent.to;
    }
    world.events.push(Event::Moved {
        entity: intent.entity,
        from,
        to: intent.to,
        turn,
    });
    MoveOutcome::Moved
}
