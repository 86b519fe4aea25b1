use rand::RngExt;
use thiserror::Error;

use crate::components::{Entity, MapContext, Position};
use crate::events::Event;
use crate::maps::{MapId, MapKind, TileKind};
use crate::world::World;

/// Why a transition attempt did not happen. Every variant leaves the
/// world exactly as it was.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum TransitionError {
    /// Another transition is executing. Ignored, never queued.
    #[error("a map transition is already in progress")]
    InProgress,
    #[error("no active map to depart from")]
    NoActiveMap,
    #[error("the travelling actor has no position")]
    MissingPosition,
    /// The current tile has no defined destination.
    #[error("nothing here leads anywhere")]
    NoExit,
    /// The rule table named a (kind, level) that was never registered.
    /// A wiring error in the level set, not a generation trigger.
    #[error("no registered {kind:?} map at level {level}")]
    UnregisteredTarget { kind: MapKind, level: u32 },
    /// Tile metadata points at an instance id that is gone.
    #[error("transition metadata points at an unregistered map")]
    DanglingTarget,
}

/// Where a successful transition put the actor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransitionOutcome {
    pub map: MapId,
    pub landing: Position,
}

/// Move `actor` through the exit under its feet, if any. This is the
/// single entry point for map travel: it takes the guard, resolves and
/// commits the ordered protocol, and releases the guard on every path
/// before returning. Failures other than reentrancy record a one-line
/// user-facing message.
pub fn run_transition(
    world: &mut World,
    actor: Entity,
) -> Result<TransitionOutcome, TransitionError> {
    if !world.maps.begin_transition() {
        log::debug!("transition requested while one is executing; ignoring");
        return Err(TransitionError::InProgress);
    }
    let result = execute(world, actor);
    // Single release point, success or failure.
    world.maps.end_transition();

    if let Err(err) = result {
        report_failure(world, err);
    }
    result
}

/// The ordered protocol. Everything that can fail happens up front, while
/// the world is still untouched; the commit sequence below the resolve
/// block cannot fail partway.
fn execute(world: &mut World, actor: Entity) -> Result<TransitionOutcome, TransitionError> {
    // Resolve.
    let source_id = world.maps.active().ok_or(TransitionError::NoActiveMap)?;
    let from = world
        .positions
        .get(&actor)
        .copied()
        .ok_or(TransitionError::MissingPosition)?;
    let source_tile = world
        .maps
        .get(source_id)
        .and_then(|map| map.tile(from.x, from.y));

    let (target_id, authored) = resolve_target(world, source_id, from)?;
    let landing = locate_landing(world, target_id, source_tile, authored);

    // Commit, strictly in order. The active pointer moves first; the
    // actor's context follows it so the two never disagree with the
    // context pointing ahead of the registry.
    world.maps.set_active(target_id, Some(from));
    world
        .map_contexts
        .insert(actor, MapContext { map: target_id });
    if let Some(pos) = world.positions.get_mut(&actor) {
        *pos = landing;
    }

    // Camera follows the actor onto the new grid.
    world.camera.center_on(landing);
    if let Some(map) = world.maps.get(target_id) {
        world.camera.clamp_to(map.width() as i32, map.height() as i32);
    }

    // Notify dependents only after all state has settled: downstream
    // turn consumers start the new map with a clean slate.
    world.turn_flags.reset();
    world.events.push(Event::MapChanged {
        entity: actor,
        from: source_id,
        to: target_id,
        turn: world.turn,
    });

    Ok(TransitionOutcome {
        map: target_id,
        landing,
    })
}

/// Target resolution: metadata on the current tile wins; plain stairs
/// fall back to the kind/level rule table. One strategy, one code path.
fn resolve_target(
    world: &World,
    source_id: MapId,
    from: Position,
) -> Result<(MapId, Option<Position>), TransitionError> {
    let map = world.maps.get(source_id).ok_or(TransitionError::NoActiveMap)?;

    if let Some(target) = map.transition_at(from.x, from.y) {
        if world.maps.get(target.map).is_none() {
            return Err(TransitionError::DanglingTarget);
        }
        return Ok((
            target.map,
            Some(Position {
                x: target.x,
                y: target.y,
            }),
        ));
    }

    let tile = map.tile(from.x, from.y).ok_or(TransitionError::NoExit)?;
    let (kind, level) =
        rule_target(map.kind(), map.level(), tile).ok_or(TransitionError::NoExit)?;
    let target = world
        .maps
        .find(kind, level)
        .ok_or(TransitionError::UnregisteredTarget { kind, level })?;
    Ok((target, None))
}

/// The built-in stairs rules. The overworld sits at depth 0; dungeon
/// levels count downward from 1.
fn rule_target(kind: MapKind, level: u32, tile: TileKind) -> Option<(MapKind, u32)> {
    match (kind, tile) {
        (MapKind::Overworld, TileKind::StairsDown) => Some((MapKind::Dungeon, 1)),
        (MapKind::Dungeon, TileKind::StairsDown) => Some((MapKind::Dungeon, level + 1)),
        (MapKind::Dungeon, TileKind::StairsUp) if level <= 1 => Some((MapKind::Overworld, 0)),
        (MapKind::Dungeon, TileKind::StairsUp) => Some((MapKind::Dungeon, level - 1)),
        _ => None,
    }
}

/// Landing search. A remembered position on a previously-visited target
/// beats everything; authored metadata coordinates beat the computed
/// search; the search itself prefers the reciprocal stairs tile, then a
/// uniformly-sampled floor tile, then the grid center.
fn locate_landing(
    world: &mut World,
    target_id: MapId,
    source_tile: Option<TileKind>,
    authored: Option<Position>,
) -> Position {
    if let Some(pos) = world.maps.last_position(target_id) {
        return pos;
    }
    if let Some(pos) = authored {
        return pos;
    }

    let Some(map) = world.maps.get(target_id) else {
        // resolve_target verified the id; only reachable if the registry
        // were mutated mid-call.
        log::error!("landing search on unregistered map {:?}", target_id);
        return Position { x: 0, y: 0 };
    };

    if let Some(want) = source_tile.and_then(TileKind::reciprocal_stairs)
        && let Some(pos) = map.find_tile(want)
    {
        return pos;
    }

    let floors = map.floor_tiles();
    let center = map.center();
    if floors.is_empty() {
        return center;
    }
    let idx = world.rng.random_range(0..floors.len());
    floors[idx]
}

/// One-line feedback for everything except reentrancy, which stays
/// silent apart from the log.
fn report_failure(world: &mut World, err: TransitionError) {
    let turn = world.turn;
    match err {
        TransitionError::InProgress => {}
        TransitionError::NoExit => {
            world.events.push(Event::Message {
                text: "You can't go that way.".to_string(),
                turn,
            });
        }
        TransitionError::NoActiveMap | TransitionError::MissingPosition => {
            log::warn!("transition aborted: {}", err);
            world.events.push(Event::Message {
                text: err.to_string(),
                turn,
            });
        }
        TransitionError::UnregisteredTarget { .. } | TransitionError::DanglingTarget => {
            log::error!("transition aborted: {}", err);
            world.events.push(Event::Message {
                text: err.to_string(),
                turn,
            });
        }
    }
}
