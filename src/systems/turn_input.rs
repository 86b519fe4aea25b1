use crate::components::{Direction, Entity};
use crate::events::Event;
use crate::input::{GameKey, InputSnapshot, KeyBindings};
use crate::loading::InputConfig;
use crate::systems::equipment;
use crate::systems::movement::{MoveIntent, MoveOutcome, resolve_move};
use crate::systems::transition::run_transition;
use crate::world::World;

/// Which surface owns the keyboard this frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UiMode {
    /// Keys drive the actor on the map.
    Normal,
    /// The inventory list is open and the cursor walks it.
    Inventory { cursor: usize },
    /// A single item's detail view, reached from the inventory. Keeps
    /// the list cursor so backing out restores it.
    ItemDetail { cursor: usize, item: Entity },
}

/// Translates raw key state into at most one turn-consuming action per
/// frame. Owns the key-repeat clock and the modal state.
///
/// Repeat works on a deficit timer: a fresh press fires immediately and
/// arms `initial_delay`; once that runs out every `repeat_delay` seconds
/// fires again. The timer is decremented by frame time and re-armed by
/// addition, so overshoot on a slow frame shortens the next interval
/// instead of being dropped.
pub struct TurnTranslator {
    pub mode: UiMode,
    initial_delay: f32,
    repeat_delay: f32,
    held_dir: Option<Direction>,
    repeat_timer: f32,
}

impl TurnTranslator {
    pub fn new(config: &InputConfig) -> Self {
        Self {
            mode: UiMode::Normal,
            initial_delay: config.initial_delay,
            repeat_delay: config.repeat_delay,
            held_dir: None,
            repeat_timer: 0.0,
        }
    }

    pub fn update(
        &mut self,
        world: &mut World,
        bindings: &KeyBindings,
        input: &InputSnapshot,
        dt: f32,
    ) {
        match self.mode {
            UiMode::Normal => self.update_normal(world, bindings, input, dt),
            UiMode::Inventory { cursor } => self.update_inventory(world, bindings, input, cursor),
            UiMode::ItemDetail { cursor, item } => {
                self.update_detail(world, bindings, input, cursor, item)
            }
        }
    }

    fn update_normal(
        &mut self,
        world: &mut World,
        bindings: &KeyBindings,
        input: &InputSnapshot,
        dt: f32,
    ) {
        let Some(player) = world.player else {
            return;
        };
        if !world.positions.contains_key(&player) {
            // Nothing to act on without a tile underfoot.
            return;
        }

        if bindings.just_pressed(input, GameKey::Inventory) {
            self.mode = UiMode::Inventory { cursor: 0 };
            self.clear_held();
            return;
        }
        if bindings.just_pressed(input, GameKey::Examine) {
            examine(world, player);
            return;
        }
        if bindings.just_pressed(input, GameKey::Rest) {
            world.events.push(Event::Rested {
                entity: player,
                turn: world.turn,
            });
            complete_turn(world, player);
            return;
        }
        if bindings.just_pressed(input, GameKey::Confirm) {
            // Travel through whatever exit is underfoot. A refused
            // attempt costs nothing.
            if run_transition(world, player).is_ok() {
                complete_turn(world, player);
            }
            return;
        }

        self.update_movement(world, bindings, input, dt);
    }

    fn update_movement(
        &mut self,
        world: &mut World,
        bindings: &KeyBindings,
        input: &InputSnapshot,
        dt: f32,
    ) {
        let Some(dir) = current_direction(bindings, input) else {
            self.clear_held();
            return;
        };

        if self.held_dir != Some(dir) {
            // Fresh press, or the held direction changed. Fire now and
            // arm the long delay.
            self.held_dir = Some(dir);
            self.repeat_timer = self.initial_delay;
            self.step(world, dir);
            return;
        }

        self.repeat_timer -= dt;
        if self.repeat_timer <= 0.0 {
            self.repeat_timer += self.repeat_delay;
            self.step(world, dir);
        }
    }

    /// Issue one step intent for the player and spend the turn on any
    /// ruled outcome. Blocked steps cost the turn like landed ones; only
    /// an abort (missing data) leaves the turn open.
    fn step(&mut self, world: &mut World, dir: Direction) {
        let Some(player) = world.player else {
            return;
        };
        let Some(from) = world.positions.get(&player).copied() else {
            return;
        };
        let intent = MoveIntent {
            entity: player,
            from,
            to: dir.step_from(from),
            dir,
        };
        match resolve_move(world, intent) {
            MoveOutcome::Moved => {
                recenter_camera(world, player);
                complete_turn(world, player);
            }
            MoveOutcome::BlockedByTerrain | MoveOutcome::BlockedByEntity(_) => {
                complete_turn(world, player);
            }
            MoveOutcome::Aborted => {}
        }
    }

    fn update_inventory(
        &mut self,
        world: &mut World,
        bindings: &KeyBindings,
        input: &InputSnapshot,
        cursor: usize,
    ) {
        let Some(player) = world.player else {
            self.mode = UiMode::Normal;
            return;
        };
        if bindings.just_pressed(input, GameKey::Back)
            || bindings.just_pressed(input, GameKey::Inventory)
        {
            self.mode = UiMode::Normal;
            return;
        }

        // Menu navigation reacts to edges only; holding a key does not
        // scroll.
        let items = equipment::carried_items(world, player);
        let mut cursor = cursor.min(items.len().saturating_sub(1));
        if bindings.just_pressed(input, GameKey::MoveNorth) {
            cursor = cursor.saturating_sub(1);
        }
        if bindings.just_pressed(input, GameKey::MoveSouth) && cursor + 1 < items.len() {
            cursor += 1;
        }
        if bindings.just_pressed(input, GameKey::Confirm)
            && let Some(&item) = items.get(cursor)
        {
            self.mode = UiMode::ItemDetail { cursor, item };
            return;
        }
        self.mode = UiMode::Inventory { cursor };
    }

    fn update_detail(
        &mut self,
        world: &mut World,
        bindings: &KeyBindings,
        input: &InputSnapshot,
        cursor: usize,
        item: Entity,
    ) {
        let Some(player) = world.player else {
            self.mode = UiMode::Normal;
            return;
        };
        if bindings.just_pressed(input, GameKey::Back) {
            self.mode = UiMode::Inventory { cursor };
            return;
        }
        if bindings.just_pressed(input, GameKey::Confirm) {
            match equipment::equip_item(world, player, item) {
                Ok(_) => {
                    // Equipping closes the whole modal stack and spends
                    // the turn.
                    self.mode = UiMode::Normal;
                    complete_turn(world, player);
                }
                Err(err) => {
                    world.events.push(Event::Message {
                        text: format!("Failed to equip item: {err}."),
                        turn: world.turn,
                    });
                }
            }
        }
    }

    fn clear_held(&mut self) {
        self.held_dir = None;
        self.repeat_timer = 0.0;
    }
}

/// Held movement key with the highest priority, north before south
/// before west before east. Ties between simultaneously held keys stay
/// stable from frame to frame.
fn current_direction(bindings: &KeyBindings, input: &InputSnapshot) -> Option<Direction> {
    const ORDER: [GameKey; 4] = [
        GameKey::MoveNorth,
        GameKey::MoveSouth,
        GameKey::MoveWest,
        GameKey::MoveEast,
    ];
    ORDER
        .iter()
        .find(|&&key| bindings.held(input, key))
        .and_then(|&key| key.direction())
}

/// Close out the acting entity's turn: emit the completion signal, then
/// advance the counter and reset the per-turn flags.
pub fn complete_turn(world: &mut World, entity: Entity) {
    world.events.push(Event::TurnCompleted {
        entity,
        turn: world.turn,
    });
    world.turn.0 += 1;
    world.turn_flags.reset();
}

/// Describe the tile underfoot. Free, spends no turn.
pub fn examine(world: &mut World, entity: Entity) {
    let Some(at) = world.positions.get(&entity).copied() else {
        return;
    };
    let Some(tile) = world.maps.active_map().and_then(|m| m.tile(at.x, at.y)) else {
        log::warn!("examine with no active map under the actor");
        return;
    };
    let turn = world.turn;
    world.events.push(Event::MapExamined {
        entity,
        at,
        tile,
        turn,
    });
    world.events.push(Event::Message {
        text: format!("You see {}.", tile.description()),
        turn,
    });
}

fn recenter_camera(world: &mut World, entity: Entity) {
    let Some(pos) = world.positions.get(&entity).copied() else {
        return;
    };
    world.camera.center_on(pos);
    if let Some(map) = world.maps.active_map() {
        world.camera.clamp_to(map.width() as i32, map.height() as i32);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::{Blocker, CarriedBy, Equippable, EquipSlot, MapContext, Position};
    use crate::maps::{MapInstance, MapKind, TileKind};
    use winit::keyboard::KeyCode;

    fn test_world() -> (World, TurnTranslator, KeyBindings) {
        let mut world = World::new_with_seed(99);
        let map = world
            .maps
            .register(MapInstance::new(MapKind::Dungeon, 1, 10, 10));
        world.maps.set_active(map, None);
        let player = world.spawn();
        world.positions.insert(player, Position { x: 5, y: 5 });
        world.map_contexts.insert(player, MapContext { map });
        world.blockers.insert(player, Blocker);
        world.player = Some(player);

        // Timing chosen so the arithmetic below is exact in f32.
        let translator = TurnTranslator::new(&InputConfig {
            initial_delay: 0.5,
            repeat_delay: 0.25,
        });
        (world, translator, KeyBindings::defaults())
    }

    fn player_pos(world: &World) -> Position {
        let player = world.player.unwrap();
        world.positions[&player]
    }

    fn moved_count(world: &World) -> usize {
        world
            .events
            .iter()
            .filter(|e| matches!(e, Event::Moved { .. }))
            .count()
    }

    #[test]
    fn test_fresh_press_fires_immediately() {
        let (mut world, mut translator, bindings) = test_world();
        let mut input = InputSnapshot::new();

        input.press(KeyCode::ArrowUp);
        translator.update(&mut world, &bindings, &input, 0.016);

        assert_eq!(player_pos(&world), Position { x: 5, y: 4 });
        assert_eq!(world.turn.0, 1);
    }

    #[test]
    fn test_hold_waits_out_the_initial_delay_then_repeats() {
        let (mut world, mut translator, bindings) = test_world();
        let mut input = InputSnapshot::new();

        input.press(KeyCode::ArrowUp);
        translator.update(&mut world, &bindings, &input, 0.125);
        input.end_frame();
        assert_eq!(moved_count(&world), 1);

        // 0.375 seconds of holding: still inside the initial delay.
        for _ in 0..3 {
            translator.update(&mut world, &bindings, &input, 0.125);
        }
        assert_eq!(moved_count(&world), 1);

        // The delay expires here.
        translator.update(&mut world, &bindings, &input, 0.125);
        assert_eq!(moved_count(&world), 2);

        // From now on one step per 0.25 seconds.
        translator.update(&mut world, &bindings, &input, 0.125);
        assert_eq!(moved_count(&world), 2);
        translator.update(&mut world, &bindings, &input, 0.125);
        assert_eq!(moved_count(&world), 3);
    }

    #[test]
    fn test_overshoot_carries_into_the_next_interval() {
        let (mut world, mut translator, bindings) = test_world();
        let mut input = InputSnapshot::new();

        input.press(KeyCode::ArrowUp);
        translator.update(&mut world, &bindings, &input, 0.125);
        input.end_frame();
        assert_eq!(moved_count(&world), 1);

        // One slow frame blows 0.125 past the initial delay. The excess
        // counts against the repeat interval that follows.
        translator.update(&mut world, &bindings, &input, 0.625);
        assert_eq!(moved_count(&world), 2);
        translator.update(&mut world, &bindings, &input, 0.125);
        assert_eq!(moved_count(&world), 3);
    }

    #[test]
    fn test_release_and_repress_fires_fresh() {
        let (mut world, mut translator, bindings) = test_world();
        let mut input = InputSnapshot::new();

        input.press(KeyCode::ArrowUp);
        translator.update(&mut world, &bindings, &input, 0.125);
        input.end_frame();

        input.release(KeyCode::ArrowUp);
        translator.update(&mut world, &bindings, &input, 0.125);
        input.end_frame();

        input.press(KeyCode::ArrowUp);
        translator.update(&mut world, &bindings, &input, 0.125);

        // No waiting out the initial delay on the second press.
        assert_eq!(moved_count(&world), 2);
    }

    #[test]
    fn test_direction_change_fires_fresh() {
        let (mut world, mut translator, bindings) = test_world();
        let mut input = InputSnapshot::new();

        input.press(KeyCode::ArrowUp);
        translator.update(&mut world, &bindings, &input, 0.125);
        input.end_frame();

        input.release(KeyCode::ArrowUp);
        input.press(KeyCode::ArrowDown);
        translator.update(&mut world, &bindings, &input, 0.125);

        assert_eq!(moved_count(&world), 2);
        assert_eq!(player_pos(&world), Position { x: 5, y: 5 });
    }

    #[test]
    fn test_north_takes_priority_over_east() {
        let (mut world, mut translator, bindings) = test_world();
        let mut input = InputSnapshot::new();

        input.press(KeyCode::ArrowUp);
        input.press(KeyCode::ArrowRight);
        translator.update(&mut world, &bindings, &input, 0.125);

        assert_eq!(player_pos(&world), Position { x: 5, y: 4 });
    }

    #[test]
    fn test_blocked_step_still_spends_the_turn() {
        let (mut world, mut translator, bindings) = test_world();
        let map = world.maps.active().unwrap();
        world
            .maps
            .get_mut(map)
            .unwrap()
            .set_tile(5, 4, TileKind::Wall);
        let mut input = InputSnapshot::new();

        input.press(KeyCode::ArrowUp);
        translator.update(&mut world, &bindings, &input, 0.125);

        assert_eq!(player_pos(&world), Position { x: 5, y: 5 });
        assert_eq!(world.turn.0, 1);
        let signals = world
            .events
            .iter()
            .filter(|e| {
                matches!(
                    e,
                    Event::Moved { .. } | Event::MoveBlocked { .. } | Event::Collision { .. }
                )
            })
            .count();
        assert_eq!(signals, 1);
    }

    #[test]
    fn test_inventory_intercepts_movement_for_free() {
        let (mut world, mut translator, bindings) = test_world();
        let mut input = InputSnapshot::new();

        input.press(KeyCode::KeyI);
        translator.update(&mut world, &bindings, &input, 0.125);
        input.end_frame();
        assert_eq!(translator.mode, UiMode::Inventory { cursor: 0 });
        assert_eq!(world.turn.0, 0);

        input.press(KeyCode::ArrowUp);
        translator.update(&mut world, &bindings, &input, 0.125);

        // The cursor took the key; the actor never moved.
        assert_eq!(player_pos(&world), Position { x: 5, y: 5 });
        assert_eq!(world.turn.0, 0);
        assert_eq!(moved_count(&world), 0);
    }

    #[test]
    fn test_escape_closes_the_inventory() {
        let (mut world, mut translator, bindings) = test_world();
        let mut input = InputSnapshot::new();

        input.press(KeyCode::KeyI);
        translator.update(&mut world, &bindings, &input, 0.125);
        input.end_frame();

        input.press(KeyCode::Escape);
        translator.update(&mut world, &bindings, &input, 0.125);

        assert_eq!(translator.mode, UiMode::Normal);
        assert_eq!(world.turn.0, 0);
    }

    #[test]
    fn test_examine_is_free() {
        let (mut world, mut translator, bindings) = test_world();
        let mut input = InputSnapshot::new();

        input.press(KeyCode::KeyX);
        translator.update(&mut world, &bindings, &input, 0.125);

        assert_eq!(world.turn.0, 0);
        assert!(world.events.iter().any(|e| matches!(
            e,
            Event::MapExamined {
                tile: TileKind::Floor,
                ..
            }
        )));
    }

    #[test]
    fn test_rest_spends_the_turn() {
        let (mut world, mut translator, bindings) = test_world();
        let mut input = InputSnapshot::new();

        input.press(KeyCode::KeyR);
        translator.update(&mut world, &bindings, &input, 0.125);

        assert_eq!(world.turn.0, 1);
        assert!(
            world
                .events
                .iter()
                .any(|e| matches!(e, Event::Rested { .. }))
        );
        assert!(
            world
                .events
                .iter()
                .any(|e| matches!(e, Event::TurnCompleted { .. }))
        );
    }

    #[test]
    fn test_equip_through_the_detail_view() {
        let (mut world, mut translator, bindings) = test_world();
        let player = world.player.unwrap();
        let helm = world.spawn();
        world.carried_by.insert(helm, CarriedBy { owner: player });
        world.equippables.insert(
            helm,
            Equippable {
                slot: EquipSlot::Head,
            },
        );
        let mut input = InputSnapshot::new();

        input.press(KeyCode::KeyI);
        translator.update(&mut world, &bindings, &input, 0.125);
        input.end_frame();

        input.press(KeyCode::Enter);
        translator.update(&mut world, &bindings, &input, 0.125);
        input.end_frame();
        assert_eq!(
            translator.mode,
            UiMode::ItemDetail {
                cursor: 0,
                item: helm
            }
        );

        input.release(KeyCode::Enter);
        input.press(KeyCode::Enter);
        translator.update(&mut world, &bindings, &input, 0.125);

        assert_eq!(translator.mode, UiMode::Normal);
        assert_eq!(world.turn.0, 1);
        assert!(world.events.iter().any(|e| matches!(
            e,
            Event::ItemEquipped { item, .. } if *item == helm
        )));
    }

    #[test]
    fn test_failed_equip_reports_and_costs_nothing() {
        let (mut world, mut translator, bindings) = test_world();
        let player = world.player.unwrap();
        // Carried but not equippable.
        let rock = world.spawn();
        world.carried_by.insert(rock, CarriedBy { owner: player });
        let mut input = InputSnapshot::new();

        input.press(KeyCode::KeyI);
        translator.update(&mut world, &bindings, &input, 0.125);
        input.end_frame();
        input.press(KeyCode::Enter);
        translator.update(&mut world, &bindings, &input, 0.125);
        input.end_frame();
        input.release(KeyCode::Enter);
        input.press(KeyCode::Enter);
        translator.update(&mut world, &bindings, &input, 0.125);

        assert_eq!(world.turn.0, 0);
        assert!(world.events.iter().any(|e| matches!(
            e,
            Event::Message { text, .. } if text == "Failed to equip item: it cannot be equipped."
        )));
        // Still in the detail view so the player can back out.
        assert!(matches!(translator.mode, UiMode::ItemDetail { .. }));
    }

    #[test]
    fn test_backing_out_of_the_detail_keeps_the_cursor() {
        let (mut world, mut translator, bindings) = test_world();
        let player = world.player.unwrap();
        let first = world.spawn();
        world.carried_by.insert(first, CarriedBy { owner: player });
        let second = world.spawn();
        world.carried_by.insert(second, CarriedBy { owner: player });
        let mut input = InputSnapshot::new();

        input.press(KeyCode::KeyI);
        translator.update(&mut world, &bindings, &input, 0.125);
        input.end_frame();

        // Walk the cursor down one row, then open that item.
        input.press(KeyCode::ArrowDown);
        translator.update(&mut world, &bindings, &input, 0.125);
        input.end_frame();
        input.press(KeyCode::Enter);
        translator.update(&mut world, &bindings, &input, 0.125);
        input.end_frame();
        assert_eq!(
            translator.mode,
            UiMode::ItemDetail {
                cursor: 1,
                item: second
            }
        );

        input.press(KeyCode::Escape);
        translator.update(&mut world, &bindings, &input, 0.125);

        assert_eq!(translator.mode, UiMode::Inventory { cursor: 1 });
        assert_eq!(world.turn.0, 0);
    }

    #[test]
    fn test_held_walk_does_not_leak_through_a_modal() {
        let (mut world, mut translator, bindings) = test_world();
        let mut input = InputSnapshot::new();

        input.press(KeyCode::ArrowUp);
        translator.update(&mut world, &bindings, &input, 0.125);
        input.end_frame();
        assert_eq!(moved_count(&world), 1);

        // Open and close the inventory while the walk key stays down.
        input.press(KeyCode::KeyI);
        translator.update(&mut world, &bindings, &input, 0.125);
        input.end_frame();
        input.press(KeyCode::Escape);
        translator.update(&mut world, &bindings, &input, 0.125);
        input.end_frame();
        assert_eq!(moved_count(&world), 1);

        // Back in normal mode the still-held key counts as a fresh
        // press, not a resumed cadence.
        translator.update(&mut world, &bindings, &input, 0.125);
        assert_eq!(moved_count(&world), 2);
        translator.update(&mut world, &bindings, &input, 0.125);
        assert_eq!(moved_count(&world), 2);
    }

    #[test]
    fn test_confirm_on_stairs_travels_and_spends_the_turn() {
        let (mut world, mut translator, bindings) = test_world();
        let d1 = world.maps.active().unwrap();
        world
            .maps
            .get_mut(d1)
            .unwrap()
            .set_tile(5, 5, TileKind::StairsDown);
        let d2 = world
            .maps
            .register(MapInstance::new(MapKind::Dungeon, 2, 10, 10));
        let mut input = InputSnapshot::new();

        input.press(KeyCode::Enter);
        translator.update(&mut world, &bindings, &input, 0.125);

        assert_eq!(world.maps.active(), Some(d2));
        assert_eq!(world.turn.0, 1);
        assert!(
            world
                .events
                .iter()
                .any(|e| matches!(e, Event::MapChanged { .. }))
        );
    }

    #[test]
    fn test_confirm_on_plain_floor_costs_nothing() {
        let (mut world, mut translator, bindings) = test_world();
        let mut input = InputSnapshot::new();

        input.press(KeyCode::Enter);
        translator.update(&mut world, &bindings, &input, 0.125);

        assert_eq!(world.turn.0, 0);
        assert!(world.events.iter().any(|e| matches!(
            e,
            Event::Message { text, .. } if text == "You can't go that way."
        )));
    }

    #[test]
    fn test_no_player_is_a_quiet_noop() {
        let (mut world, mut translator, bindings) = test_world();
        world.player = None;
        let mut input = InputSnapshot::new();

        input.press(KeyCode::ArrowUp);
        input.press(KeyCode::KeyR);
        translator.update(&mut world, &bindings, &input, 0.125);

        assert_eq!(world.turn.0, 0);
        assert_eq!(world.events.iter().count(), 0);
    }

    #[test]
    fn test_no_position_is_a_quiet_noop() {
        let (mut world, mut translator, bindings) = test_world();
        let player = world.player.unwrap();
        world.positions.remove(&player);
        let mut input = InputSnapshot::new();

        input.press(KeyCode::KeyR);
        translator.update(&mut world, &bindings, &input, 0.125);
        input.end_frame();

        input.release(KeyCode::KeyR);
        input.press(KeyCode::ArrowUp);
        translator.update(&mut world, &bindings, &input, 0.125);

        assert_eq!(world.turn.0, 0);
        assert_eq!(world.events.iter().count(), 0);
    }
}
