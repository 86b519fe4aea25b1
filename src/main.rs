//! Scripted play session against the turn core. Drives the input
//! translator with a fixed keyboard script, then prints the session
//! transcript and the final map. No window, no renderer.

#![allow(dead_code)]

use std::collections::HashMap;

use winit::keyboard::KeyCode;

mod camera;
mod components;
mod events;
mod input;
mod loading;
mod maps;
mod systems;
mod world;

use components::{Blocker, CarriedBy, Entity, EquipSlot, Equippable, MapContext, Name, Position};
use events::Event;
use input::InputSnapshot;
use maps::{MapId, MapInstance, MapKind, TileKind};
use systems::turn_input::TurnTranslator;
use world::World;

/// Fixed frame time the scripted session advances by.
const FRAME_DT: f32 = 1.0 / 60.0;

/// One scripted keyboard action.
enum Step {
    Press(KeyCode),
    Release(KeyCode),
    /// Run this many frames with the current key state.
    Wait(u32),
}

use Step::{Press, Release, Wait};

/// Press and release a key across two frames.
fn tap(steps: &mut Vec<Step>, code: KeyCode) {
    steps.push(Press(code));
    steps.push(Wait(1));
    steps.push(Release(code));
    steps.push(Wait(1));
}

fn script() -> Vec<Step> {
    let mut s = Vec::new();

    // Walk east to the cave mouth, look at it, climb down.
    tap(&mut s, KeyCode::ArrowRight);
    tap(&mut s, KeyCode::ArrowRight);
    tap(&mut s, KeyCode::KeyX);
    tap(&mut s, KeyCode::Enter);

    // Bump the wall north of the landing, then greet the rat east of it.
    tap(&mut s, KeyCode::ArrowUp);
    tap(&mut s, KeyCode::ArrowRight);
    tap(&mut s, KeyCode::ArrowRight);

    // Hold south. One immediate step, the initial pause, then the repeat
    // cadence walks the corridor until the south wall stops it.
    s.push(Press(KeyCode::ArrowDown));
    s.push(Wait(75));
    s.push(Release(KeyCode::ArrowDown));
    s.push(Wait(1));

    // East along the open row to the lower stairs, and down.
    for _ in 0..5 {
        tap(&mut s, KeyCode::ArrowRight);
    }
    tap(&mut s, KeyCode::Enter);

    // Gear up through the inventory, then rest.
    tap(&mut s, KeyCode::KeyI);
    tap(&mut s, KeyCode::ArrowDown);
    tap(&mut s, KeyCode::Enter);
    tap(&mut s, KeyCode::Enter);
    tap(&mut s, KeyCode::KeyR);

    // Check the tile underfoot and climb back to where we left level 1.
    tap(&mut s, KeyCode::KeyX);
    tap(&mut s, KeyCode::Enter);

    s
}

fn border_walls(map: &mut MapInstance) {
    let (w, h) = (map.width() as i32, map.height() as i32);
    for x in 0..w {
        map.set_tile(x, 0, TileKind::Wall);
        map.set_tile(x, h - 1, TileKind::Wall);
    }
    for y in 0..h {
        map.set_tile(0, y, TileKind::Wall);
        map.set_tile(w - 1, y, TileKind::Wall);
    }
}

/// Three-map set: an open overworld with a cave mouth, a bordered first
/// level split by a wall spur, and a bare second level.
fn build_level_set(world: &mut World) {
    let mut surface = MapInstance::new(MapKind::Overworld, 0, 16, 12);
    surface.set_tile(8, 6, TileKind::StairsDown);
    let surface = world.maps.register(surface);

    let mut upper = MapInstance::new(MapKind::Dungeon, 1, 11, 9);
    border_walls(&mut upper);
    for y in 2..=6 {
        upper.set_tile(5, y, TileKind::Wall);
    }
    upper.set_tile(2, 1, TileKind::StairsUp);
    upper.set_tile(8, 7, TileKind::StairsDown);
    world.maps.register(upper);

    let mut lower = MapInstance::new(MapKind::Dungeon, 2, 11, 9);
    border_walls(&mut lower);
    lower.set_tile(5, 4, TileKind::StairsUp);
    world.maps.register(lower);

    world.maps.set_active(surface, None);
}

fn spawn_player(world: &mut World) -> Entity {
    let map = world.maps.active().expect("level set registered");
    let player = world.spawn();
    world.names.insert(
        player,
        Name {
            value: "Wanderer".to_string(),
        },
    );
    world.positions.insert(player, Position { x: 6, y: 6 });
    world.map_contexts.insert(player, MapContext { map });
    world.blockers.insert(player, Blocker);
    world.player = Some(player);
    player
}

fn spawn_rat(world: &mut World) {
    let map = world
        .maps
        .find(MapKind::Dungeon, 1)
        .expect("dungeon level 1 registered");
    let rat = world.spawn();
    world.names.insert(
        rat,
        Name {
            value: "Rat".to_string(),
        },
    );
    world.positions.insert(rat, Position { x: 4, y: 1 });
    world.map_contexts.insert(rat, MapContext { map });
    world.blockers.insert(rat, Blocker);
}

fn give_starting_gear(world: &mut World, player: Entity) {
    let gear = [
        ("iron helm", EquipSlot::Head),
        ("oak shield", EquipSlot::OffHand),
        ("short sword", EquipSlot::MainHand),
    ];
    for (name, slot) in gear {
        let item = world.spawn();
        world.names.insert(
            item,
            Name {
                value: name.to_string(),
            },
        );
        world.carried_by.insert(item, CarriedBy { owner: player });
        world.equippables.insert(item, Equippable { slot });
    }
}

fn map_label(world: &World, id: MapId) -> String {
    match world.maps.get(id) {
        Some(m) => match m.kind() {
            MapKind::Overworld => "the overworld".to_string(),
            MapKind::Dungeon => format!("dungeon level {}", m.level()),
        },
        None => "parts unknown".to_string(),
    }
}

/// One transcript line per event, or None for bookkeeping records the
/// transcript leaves out.
fn format_event(world: &World, event: &Event) -> Option<String> {
    match event {
        Event::MoveIntent { .. } | Event::TurnCompleted { .. } | Event::MapExamined { .. } => None,
        Event::Moved { entity, to, .. } => Some(format!(
            "{} steps to ({}, {})",
            world.name_of(*entity),
            to.x,
            to.y
        )),
        Event::MoveBlocked { entity, at, .. } => Some(format!(
            "{} is stopped by the wall at ({}, {})",
            world.name_of(*entity),
            at.x,
            at.y
        )),
        Event::Collision {
            mover, occupant, ..
        } => Some(format!(
            "{} bumps into {}",
            world.name_of(*mover),
            world.name_of(*occupant)
        )),
        Event::Rested { entity, .. } => Some(format!("{} rests", world.name_of(*entity))),
        Event::MapChanged { entity, to, .. } => Some(format!(
            "{} travels to {}",
            world.name_of(*entity),
            map_label(world, *to)
        )),
        Event::ItemUnequipped {
            actor, item, slot, ..
        } => Some(format!(
            "{} takes {} off the {}",
            world.name_of(*actor),
            world.name_of(*item),
            slot.label()
        )),
        Event::ItemEquipped {
            actor, item, slot, ..
        } => Some(format!(
            "{} puts {} on the {}",
            world.name_of(*actor),
            world.name_of(*item),
            slot.label()
        )),
        Event::Message { text, .. } => Some(text.clone()),
    }
}

fn print_transcript(world: &World) {
    println!("--- session transcript ---");
    for event in world.events.iter() {
        if let Some(line) = format_event(world, event) {
            println!("[t{:>3}] {}", event.turn().0, line);
        }
    }
}

fn tile_char(tile: TileKind) -> char {
    match tile {
        TileKind::Floor => '.',
        TileKind::Wall => '#',
        TileKind::StairsUp => '<',
        TileKind::StairsDown => '>',
    }
}

/// Render the active map as text, entities overlaid on terrain. The
/// player is drawn last so it wins a shared tile.
fn render_active_map(world: &World) -> String {
    let Some(active) = world.maps.active() else {
        return String::new();
    };
    let Some(map) = world.maps.get(active) else {
        return String::new();
    };
    let width = map.width();
    let height = map.height();

    let mut grid: Vec<Vec<char>> = Vec::with_capacity(height);
    for y in 0..height {
        let mut row = Vec::with_capacity(width);
        for x in 0..width {
            row.push(map.tile(x as i32, y as i32).map_or(' ', tile_char));
        }
        grid.push(row);
    }

    let mut icons: HashMap<(usize, usize), char> = HashMap::new();
    for (&entity, pos) in &world.positions {
        if !world.alive.contains(&entity) {
            continue;
        }
        let on_active = world
            .map_contexts
            .get(&entity)
            .is_some_and(|ctx| ctx.map == active);
        if !on_active || pos.x < 0 || pos.y < 0 {
            continue;
        }
        let (ux, uy) = (pos.x as usize, pos.y as usize);
        if ux >= width || uy >= height {
            continue;
        }
        let ch = if world.player == Some(entity) {
            '@'
        } else {
            world
                .name_of(entity)
                .chars()
                .next()
                .map_or('?', |c| c.to_ascii_lowercase())
        };
        if world.player == Some(entity) {
            icons.insert((ux, uy), ch);
        } else {
            icons.entry((ux, uy)).or_insert(ch);
        }
    }
    for ((x, y), ch) in &icons {
        grid[*y][*x] = *ch;
    }

    let mut result = String::with_capacity((width + 1) * height);
    for (i, row) in grid.iter().enumerate() {
        if i > 0 {
            result.push('\n');
        }
        for &ch in row {
            result.push(ch);
        }
    }
    result
}

fn main() {
    env_logger::init();

    let config = loading::load_input_config("data/input.ron");
    let bindings = loading::load_bindings("data/bindings.kdl");

    let mut world = World::new_with_seed(42);
    build_level_set(&mut world);
    let player = spawn_player(&mut world);
    spawn_rat(&mut world);
    give_starting_gear(&mut world, player);

    let mut translator = TurnTranslator::new(&config);
    let mut input = InputSnapshot::new();

    for step in script() {
        match step {
            Press(code) => input.press(code),
            Release(code) => input.release(code),
            Wait(frames) => {
                for _ in 0..frames {
                    translator.update(&mut world, &bindings, &input, FRAME_DT);
                    #[cfg(debug_assertions)]
                    world::validate_world(&world);
                    input.end_frame();
                }
            }
        }
    }

    print_transcript(&world);
    println!();
    println!("{}", render_active_map(&world));
    println!(
        "turn {} | {} | camera ({}, {})",
        world.turn.0,
        world
            .maps
            .active()
            .map_or_else(|| "nowhere".to_string(), |id| map_label(&world, id)),
        world.camera.x,
        world.camera.y
    );
}
