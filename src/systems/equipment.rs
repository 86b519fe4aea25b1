use thiserror::Error;

use crate::components::{Entity, EquipSlot, Equipped};
use crate::events::Event;
use crate::world::World;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum EquipError {
    #[error("you are not carrying that")]
    NotCarried,
    #[error("it cannot be equipped")]
    NotEquippable,
}

/// Everything `owner` is carrying, in stable id order. Inventory cursors
/// index into this list, so the order must not depend on hash iteration.
pub fn carried_items(world: &World, owner: Entity) -> Vec<Entity> {
    let mut items: Vec<Entity> = world
        .carried_by
        .iter()
        .filter(|(_, c)| c.owner == owner)
        .map(|(&e, _)| e)
        .collect();
    items.sort_by_key(|e| e.0);
    items
}

/// The item `actor` has in `slot`, if any.
pub fn item_in_slot(world: &World, actor: Entity, slot: EquipSlot) -> Option<Entity> {
    world
        .equipped
        .iter()
        .find(|(_, eq)| eq.owner == actor && eq.slot == slot)
        .map(|(&e, _)| e)
}

/// Equip a carried item into its native slot.
pub fn equip_item(world: &mut World, actor: Entity, item: Entity) -> Result<EquipSlot, EquipError> {
    let slot = world
        .equippables
        .get(&item)
        .ok_or(EquipError::NotEquippable)?
        .slot;
    equip_item_in(world, actor, item, slot)
}

/// Equip a carried item into an explicit slot. All displaced items come
/// off before the new one goes on, so the event stream never shows two
/// things occupying one slot.
pub fn equip_item_in(
    world: &mut World,
    actor: Entity,
    item: Entity,
    slot: EquipSlot,
) -> Result<EquipSlot, EquipError> {
    match world.carried_by.get(&item) {
        Some(c) if c.owner == actor => {}
        _ => return Err(EquipError::NotCarried),
    }
    if !world.equippables.contains_key(&item) {
        return Err(EquipError::NotEquippable);
    }

    // The item may already be worn elsewhere: take it off first.
    if let Some(current) = world.equipped.get(&item).copied()
        && current.slot != slot
    {
        unequip_item(world, actor, item, current.slot);
    }
    // Whatever occupies the target slot comes off too.
    if let Some(displaced) = item_in_slot(world, actor, slot)
        && displaced != item
    {
        unequip_item(world, actor, displaced, slot);
    }

    world.equipped.insert(item, Equipped { owner: actor, slot });
    world.events.push(Event::ItemEquipped {
        actor,
        item,
        slot,
        turn: world.turn,
    });
    Ok(slot)
}

/// Remove whatever `actor` has in `slot`. Returns the removed item.
pub fn unequip_slot(world: &mut World, actor: Entity, slot: EquipSlot) -> Option<Entity> {
    let item = item_in_slot(world, actor, slot)?;
    unequip_item(world, actor, item, slot);
    Some(item)
}

fn unequip_item(world: &mut World, actor: Entity, item: Entity, slot: EquipSlot) {
    world.equipped.remove(&item);
    world.events.push(Event::ItemUnequipped {
        actor,
        item,
        slot,
        turn: world.turn,
    });
}
