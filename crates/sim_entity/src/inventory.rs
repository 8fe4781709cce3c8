//! Per-player item storage.
//!
//! The simulation core never reads an inventory; administrative tooling does,
//! through [`Inventory::list_items`] and [`Inventory::remove_items`].

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use sim_data::ItemType;
use tracing::debug;

/// One stack (or one unique item) in an inventory.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameItem {
    /// Inventory-unique handle. Assigned by [`Inventory::add_item`].
    pub guid: u64,
    pub item_id: u32,
    pub item_type: ItemType,
    /// Rarity, from the item's static data.
    pub rank: u32,
    pub level: u32,
    pub refinement: u32,
    pub count: u32,
    pub locked: bool,
    pub equipped: bool,
}

impl GameItem {
    /// A single unlocked, unequipped item at level 1 with no refinement.
    #[must_use]
    pub fn new(item_id: u32, item_type: ItemType, rank: u32) -> Self {
        Self {
            guid: 0,
            item_id,
            item_type,
            rank,
            level: 1,
            refinement: 0,
            count: 1,
            locked: false,
            equipped: false,
        }
    }

    #[must_use]
    pub fn with_count(mut self, count: u32) -> Self {
        self.count = count;
        self
    }

    #[must_use]
    pub fn with_level(mut self, level: u32) -> Self {
        self.level = level;
        self
    }

    #[must_use]
    pub fn with_refinement(mut self, refinement: u32) -> Self {
        self.refinement = refinement;
        self
    }

    #[must_use]
    pub fn locked(mut self) -> Self {
        self.locked = true;
        self
    }

    #[must_use]
    pub fn equipped(mut self) -> Self {
        self.equipped = true;
        self
    }

    /// Whether items of this type merge into one stack per item id.
    #[must_use]
    pub fn is_stackable(&self) -> bool {
        matches!(
            self.item_type,
            ItemType::Material | ItemType::Virtual | ItemType::Furniture
        )
    }
}

/// A player's items, keyed by guid.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Inventory {
    items: BTreeMap<u64, GameItem>,
    next_guid: u64,
}

impl Inventory {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `item` and return the guid holding it.
    ///
    /// Stackable items merge into an existing stack of the same id.
    pub fn add_item(&mut self, mut item: GameItem) -> u64 {
        if item.is_stackable() {
            let existing = self
                .items
                .values_mut()
                .find(|i| i.item_id == item.item_id);
            if let Some(stack) = existing {
                stack.count = stack.count.saturating_add(item.count);
                return stack.guid;
            }
        }
        self.next_guid += 1;
        item.guid = self.next_guid;
        self.items.insert(item.guid, item);
        self.next_guid
    }

    #[must_use]
    pub fn get(&self, guid: u64) -> Option<&GameItem> {
        self.items.get(&guid)
    }

    pub fn items(&self) -> impl Iterator<Item = &GameItem> {
        self.items.values()
    }

    /// Every item matching `filter`, in guid order.
    pub fn list_items(&self, filter: impl Fn(&GameItem) -> bool) -> Vec<GameItem> {
        self.items.values().filter(|i| filter(i)).cloned().collect()
    }

    /// Remove whole entries. Guids not present are ignored. Returns the
    /// number of entries removed.
    pub fn remove_items<'a>(&mut self, items: impl IntoIterator<Item = &'a GameItem>) -> usize {
        let removed = items
            .into_iter()
            .filter(|item| self.items.remove(&item.guid).is_some())
            .count();
        debug!(removed, "inventory entries removed");
        removed
    }

    /// Remove up to `amount` units of `item_id` across all its entries.
    /// Returns how many units were actually removed.
    pub fn remove_item(&mut self, item_id: u32, amount: u32) -> u32 {
        let mut remaining = amount;
        let mut emptied = Vec::new();
        for item in self.items.values_mut().filter(|i| i.item_id == item_id) {
            if remaining == 0 {
                break;
            }
            let take = remaining.min(item.count);
            item.count -= take;
            remaining -= take;
            if item.count == 0 {
                emptied.push(item.guid);
            }
        }
        for guid in emptied {
            self.items.remove(&guid);
        }
        amount - remaining
    }

    /// Total units of `item_id` held.
    #[must_use]
    pub fn item_count(&self, item_id: u32) -> u32 {
        self.items
            .values()
            .filter(|i| i.item_id == item_id)
            .map(|i| i.count)
            .fold(0u32, u32::saturating_add)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_materials_stack() {
        let mut inv = Inventory::new();
        let a = inv.add_item(GameItem::new(104001, ItemType::Material, 1).with_count(5));
        let b = inv.add_item(GameItem::new(104001, ItemType::Material, 1).with_count(3));
        assert_eq!(a, b);
        assert_eq!(inv.len(), 1);
        assert_eq!(inv.item_count(104001), 8);
    }

    #[test]
    fn test_weapons_do_not_stack() {
        let mut inv = Inventory::new();
        let a = inv.add_item(GameItem::new(11101, ItemType::Weapon, 3));
        let b = inv.add_item(GameItem::new(11101, ItemType::Weapon, 3));
        assert_ne!(a, b);
        assert_eq!(inv.item_count(11101), 2);
    }

    #[test]
    fn test_list_and_remove_items() {
        let mut inv = Inventory::new();
        inv.add_item(GameItem::new(11101, ItemType::Weapon, 3));
        inv.add_item(GameItem::new(11101, ItemType::Weapon, 3).locked());
        inv.add_item(GameItem::new(104001, ItemType::Material, 1));

        let unlocked_weapons =
            inv.list_items(|i| i.item_type == ItemType::Weapon && !i.locked);
        assert_eq!(unlocked_weapons.len(), 1);

        assert_eq!(inv.remove_items(&unlocked_weapons), 1);
        assert_eq!(inv.remove_items(&unlocked_weapons), 0);
        assert_eq!(inv.len(), 2);
    }

    #[test]
    fn test_remove_item_partial_and_exhausting() {
        let mut inv = Inventory::new();
        inv.add_item(GameItem::new(104001, ItemType::Material, 1).with_count(10));
        assert_eq!(inv.remove_item(104001, 4), 4);
        assert_eq!(inv.item_count(104001), 6);
        assert_eq!(inv.remove_item(104001, 100), 6);
        assert_eq!(inv.item_count(104001), 0);
        assert!(inv.is_empty());
        assert_eq!(inv.remove_item(104001, 1), 0);
    }
}
