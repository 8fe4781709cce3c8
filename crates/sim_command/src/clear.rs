//! `clear`: remove items from a player's inventory.
//!
//! ```text
//! clear (all|wp|art|mat) [lv<max level>] [r<max refinement>] [<max rarity>*]
//! clear <itemId> [x<amount>]
//! ```
//!
//! Category clears only ever touch unlocked, unequipped items at or below
//! the rarity bound.

use sim_data::{ItemType, StaticData};
use sim_entity::{GameItem, Inventory};
use tracing::info;

use crate::args::{self, Tag};
use crate::error::CommandError;

/// Filter bounds and amount, filled from tagged arguments.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClearParams {
    /// Maximum level (weapons), or one below the maximum (relics).
    pub lvl: u32,
    /// Weapons must be refined strictly below this.
    pub refinement: u32,
    /// Maximum rarity.
    pub rank: u32,
    /// Units to remove in item-id mode; 0 means the whole count.
    pub amount: u32,
}

impl Default for ClearParams {
    fn default() -> Self {
        Self {
            lvl: 1,
            refinement: 1,
            rank: 4,
            amount: 0,
        }
    }
}

impl ClearParams {
    fn apply(&mut self, tag: Tag, value: u32) {
        match tag {
            Tag::Level => self.lvl = value,
            Tag::Refinement => self.refinement = value,
            Tag::Rank => self.rank = value,
            Tag::Amount => self.amount = value,
        }
    }
}

/// The `clear` command.
#[derive(Debug, Clone, Copy, Default)]
pub struct ClearCommand;

impl ClearCommand {
    pub const LABEL: &'static str = "clear";
    pub const USAGE: &'static [&'static str] = &[
        "(all|wp|art|mat) [lv<max level>] [r<max refinement>] [<max rarity>*]",
        "<itemId> [x<amount>]",
    ];
    pub const PERMISSION: &'static str = "player.clearinv";
    pub const PERMISSION_TARGETED: &'static str = "player.clearinv.others";

    /// Run against `inventory`, which belongs to `target`. Returns the lines
    /// to show the operator.
    ///
    /// # Errors
    ///
    /// Returns [`CommandError::Usage`] for missing or unrecognised arguments
    /// (or nothing to remove in item-id mode), and
    /// [`CommandError::UnknownItem`] for an item id with no definition.
    pub fn execute(
        &self,
        target: &str,
        inventory: &mut Inventory,
        data: &dyn StaticData,
        args: &[&str],
    ) -> Result<Vec<String>, CommandError> {
        let (tags, rest) = args::extract(args);
        let mut params = ClearParams::default();
        for (tag, value) in tags {
            params.apply(tag, value);
        }

        let Some(&arg0) = rest.first() else {
            return Err(CommandError::Usage(Self::USAGE));
        };

        if let Some(item_id) = arg0.parse::<u32>().ok().filter(|id| *id > 0) {
            return Self::clear_item(target, inventory, data, item_id, params)
                .map(|line| vec![line]);
        }

        let lines = match arg0 {
            "wp" => vec![Self::clear_weapons(target, inventory, params)],
            "art" => vec![Self::clear_relics(target, inventory, params)],
            "mat" => vec![Self::clear_other(target, inventory, params, ItemType::Material)],
            "all" => {
                let mut lines = vec![
                    Self::clear_relics(target, inventory, params),
                    Self::clear_weapons(target, inventory, params),
                ];
                for item_type in [
                    ItemType::Material,
                    ItemType::Furniture,
                    ItemType::Display,
                    ItemType::Virtual,
                ] {
                    lines.push(Self::clear_other(target, inventory, params, item_type));
                }
                lines.push(format!("Cleared everything for {target}."));
                lines
            }
            _ => return Err(CommandError::Usage(Self::USAGE)),
        };
        info!(player = target, category = arg0, "inventory cleared");
        Ok(lines)
    }

    /// Like [`ClearCommand::execute`], with errors rendered as lines too.
    pub fn run(
        &self,
        target: &str,
        inventory: &mut Inventory,
        data: &dyn StaticData,
        args: &[&str],
    ) -> Vec<String> {
        self.execute(target, inventory, data, args)
            .unwrap_or_else(|e| vec![e.to_string()])
    }

    fn clear_item(
        target: &str,
        inventory: &mut Inventory,
        data: &dyn StaticData,
        item_id: u32,
        mut params: ClearParams,
    ) -> Result<String, CommandError> {
        let item = data
            .item_data(item_id)
            .ok_or(CommandError::UnknownItem(item_id))?;
        if params.amount == 0 {
            params.amount = inventory.item_count(item_id);
        }
        if params.amount == 0 {
            return Err(CommandError::Usage(Self::USAGE));
        }
        let removed = inventory.remove_item(item_id, params.amount);
        info!(player = target, item_id, removed, "items cleared");
        let name = display_name(&item.name, item_id);
        Ok(format!("Removed {removed} of {name} from {target}."))
    }

    fn candidates(item: &GameItem, item_type: ItemType, params: ClearParams) -> bool {
        item.item_type == item_type && item.rank <= params.rank && !item.locked && !item.equipped
    }

    fn clear_other(
        target: &str,
        inventory: &mut Inventory,
        params: ClearParams,
        item_type: ItemType,
    ) -> String {
        let doomed = inventory.list_items(|i| Self::candidates(i, item_type, params));
        let removed = inventory.remove_items(&doomed);
        format!("Cleared {removed} {} for {target}.", category_name(item_type))
    }

    fn clear_weapons(target: &str, inventory: &mut Inventory, params: ClearParams) -> String {
        let doomed = inventory.list_items(|i| {
            Self::candidates(i, ItemType::Weapon, params)
                && i.level <= params.lvl
                && i.refinement < params.refinement
        });
        let removed = inventory.remove_items(&doomed);
        format!("Cleared {removed} weapons for {target}.")
    }

    fn clear_relics(target: &str, inventory: &mut Inventory, params: ClearParams) -> String {
        let doomed = inventory.list_items(|i| {
            Self::candidates(i, ItemType::Reliquary, params) && i.level <= params.lvl.saturating_add(1)
        });
        let removed = inventory.remove_items(&doomed);
        format!("Cleared {removed} artifacts for {target}.")
    }
}

fn category_name(item_type: ItemType) -> &'static str {
    match item_type {
        ItemType::Virtual => "virtual items",
        ItemType::Material => "materials",
        ItemType::Reliquary => "artifacts",
        ItemType::Weapon => "weapons",
        ItemType::Display => "displays",
        ItemType::Furniture => "furniture",
    }
}

fn display_name(name: &str, item_id: u32) -> String {
    if name.is_empty() {
        format!("item {item_id}")
    } else {
        name.to_string()
    }
}
