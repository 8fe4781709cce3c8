//! Item definitions referenced by inventories.

use serde::{Deserialize, Serialize};

/// Item category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ItemType {
    #[serde(alias = "ITEM_VIRTUAL")]
    Virtual,
    #[serde(alias = "ITEM_MATERIAL")]
    Material,
    /// Artifacts.
    #[serde(alias = "ITEM_RELIQUARY")]
    Reliquary,
    #[serde(alias = "ITEM_WEAPON")]
    Weapon,
    #[serde(alias = "ITEM_DISPLAY")]
    Display,
    #[serde(alias = "ITEM_FURNITURE")]
    Furniture,
}

/// Static description of one item id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemData {
    pub id: u32,
    #[serde(alias = "itemType")]
    pub item_type: ItemType,
    /// Rarity, 1 to 5.
    #[serde(default, alias = "rankLevel")]
    pub rank_level: u32,
    #[serde(default)]
    pub name: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_prefixed_item_type() {
        let json = r#"{"id":11101,"itemType":"ITEM_WEAPON","rankLevel":3,"name":"Dull Blade"}"#;
        let item: ItemData = serde_json::from_str(json).unwrap();
        assert_eq!(item.item_type, ItemType::Weapon);
        assert_eq!(item.rank_level, 3);
    }

    #[test]
    fn test_deserialize_plain_item_type() {
        let json = r#"{"id":104001,"item_type":"MATERIAL"}"#;
        let item: ItemData = serde_json::from_str(json).unwrap();
        assert_eq!(item.item_type, ItemType::Material);
        assert_eq!(item.rank_level, 0);
        assert!(item.name.is_empty());
    }
}
