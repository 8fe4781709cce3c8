//! The static-data lookup service.
//!
//! The world and the ability binder only ever see [`StaticData`]. The
//! concrete [`GameData`] is built once at startup (from a directory of JSON
//! files, or in memory through [`GameDataBuilder`]) and shared read-only
//! behind an `Arc`.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::de::DeserializeOwned;
use tracing::{info, warn};

use crate::ability::AbilityDefinition;
use crate::combat::GlobalCombatConfig;
use crate::error::DataError;
use crate::item::ItemData;

/// Ability definitions, one JSON array.
pub const ABILITIES_FILE: &str = "abilities.json";
/// Global combat config, one JSON object. Optional.
pub const GLOBAL_COMBAT_FILE: &str = "global_combat.json";
/// Item definitions, one JSON array. Optional.
pub const ITEMS_FILE: &str = "items.json";

/// Read-only lookup of static game data.
///
/// Every lookup may miss. A miss is never fatal: callers skip the affected
/// unit of work or fall back to a default.
pub trait StaticData: Send + Sync {
    /// The ability definition registered under `name`.
    fn ability_data(&self, name: &str) -> Option<Arc<AbilityDefinition>>;

    /// The global combat configuration, if one was loaded. Absence means
    /// "no default abilities".
    fn config_global_combat(&self) -> Option<&GlobalCombatConfig>;

    /// The item definition for `id`.
    fn item_data(&self, id: u32) -> Option<&ItemData>;
}

/// In-memory static data.
#[derive(Debug, Default)]
pub struct GameData {
    abilities: HashMap<String, Arc<AbilityDefinition>>,
    global_combat: Option<GlobalCombatConfig>,
    items: HashMap<u32, ItemData>,
}

impl GameData {
    /// Start assembling data in memory.
    #[must_use]
    pub fn builder() -> GameDataBuilder {
        GameDataBuilder::default()
    }

    /// Load every known data file from `dir`.
    ///
    /// Missing files yield empty tables (and no combat config); malformed
    /// files are an error.
    ///
    /// # Errors
    ///
    /// Returns [`DataError::MissingDir`] if `dir` does not exist, or
    /// [`DataError::Io`]/[`DataError::Json`] if a present file cannot be read
    /// or parsed.
    pub fn load_dir(dir: impl AsRef<Path>) -> Result<Self, DataError> {
        let dir = dir.as_ref();
        if !dir.is_dir() {
            return Err(DataError::MissingDir(dir.to_path_buf()));
        }

        let mut builder = Self::builder();

        match read_optional::<Vec<AbilityDefinition>>(&dir.join(ABILITIES_FILE))? {
            Some(defs) => {
                for def in defs {
                    builder = builder.ability(def);
                }
            }
            None => warn!(dir = %dir.display(), "no ability definitions found"),
        }

        match read_optional::<GlobalCombatConfig>(&dir.join(GLOBAL_COMBAT_FILE))? {
            Some(cfg) => builder = builder.global_combat(cfg),
            None => warn!(
                dir = %dir.display(),
                "no global combat config; entities get no default abilities"
            ),
        }

        if let Some(items) = read_optional::<Vec<ItemData>>(&dir.join(ITEMS_FILE))? {
            for item in items {
                builder = builder.item(item);
            }
        }

        let data = builder.build();
        info!(
            abilities = data.abilities.len(),
            items = data.items.len(),
            global_combat = data.global_combat.is_some(),
            "static data loaded"
        );
        Ok(data)
    }

    /// Number of ability definitions.
    #[must_use]
    pub fn ability_count(&self) -> usize {
        self.abilities.len()
    }

    /// Number of item definitions.
    #[must_use]
    pub fn item_count(&self) -> usize {
        self.items.len()
    }
}

impl StaticData for GameData {
    fn ability_data(&self, name: &str) -> Option<Arc<AbilityDefinition>> {
        self.abilities.get(name).cloned()
    }

    fn config_global_combat(&self) -> Option<&GlobalCombatConfig> {
        self.global_combat.as_ref()
    }

    fn item_data(&self, id: u32) -> Option<&ItemData> {
        self.items.get(&id)
    }
}

/// Builder for [`GameData`]. Later entries with the same key replace earlier
/// ones.
#[derive(Debug, Default)]
pub struct GameDataBuilder {
    data: GameData,
}

impl GameDataBuilder {
    #[must_use]
    pub fn ability(mut self, def: AbilityDefinition) -> Self {
        self.data
            .abilities
            .insert(def.ability_name.clone(), Arc::new(def));
        self
    }

    #[must_use]
    pub fn global_combat(mut self, cfg: GlobalCombatConfig) -> Self {
        self.data.global_combat = Some(cfg);
        self
    }

    #[must_use]
    pub fn item(mut self, item: ItemData) -> Self {
        self.data.items.insert(item.id, item);
        self
    }

    #[must_use]
    pub fn build(self) -> GameData {
        self.data
    }
}

fn read_optional<T: DeserializeOwned>(path: &PathBuf) -> Result<Option<T>, DataError> {
    if !path.exists() {
        return Ok(None);
    }
    let text = std::fs::read_to_string(path).map_err(|source| DataError::Io {
        path: path.clone(),
        source,
    })?;
    let value = serde_json::from_str(&text).map_err(|source| DataError::Json {
        path: path.clone(),
        source,
    })?;
    Ok(Some(value))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::combat::DefaultAbilities;
    use crate::item::ItemType;

    fn scratch_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("sim_data-{}-{name}", std::process::id()));
        let _ = std::fs::remove_dir_all(&dir);
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn test_builder_lookups() {
        let data = GameData::builder()
            .ability(AbilityDefinition::new("abilityA"))
            .item(ItemData {
                id: 1,
                item_type: ItemType::Material,
                rank_level: 2,
                name: "Ore".to_string(),
            })
            .build();

        assert!(data.ability_data("abilityA").is_some());
        assert!(data.ability_data("missing").is_none());
        assert_eq!(data.item_data(1).map(|i| i.rank_level), Some(2));
        assert!(data.config_global_combat().is_none());
    }

    #[test]
    fn test_lookups_share_one_definition() {
        let data = GameData::builder()
            .ability(AbilityDefinition::new("abilityA"))
            .build();
        let a = data.ability_data("abilityA").unwrap();
        let b = data.ability_data("abilityA").unwrap();
        assert!(Arc::ptr_eq(&a, &b));
    }

    #[test]
    fn test_load_dir_reads_all_files() {
        let dir = scratch_dir("all");
        std::fs::write(
            dir.join(ABILITIES_FILE),
            r#"[{"abilityName":"abilityA"},{"abilityName":"abilityB"}]"#,
        )
        .unwrap();
        std::fs::write(
            dir.join(GLOBAL_COMBAT_FILE),
            r#"{"defaultAbilities":{"defaultMPLevelAbilities":["abilityA"]}}"#,
        )
        .unwrap();
        std::fs::write(
            dir.join(ITEMS_FILE),
            r#"[{"id":11101,"itemType":"ITEM_WEAPON","rankLevel":3}]"#,
        )
        .unwrap();

        let data = GameData::load_dir(&dir).unwrap();
        assert_eq!(data.ability_count(), 2);
        assert_eq!(data.item_count(), 1);
        assert_eq!(
            data.config_global_combat().cloned(),
            Some(GlobalCombatConfig {
                default_abilities: DefaultAbilities {
                    default_mp_level_abilities: vec!["abilityA".to_string()],
                    ..DefaultAbilities::default()
                },
            })
        );
        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_load_dir_tolerates_missing_files() {
        let dir = scratch_dir("empty");
        let data = GameData::load_dir(&dir).unwrap();
        assert_eq!(data.ability_count(), 0);
        assert!(data.config_global_combat().is_none());
        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_load_dir_rejects_malformed_json() {
        let dir = scratch_dir("bad");
        std::fs::write(dir.join(ABILITIES_FILE), "not json").unwrap();
        let err = GameData::load_dir(&dir).unwrap_err();
        assert!(matches!(err, DataError::Json { .. }));
        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_load_dir_missing_dir() {
        let err = GameData::load_dir("/definitely/not/here").unwrap_err();
        assert!(matches!(err, DataError::MissingDir(_)));
    }
}
