//! Global combat configuration: the default ability lists for each entity
//! context.

use serde::{Deserialize, Serialize};

/// Combat-wide configuration. Only the parts the simulation core reads are
/// modelled; unknown fields in the source file are ignored.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GlobalCombatConfig {
    #[serde(default, alias = "defaultAbilities")]
    pub default_abilities: DefaultAbilities,
}

/// Ability names attached to every entity of a given context, in
/// declaration order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DefaultAbilities {
    /// Bound to each world's MP-level anchor entity.
    #[serde(default, alias = "defaultMPLevelAbilities")]
    pub default_mp_level_abilities: Vec<String>,

    /// Bound to each team container entity.
    #[serde(default, alias = "defaultTeamAbilities")]
    pub default_team_abilities: Vec<String>,

    /// Bound to every avatar.
    #[serde(default, alias = "defaultAvatarAbilities")]
    pub default_avatar_abilities: Vec<String>,

    /// Bound to every monster.
    #[serde(default, alias = "defaultMonsterAbilities")]
    pub default_monster_abilities: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_source_field_names() {
        let json = r#"{
            "defaultAbilities": {
                "defaultMPLevelAbilities": ["abilityA", "unknown_id", "abilityB"],
                "defaultTeamAbilities": ["team"]
            },
            "somethingElse": 1
        }"#;
        let cfg: GlobalCombatConfig = serde_json::from_str(json).unwrap();
        assert_eq!(
            cfg.default_abilities.default_mp_level_abilities,
            vec!["abilityA", "unknown_id", "abilityB"]
        );
        assert_eq!(cfg.default_abilities.default_team_abilities, vec!["team"]);
        assert!(cfg.default_abilities.default_avatar_abilities.is_empty());
    }
}
