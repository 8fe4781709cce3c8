//! Default-ability binding.
//!
//! Each entity variant maps to one of the default lists in the global combat
//! config. Binding walks that list in declaration order, resolves each name
//! through [`StaticData`] and attaches an instance. Unknown names are logged
//! and skipped; names already bound are left alone, so rebinding is safe.

use sim_data::{DefaultAbilities, StaticData};
use sim_entity::{Entity, EntityKind};
use tracing::{debug, warn};

/// Which default list an entity draws from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AbilityContext {
    MpLevel,
    Team,
    Avatar,
    Monster,
}

impl AbilityContext {
    /// The context for `kind`, or `None` for variants with no defaults.
    #[must_use]
    pub fn for_kind(kind: &EntityKind) -> Option<Self> {
        match kind {
            EntityKind::MpLevel => Some(Self::MpLevel),
            EntityKind::Team { .. } => Some(Self::Team),
            EntityKind::Avatar { .. } => Some(Self::Avatar),
            EntityKind::Monster { .. } => Some(Self::Monster),
            EntityKind::Gadget { .. } => None,
        }
    }

    /// This context's list within `defaults`.
    #[must_use]
    pub fn default_list<'a>(&self, defaults: &'a DefaultAbilities) -> &'a [String] {
        match self {
            Self::MpLevel => &defaults.default_mp_level_abilities,
            Self::Team => &defaults.default_team_abilities,
            Self::Avatar => &defaults.default_avatar_abilities,
            Self::Monster => &defaults.default_monster_abilities,
        }
    }
}

/// Outcome of one binding pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BindReport {
    /// New instances attached.
    pub bound: usize,
    /// Names with no definition.
    pub skipped_unknown: usize,
    /// Names already bound before this pass (or repeated within it).
    pub already_bound: usize,
}

/// Bind every name in `names`, in order.
pub fn bind_list<S: AsRef<str>>(
    entity: &mut Entity,
    names: &[S],
    data: &dyn StaticData,
) -> BindReport {
    let mut report = BindReport::default();
    for name in names {
        let name = name.as_ref();
        if entity.abilities().contains(name) {
            report.already_bound += 1;
            continue;
        }
        match data.ability_data(name) {
            Some(definition) => {
                entity.abilities_mut().insert(definition);
                report.bound += 1;
            }
            None => {
                warn!(entity = %entity.id(), ability = name, "unknown ability, skipping");
                report.skipped_unknown += 1;
            }
        }
    }
    report
}

/// Bind `entity`'s default abilities from the global combat config.
///
/// A missing config means no defaults; the entity still activates.
pub fn bind_defaults(entity: &mut Entity, data: &dyn StaticData) -> BindReport {
    let Some(context) = AbilityContext::for_kind(entity.kind()) else {
        return BindReport::default();
    };
    let Some(config) = data.config_global_combat() else {
        debug!(entity = %entity.id(), "no global combat config; no default abilities");
        return BindReport::default();
    };
    let report = bind_list(entity, context.default_list(&config.default_abilities), data);
    debug!(
        entity = %entity.id(),
        ?context,
        bound = report.bound,
        skipped = report.skipped_unknown,
        "default abilities bound"
    );
    report
}
