//! Live ability instances bound to one entity.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use sim_data::{AbilityDefinition, AbilityHash};

/// Runtime state of one ability on one entity.
///
/// The definition is shared and immutable; everything else belongs to this
/// entity alone.
#[derive(Debug, Clone)]
pub struct AbilityInstance {
    definition: Arc<AbilityDefinition>,
    instanced_ability_id: u32,
    /// Mutable copy of the definition's specials.
    pub specials: BTreeMap<String, f32>,
    /// Seconds this instance has been active.
    pub active_time: f32,
}

impl AbilityInstance {
    #[must_use]
    pub fn new(definition: Arc<AbilityDefinition>, instanced_ability_id: u32) -> Self {
        let specials = definition.ability_specials.clone();
        Self {
            definition,
            instanced_ability_id,
            specials,
            active_time: 0.0,
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.definition.ability_name
    }

    #[must_use]
    pub fn hash(&self) -> AbilityHash {
        self.definition.hash()
    }

    #[must_use]
    pub fn definition(&self) -> &Arc<AbilityDefinition> {
        &self.definition
    }

    #[must_use]
    pub fn instanced_ability_id(&self) -> u32 {
        self.instanced_ability_id
    }

    /// Current value of a special, falling back to `0.0`.
    #[must_use]
    pub fn special(&self, key: &str) -> f32 {
        self.specials.get(key).copied().unwrap_or_default()
    }
}

/// The ordered set of abilities bound to an entity.
///
/// Keyed by definition name; insertion order is preserved and exposed by
/// [`AbilitySet::iter`]. Inserting a name that is already bound is a no-op.
#[derive(Debug, Clone, Default)]
pub struct AbilitySet {
    instances: Vec<AbilityInstance>,
    by_name: HashMap<String, usize>,
    next_instanced_id: u32,
}

impl AbilitySet {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind `definition` unless an ability with the same name is already
    /// bound. Returns `true` if a new instance was created.
    pub fn insert(&mut self, definition: Arc<AbilityDefinition>) -> bool {
        if self.by_name.contains_key(&definition.ability_name) {
            return false;
        }
        self.next_instanced_id += 1;
        let name = definition.ability_name.clone();
        self.by_name.insert(name, self.instances.len());
        self.instances
            .push(AbilityInstance::new(definition, self.next_instanced_id));
        true
    }

    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.by_name.contains_key(name)
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&AbilityInstance> {
        self.by_name.get(name).map(|&i| &self.instances[i])
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut AbilityInstance> {
        match self.by_name.get(name) {
            Some(&i) => self.instances.get_mut(i),
            None => None,
        }
    }

    /// Instances in bind order.
    pub fn iter(&self) -> impl Iterator<Item = &AbilityInstance> {
        self.instances.iter()
    }

    /// Names in bind order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.instances.iter().map(AbilityInstance::name)
    }

    /// Advance every instance's active time.
    pub fn on_tick(&mut self, dt: f32) {
        for instance in &mut self.instances {
            instance.active_time += dt;
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.instances.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.instances.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn def(name: &str) -> Arc<AbilityDefinition> {
        Arc::new(AbilityDefinition::new(name))
    }

    #[test]
    fn test_insert_is_idempotent() {
        let mut set = AbilitySet::new();
        assert!(set.insert(def("abilityA")));
        assert!(!set.insert(def("abilityA")));
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn test_bind_order_and_instanced_ids() {
        let mut set = AbilitySet::new();
        set.insert(def("abilityB"));
        set.insert(def("abilityA"));
        set.insert(def("abilityB"));
        set.insert(def("abilityC"));

        assert_eq!(
            set.names().collect::<Vec<_>>(),
            vec!["abilityB", "abilityA", "abilityC"]
        );
        let ids: Vec<u32> = set.iter().map(AbilityInstance::instanced_ability_id).collect();
        assert_eq!(ids, vec![1, 2, 3]);
    }

    #[test]
    fn test_specials_are_copied_per_instance() {
        let shared = Arc::new(AbilityDefinition::new("heal").with_special("amount", 10.0));
        let mut a = AbilitySet::new();
        let mut b = AbilitySet::new();
        a.insert(shared.clone());
        b.insert(shared.clone());

        a.get_mut("heal").unwrap().specials.insert("amount".into(), 99.0);
        assert_eq!(a.get("heal").unwrap().special("amount"), 99.0);
        assert_eq!(b.get("heal").unwrap().special("amount"), 10.0);
        assert_eq!(shared.ability_specials["amount"], 10.0);
        assert!(Arc::ptr_eq(a.get("heal").unwrap().definition(), &shared));
    }

    #[test]
    fn test_on_tick_advances_active_time() {
        let mut set = AbilitySet::new();
        set.insert(def("abilityA"));
        set.on_tick(0.05);
        set.on_tick(0.05);
        let t = set.get("abilityA").unwrap().active_time;
        assert!((t - 0.1).abs() < 1e-6);
    }

    #[test]
    fn test_missing_lookup() {
        let mut set = AbilitySet::new();
        assert!(set.get("nope").is_none());
        assert!(set.get_mut("nope").is_none());
        assert!(!set.contains("nope"));
        assert!(set.is_empty());
    }
}
