//! Shared, read-only evaluation context
//!
//! Built once per analysis by the analyzer and handed to every rule. It holds
//! the snapshot, the instance grouping, the reduced (preprocessed) default
//! catalogs, the unreduced catalogs, the in-range forced changes and the
//! optional parameter notes.

use precheck_model::{
    select_for_value, values_equal, ClusterSnapshot, ComponentState, ComponentType,
    ForcedChange, ForcedChangeCatalog, ParamKind, ParameterNotes, ParameterValue, UpgradePath,
    Value,
};
use std::collections::BTreeMap;

/// Flat-namespace parameter catalog of one component kind
pub type Catalog = BTreeMap<String, ParameterValue>;

/// Catalogs of every component kind
pub type Catalogs = BTreeMap<ComponentType, Catalog>;

/// Instance names grouped by component kind, each list sorted
pub type InstanceGroups = BTreeMap<ComponentType, Vec<String>>;

/// In-range forced changes per flat-namespace key, catalog order kept
pub type ForcedChanges<'a> = BTreeMap<String, Vec<&'a ForcedChange>>;

/// Instances of one component kind sharing a value of one parameter
#[derive(Debug, Clone, PartialEq)]
pub struct ValueGroup<'c, 'a> {
    /// Shared value; `None` when not collected
    pub value: Option<&'a Value>,
    /// Instance names, sorted
    pub instances: Vec<&'c str>,
}

/// Read-only data shared by all rules
#[derive(Debug, Clone)]
pub struct RuleContext<'a> {
    snapshot: &'a ClusterSnapshot,
    path: UpgradePath,
    instances: InstanceGroups,
    source_defaults: Catalogs,
    target_defaults: Catalogs,
    raw_source_defaults: Catalogs,
    raw_target_defaults: Catalogs,
    forced: BTreeMap<ComponentType, ForcedChanges<'a>>,
    notes: Option<&'a ParameterNotes>,
}

impl<'a> RuleContext<'a> {
    /// Create context over a snapshot for an upgrade path
    #[must_use]
    pub fn new(snapshot: &'a ClusterSnapshot, path: UpgradePath) -> Self {
        Self {
            snapshot,
            path,
            instances: InstanceGroups::new(),
            source_defaults: Catalogs::new(),
            target_defaults: Catalogs::new(),
            raw_source_defaults: Catalogs::new(),
            raw_target_defaults: Catalogs::new(),
            forced: BTreeMap::new(),
            notes: None,
        }
    }

    /// Set instance grouping; names within each group are sorted
    #[must_use]
    pub fn with_instances(mut self, mut instances: InstanceGroups) -> Self {
        for names in instances.values_mut() {
            names.sort();
            names.dedup();
        }
        self.instances = instances;
        self
    }

    /// Set reduced catalogs that rules iterate over
    #[inline]
    #[must_use]
    pub fn with_defaults(mut self, source: Catalogs, target: Catalogs) -> Self {
        self.source_defaults = source;
        self.target_defaults = target;
        self
    }

    /// Set unreduced catalogs for lookups of explicitly named parameters
    #[inline]
    #[must_use]
    pub fn with_raw_defaults(mut self, source: Catalogs, target: Catalogs) -> Self {
        self.raw_source_defaults = source;
        self.raw_target_defaults = target;
        self
    }

    /// Resolve in-range forced changes for every component kind
    #[must_use]
    pub fn with_forced_changes(mut self, catalog: &'a ForcedChangeCatalog) -> Self {
        self.forced = ComponentType::ALL
            .into_iter()
            .map(|component| (component, catalog.in_range(component, &self.path)))
            .filter(|(_, changes)| !changes.is_empty())
            .collect();
        self
    }

    /// Attach parameter notes
    #[inline]
    #[must_use]
    pub fn with_notes(mut self, notes: &'a ParameterNotes) -> Self {
        self.notes = Some(notes);
        self
    }

    /// The snapshot under analysis
    #[inline]
    #[must_use]
    pub fn snapshot(&self) -> &'a ClusterSnapshot {
        self.snapshot
    }

    /// The upgrade being assessed
    #[inline]
    #[must_use]
    pub fn path(&self) -> &UpgradePath {
        &self.path
    }

    /// Component kinds with at least one instance
    pub fn components(&self) -> impl Iterator<Item = ComponentType> + '_ {
        self.instances
            .iter()
            .filter(|(_, names)| !names.is_empty())
            .map(|(component, _)| *component)
    }

    /// Every instance of a component kind, sorted by name
    #[must_use]
    pub fn instances(&self, component: ComponentType) -> Vec<(&str, &'a ComponentState)> {
        self.instances
            .get(&component)
            .map(|names| {
                names
                    .iter()
                    .filter_map(|name| {
                        self.snapshot
                            .components
                            .get(name)
                            .map(|state| (name.as_str(), state))
                    })
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Representative instance of a component kind (first by name)
    #[must_use]
    pub fn representative(&self, component: ComponentType) -> Option<(&str, &'a ComponentState)> {
        self.instances(component).into_iter().next()
    }

    /// Current value on the representative instance
    #[must_use]
    pub fn current_value(&self, component: ComponentType, key: &str) -> Option<&'a Value> {
        self.representative(component)
            .and_then(|(_, state)| state.current_value(key))
    }

    /// Reduced source catalog of a component kind
    #[inline]
    #[must_use]
    pub fn source_catalog(&self, component: ComponentType) -> Option<&Catalog> {
        self.source_defaults.get(&component)
    }

    /// Reduced target catalog of a component kind
    #[inline]
    #[must_use]
    pub fn target_catalog(&self, component: ComponentType) -> Option<&Catalog> {
        self.target_defaults.get(&component)
    }

    /// Unreduced source catalog of a component kind
    #[inline]
    #[must_use]
    pub fn raw_source_catalog(&self, component: ComponentType) -> Option<&Catalog> {
        self.raw_source_defaults.get(&component)
    }

    /// Unreduced target catalog of a component kind
    #[inline]
    #[must_use]
    pub fn raw_target_catalog(&self, component: ComponentType) -> Option<&Catalog> {
        self.raw_target_defaults.get(&component)
    }

    /// Instances grouped by their value of one parameter
    ///
    /// Groups follow instance order. An instance joins the first group whose
    /// value equals its own under the value comparator. Empty when the
    /// component kind has no instances.
    #[must_use]
    pub fn value_groups(&self, component: ComponentType, key: &str) -> Vec<ValueGroup<'_, 'a>> {
        let mut groups: Vec<ValueGroup<'_, 'a>> = Vec::new();
        for (name, state) in self.instances(component) {
            let value = state.current_value(key);
            match groups.iter_mut().find(|group| values_equal(group.value, value)) {
                Some(group) => group.instances.push(name),
                None => groups.push(ValueGroup {
                    value,
                    instances: vec![name],
                }),
            }
        }
        groups
    }

    /// Source default from the reduced catalog
    #[must_use]
    pub fn source_default(&self, component: ComponentType, key: &str) -> Option<&Value> {
        lookup(&self.source_defaults, component, key)
    }

    /// Target default from the reduced catalog
    #[must_use]
    pub fn target_default(&self, component: ComponentType, key: &str) -> Option<&Value> {
        lookup(&self.target_defaults, component, key)
    }

    /// Source default from the unreduced catalog, falling back to the reduced one
    #[must_use]
    pub fn raw_source_default(&self, component: ComponentType, key: &str) -> Option<&Value> {
        lookup(&self.raw_source_defaults, component, key)
            .or_else(|| self.source_default(component, key))
    }

    /// Target default from the unreduced catalog, falling back to the reduced one
    #[must_use]
    pub fn raw_target_default(&self, component: ComponentType, key: &str) -> Option<&Value> {
        lookup(&self.raw_target_defaults, component, key)
            .or_else(|| self.target_default(component, key))
    }

    /// In-range forced changes of a component kind
    #[must_use]
    pub fn forced_changes(&self, component: ComponentType) -> Option<&ForcedChanges<'a>> {
        self.forced.get(&component)
    }

    /// Whether any in-range forced change names this parameter
    #[must_use]
    pub fn is_forced(&self, component: ComponentType, key: &str) -> bool {
        self.forced
            .get(&component)
            .is_some_and(|changes| changes.contains_key(key))
    }

    /// Forced change applying to a parameter given its current value
    #[must_use]
    pub fn forced_change_for(
        &self,
        component: ComponentType,
        key: &str,
        current: Option<&Value>,
    ) -> Option<&'a ForcedChange> {
        self.forced
            .get(&component)
            .and_then(|changes| changes.get(key))
            .and_then(|candidates| select_for_value(candidates, current))
    }

    /// Whether the representative instance deviates from the source default
    ///
    /// Unknown when either side is absent, reported as `false`.
    #[must_use]
    pub fn is_user_modified(&self, component: ComponentType, key: &str) -> bool {
        match (
            self.current_value(component, key),
            self.raw_source_default(component, key),
        ) {
            (Some(current), Some(default)) => !values_equal(Some(current), Some(default)),
            _ => false,
        }
    }

    /// Note text for a parameter if its conditions hold
    #[must_use]
    pub fn parameter_note(
        &self,
        component: ComponentType,
        kind: ParamKind,
        name: &str,
        target_default: Option<&Value>,
    ) -> Option<&'a str> {
        self.notes
            .and_then(|notes| {
                notes.note_for(component, kind, name, target_default, self.path.target)
            })
    }
}

fn lookup<'c>(catalogs: &'c Catalogs, component: ComponentType, key: &str) -> Option<&'c Value> {
    catalogs
        .get(&component)
        .and_then(|catalog| catalog.get(key))
        .and_then(ParameterValue::value)
}
