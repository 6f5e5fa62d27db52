//! Knowledge-base slicing
//!
//! Cuts a knowledge base down to the component kinds and parameter kinds the
//! active rules need, flattening system variables into the `sysvar:`
//! namespace.

use precheck_model::KnowledgeBase;
use precheck_rules::{Catalogs, DataRequirements};

/// Slice a knowledge base for the given requirements
///
/// Kinds absent from the knowledge base are skipped; rules then produce no
/// findings for them.
#[must_use]
pub fn slice(kb: Option<&KnowledgeBase>, requirements: &DataRequirements, label: &str) -> Catalogs {
    let Some(kb) = kb else {
        tracing::warn!("No {} knowledge base supplied", label);
        return Catalogs::new();
    };

    let mut catalogs = Catalogs::new();
    for &component in &requirements.components {
        let Some(defaults) = kb.component(component) else {
            tracing::debug!("{} knowledge base has no {} section", label, component);
            continue;
        };
        let catalog = defaults.flatten(
            requirements.need_config,
            requirements.need_system_variables && component.has_system_variables(),
        );
        tracing::debug!("Sliced {} {} defaults for {}", catalog.len(), label, component);
        catalogs.insert(component, catalog);
    }
    catalogs
}

#[cfg(test)]
mod tests {
    use super::*;
    use precheck_model::{ComponentDefaults, ComponentType, ParameterValue};

    fn kb() -> KnowledgeBase {
        KnowledgeBase::new()
            .with_component(
                ComponentType::Tidb,
                ComponentDefaults::new("v7.5.0")
                    .with_config("oom-action", ParameterValue::new("cancel"))
                    .with_system_variable(
                        "tidb_mem_quota_query",
                        ParameterValue::new(1_073_741_824_i64),
                    ),
            )
            .with_component(
                ComponentType::Pd,
                ComponentDefaults::new("v7.5.0")
                    .with_config("replication.max-replicas", ParameterValue::new(3_i64)),
            )
    }

    #[test]
    fn sysvars_flattened_with_prefix() {
        let requirements = DataRequirements::for_components([ComponentType::Tidb])
            .with_config()
            .with_system_variables();

        let catalogs = slice(Some(&kb()), &requirements, "source");

        let tidb = &catalogs[&ComponentType::Tidb];
        assert!(tidb.contains_key("oom-action"));
        assert!(tidb.contains_key("sysvar:tidb_mem_quota_query"));
        assert!(!catalogs.contains_key(&ComponentType::Pd));
    }

    #[test]
    fn unneeded_kinds_and_missing_sections_skipped() {
        let requirements =
            DataRequirements::for_components([ComponentType::Tidb, ComponentType::Tikv])
                .with_config();

        let catalogs = slice(Some(&kb()), &requirements, "target");

        assert_eq!(catalogs[&ComponentType::Tidb].len(), 1);
        assert!(!catalogs.contains_key(&ComponentType::Tikv));
        assert!(slice(None, &requirements, "target").is_empty());
    }
}
