//! Preservation of fields the forms do not model
//!
//! A form keeps the unmodeled top-level and spec-level fields of the resource it
//! was hydrated from. When converting back, the modeled fields are produced first
//! and these maps are merged last, only filling keys the form does not own.

use crate::resource::{Metadata, Resource};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Keys owned by the envelope itself
const ENVELOPE_FIELDS: [&str; 3] = ["metadata", "spec", "status"];

/// Spec DTOs declare which JSON keys they model and expose their catch-all map
pub trait SpecFields {
    const FIELDS: &'static [&'static str];

    fn extra(&self) -> &Map<String, Value>;
    fn extra_mut(&mut self) -> &mut Map<String, Value>;
}

/// Unknown fields carried by a form across an edit cycle
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Extensions {
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub object: Map<String, Value>,
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub spec: Map<String, Value>,
}

impl Extensions {
    pub fn capture<S: SpecFields>(dto: &Resource<S>) -> Self {
        Self {
            object: dto.extra.clone(),
            spec: dto.spec.extra().clone(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.object.is_empty() && self.spec.is_empty()
    }

    /// Builds the outgoing resource and merges the unknown fields into it
    pub fn assemble<S: SpecFields>(&self, metadata: &Metadata, mut spec: S) -> Resource<S> {
        merge_missing(spec.extra_mut(), &self.spec, S::FIELDS);
        let mut resource = Resource::new(metadata.clone(), spec);
        merge_missing(&mut resource.extra, &self.object, &ENVELOPE_FIELDS);
        resource
    }
}

fn merge_missing(target: &mut Map<String, Value>, source: &Map<String, Value>, owned: &[&str]) {
    for (key, value) in source {
        if owned.contains(&key.as_str()) {
            continue;
        }
        target.entry(key.clone()).or_insert_with(|| value.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[derive(Debug, Default)]
    struct Spec {
        extra: Map<String, Value>,
    }

    impl SpecFields for Spec {
        const FIELDS: &'static [&'static str] = &["modeled"];

        fn extra(&self) -> &Map<String, Value> {
            &self.extra
        }

        fn extra_mut(&mut self) -> &mut Map<String, Value> {
            &mut self.extra
        }
    }

    #[test]
    fn test_modeled_keys_are_never_overwritten() {
        let mut ext = Extensions::default();
        ext.spec.insert("modeled".into(), json!("stale"));
        ext.spec.insert("future".into(), json!(1));
        ext.object.insert("spec".into(), json!({}));
        ext.object.insert("kind".into(), json!("Schema"));

        let resource = ext.assemble(&Metadata::namespaced("default", "s"), Spec::default());
        assert_eq!(resource.spec.extra.get("future"), Some(&json!(1)));
        assert!(!resource.spec.extra.contains_key("modeled"));
        assert_eq!(resource.extra.get("kind"), Some(&json!("Schema")));
        assert!(!resource.extra.contains_key("spec"));
    }
}
