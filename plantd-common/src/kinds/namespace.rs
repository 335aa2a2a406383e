use crate::convert::ResourceForm;
use crate::extension::{Extensions, SpecFields};
use crate::resource::{Metadata, Resource, ResourceKind};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NamespaceSpec {
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl SpecFields for NamespaceSpec {
    const FIELDS: &'static [&'static str] = &[];

    fn extra(&self) -> &Map<String, Value> {
        &self.extra
    }

    fn extra_mut(&mut self) -> &mut Map<String, Value> {
        &mut self.extra
    }
}

/// Namespaces are cluster-scoped and carry nothing but a name
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NamespaceForm {
    pub metadata: Metadata,
    #[serde(default, skip_serializing_if = "Extensions::is_empty")]
    pub extensions: Extensions,
}

impl ResourceForm for NamespaceForm {
    type Spec = NamespaceSpec;

    const KIND: ResourceKind = ResourceKind::Namespace;

    fn from_dto(dto: &Resource<NamespaceSpec>) -> Self {
        Self {
            metadata: Metadata::cluster(dto.metadata.name.clone()),
            extensions: Extensions::capture(dto),
        }
    }

    fn to_dto(&self) -> Resource<NamespaceSpec> {
        let metadata = Metadata::cluster(self.metadata.name.clone());
        self.extensions.assemble(&metadata, NamespaceSpec::default())
    }

    fn default_form() -> Self {
        Self::default()
    }

    fn metadata(&self) -> &Metadata {
        &self.metadata
    }

    fn metadata_mut(&mut self) -> &mut Metadata {
        &mut self.metadata
    }
}
