use crate::convert::{new_row_id, FieldError, KeyValue, ResourceForm};
use crate::extension::{Extensions, SpecFields};
use crate::resource::{Metadata, Resource, ResourceKind};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SchemaSpec {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub columns: Vec<ColumnSpec>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl SpecFields for SchemaSpec {
    const FIELDS: &'static [&'static str] = &["columns"];

    fn extra(&self) -> &Map<String, Value> {
        &self.extra
    }

    fn extra_mut(&mut self) -> &mut Map<String, Value> {
        &mut self.extra
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ColumnSpec {
    #[serde(default)]
    pub name: String,
    #[serde(rename = "type", default, skip_serializing_if = "String::is_empty")]
    pub kind: String,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub params: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub formula: Option<FormulaSpec>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FormulaSpec {
    #[serde(default)]
    pub name: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub args: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub field_names: Vec<String>,
}

/// A column is either generated from a faker `type` or derived through a formula
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ColumnForm {
    #[serde(default = "new_row_id")]
    pub id: String,
    pub name: String,
    pub kind: String,
    pub params: Vec<KeyValue>,
    pub use_formula: bool,
    pub formula_name: String,
    pub formula_args: String,
    pub formula_field_names: Vec<String>,
}

impl ColumnForm {
    pub fn new(name: impl Into<String>, kind: impl Into<String>) -> Self {
        Self {
            id: new_row_id(),
            name: name.into(),
            kind: kind.into(),
            ..Default::default()
        }
    }

    fn from_spec(spec: &ColumnSpec) -> Self {
        let formula = spec.formula.clone().unwrap_or_default();
        Self {
            id: new_row_id(),
            name: spec.name.clone(),
            kind: spec.kind.clone(),
            params: KeyValue::from_map(&spec.params),
            use_formula: !formula.name.is_empty(),
            formula_name: formula.name,
            formula_args: formula.args,
            formula_field_names: formula.field_names,
        }
    }

    fn to_spec(&self) -> ColumnSpec {
        let formula = self.use_formula.then(|| FormulaSpec {
            name: self.formula_name.clone(),
            args: self.formula_args.clone(),
            field_names: self.formula_field_names.clone(),
        });
        ColumnSpec {
            name: self.name.clone(),
            kind: self.kind.clone(),
            params: KeyValue::to_map(&self.params),
            formula,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SchemaForm {
    pub metadata: Metadata,
    pub columns: Vec<ColumnForm>,
    #[serde(skip_serializing_if = "Extensions::is_empty")]
    pub extensions: Extensions,
}

impl SchemaForm {
    pub fn column_mut(&mut self, id: &str) -> Option<&mut ColumnForm> {
        self.columns.iter_mut().find(|c| c.id == id)
    }
}

impl ResourceForm for SchemaForm {
    type Spec = SchemaSpec;

    const KIND: ResourceKind = ResourceKind::Schema;

    fn from_dto(dto: &Resource<SchemaSpec>) -> Self {
        Self {
            metadata: dto.metadata.clone(),
            columns: dto.spec.columns.iter().map(ColumnForm::from_spec).collect(),
            extensions: Extensions::capture(dto),
        }
    }

    fn to_dto(&self) -> Resource<SchemaSpec> {
        let spec = SchemaSpec {
            columns: self.columns.iter().map(ColumnForm::to_spec).collect(),
            extra: Map::new(),
        };
        self.extensions.assemble(&self.metadata, spec)
    }

    fn default_form() -> Self {
        Self {
            metadata: Metadata::namespaced("default", ""),
            ..Default::default()
        }
    }

    fn metadata(&self) -> &Metadata {
        &self.metadata
    }

    fn metadata_mut(&mut self) -> &mut Metadata {
        &mut self.metadata
    }

    fn reconcile(&mut self, previous: &Self) {
        self.reconcile_columns(previous);
    }

    fn validate(&self) -> Vec<FieldError> {
        let mut errors = crate::convert::validate_metadata(Self::KIND, &self.metadata);
        for (i, column) in self.columns.iter().enumerate() {
            if column.name.is_empty() {
                errors.push(FieldError::new(format!("columns[{}].name", i), "is required"));
            }
            if column.use_formula && column.formula_name.is_empty() {
                errors.push(FieldError::new(format!("columns[{}].formulaName", i), "is required"));
            }
            if !column.use_formula && column.kind.is_empty() {
                errors.push(FieldError::new(format!("columns[{}].kind", i), "is required"));
            }
        }
        errors
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample() -> Resource<SchemaSpec> {
        serde_json::from_value(json!({
            "metadata": {"namespace": "default", "name": "orders"},
            "spec": {
                "columns": [
                    {"name": "id", "type": "uuid"},
                    {"name": "price", "type": "price", "params": {"min": "1", "max": "100"}},
                    {"name": "total", "formula": {"name": "Sum", "args": "", "fieldNames": ["price"]}}
                ],
                "description": "kept as is"
            }
        }))
        .unwrap()
    }

    #[test]
    fn test_schema_round_trip() {
        let dto = sample();
        let form = SchemaForm::from_dto(&dto);
        assert_eq!(form.columns.len(), 3);
        assert!(!form.columns[0].use_formula);
        assert!(form.columns[2].use_formula);
        assert_eq!(form.to_dto(), dto);
    }

    #[test]
    fn test_formula_omitted_when_disabled() {
        let mut form = SchemaForm::from_dto(&sample());
        form.columns[2].use_formula = false;
        form.columns[2].kind = "number".into();
        let dto = form.to_dto();
        assert!(dto.spec.columns[2].formula.is_none());
        assert_eq!(dto.spec.columns[2].kind, "number");
    }

    #[test]
    fn test_schema_validation() {
        let mut form = SchemaForm::default_form();
        form.metadata.name = "orders".into();
        form.columns.push(ColumnForm::new("", ""));
        let fields: Vec<_> = form.validate().into_iter().map(|e| e.field).collect();
        assert_eq!(fields, vec!["columns[0].name", "columns[0].kind"]);
    }
}
