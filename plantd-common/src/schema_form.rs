//! Column edits with dependent-field resets
//!
//! Changing what drives a column's generator invalidates the settings that
//! were tailored to the old value: a new faker type clears its params, a new
//! formula clears its arguments. Updates are applied as one batch, then every
//! driving field whose value changed resets its dependent field, unless the
//! batch wrote that dependent field too.

use crate::convert::KeyValue;
use crate::kinds::{ColumnForm, SchemaForm};
use serde::{Deserialize, Serialize};

/// Editable fields of a schema column
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ColumnField {
    Name,
    Type,
    Params,
    UseFormula,
    FormulaName,
    FormulaArgs,
    FormulaFieldNames,
}

/// `(driver, dependent)` pairs
pub const DEPENDENCIES: [(ColumnField, ColumnField); 2] = [
    (ColumnField::Type, ColumnField::Params),
    (ColumnField::FormulaName, ColumnField::FormulaArgs),
];

/// A batch of column writes; `None` leaves the field untouched
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ColumnUpdate {
    pub name: Option<String>,
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub params: Option<Vec<KeyValue>>,
    pub use_formula: Option<bool>,
    pub formula_name: Option<String>,
    pub formula_args: Option<String>,
    pub formula_field_names: Option<Vec<String>>,
}

impl ColumnUpdate {
    pub fn writes(&self, field: ColumnField) -> bool {
        match field {
            ColumnField::Name => self.name.is_some(),
            ColumnField::Type => self.kind.is_some(),
            ColumnField::Params => self.params.is_some(),
            ColumnField::UseFormula => self.use_formula.is_some(),
            ColumnField::FormulaName => self.formula_name.is_some(),
            ColumnField::FormulaArgs => self.formula_args.is_some(),
            ColumnField::FormulaFieldNames => self.formula_field_names.is_some(),
        }
    }
}

/// Applies `update` to `column` and returns the fields that were reset
pub fn apply_update(column: &mut ColumnForm, update: ColumnUpdate) -> Vec<ColumnField> {
    let before = column.clone();
    let explicit: Vec<ColumnField> = DEPENDENCIES
        .iter()
        .map(|(_, dependent)| *dependent)
        .filter(|dependent| update.writes(*dependent))
        .collect();

    if let Some(name) = update.name {
        column.name = name;
    }
    if let Some(kind) = update.kind {
        column.kind = kind;
    }
    if let Some(params) = update.params {
        column.params = params;
    }
    if let Some(use_formula) = update.use_formula {
        column.use_formula = use_formula;
    }
    if let Some(formula_name) = update.formula_name {
        column.formula_name = formula_name;
    }
    if let Some(formula_args) = update.formula_args {
        column.formula_args = formula_args;
    }
    if let Some(names) = update.formula_field_names {
        column.formula_field_names = names;
    }

    let mut reset = Vec::new();
    for (driver, dependent) in DEPENDENCIES {
        if !changed(&before, column, driver) || explicit.contains(&dependent) {
            continue;
        }
        match dependent {
            ColumnField::Params => column.params.clear(),
            ColumnField::FormulaArgs => column.formula_args.clear(),
            _ => continue,
        }
        tracing::debug!(column = %column.name, ?driver, ?dependent, "reset dependent column field");
        reset.push(dependent);
    }
    reset
}

fn changed(before: &ColumnForm, after: &ColumnForm, field: ColumnField) -> bool {
    match field {
        ColumnField::Name => before.name != after.name,
        ColumnField::Type => before.kind != after.kind,
        ColumnField::Params => before.params != after.params,
        ColumnField::UseFormula => before.use_formula != after.use_formula,
        ColumnField::FormulaName => before.formula_name != after.formula_name,
        ColumnField::FormulaArgs => before.formula_args != after.formula_args,
        ColumnField::FormulaFieldNames => before.formula_field_names != after.formula_field_names,
    }
}

/// The writes that turn `before` into `after`
pub fn diff(before: &ColumnForm, after: &ColumnForm) -> ColumnUpdate {
    let touched = |field| changed(before, after, field);
    ColumnUpdate {
        name: touched(ColumnField::Name).then(|| after.name.clone()),
        kind: touched(ColumnField::Type).then(|| after.kind.clone()),
        params: touched(ColumnField::Params).then(|| after.params.clone()),
        use_formula: touched(ColumnField::UseFormula).then_some(after.use_formula),
        formula_name: touched(ColumnField::FormulaName).then(|| after.formula_name.clone()),
        formula_args: touched(ColumnField::FormulaArgs).then(|| after.formula_args.clone()),
        formula_field_names: touched(ColumnField::FormulaFieldNames)
            .then(|| after.formula_field_names.clone()),
    }
}

impl SchemaForm {
    /// Updates the column with row id `id`; `None` when no such row exists
    pub fn update_column(&mut self, id: &str, update: ColumnUpdate) -> Option<Vec<ColumnField>> {
        self.column_mut(id).map(|column| apply_update(column, update))
    }

    /// Replays whole-form edits as column updates against `previous`, matched
    /// by row id. Rows without a counterpart are kept as written.
    pub fn reconcile_columns(&mut self, previous: &SchemaForm) {
        for column in &mut self.columns {
            let Some(before) = previous.columns.iter().find(|c| c.id == column.id) else {
                continue;
            };
            let update = diff(before, column);
            *column = before.clone();
            apply_update(column, update);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn price_column() -> ColumnForm {
        let mut column = ColumnForm::new("price", "price");
        column.params = vec![KeyValue::new("min", "1"), KeyValue::new("max", "100")];
        column.formula_name = "Sum".into();
        column.formula_args = "2".into();
        column
    }

    #[test]
    fn test_type_change_resets_params() {
        let mut column = price_column();
        let reset = apply_update(
            &mut column,
            ColumnUpdate {
                kind: Some("uuid".into()),
                ..Default::default()
            },
        );
        assert_eq!(reset, vec![ColumnField::Params]);
        assert!(column.params.is_empty());
        assert_eq!(column.formula_args, "2");
    }

    #[test]
    fn test_same_value_is_not_a_change() {
        let mut column = price_column();
        let reset = apply_update(
            &mut column,
            ColumnUpdate {
                kind: Some("price".into()),
                formula_name: Some("Sum".into()),
                ..Default::default()
            },
        );
        assert!(reset.is_empty());
        assert_eq!(column.params.len(), 2);
    }

    #[test]
    fn test_bulk_update_resets_consistently() {
        let mut column = price_column();
        let params = vec![KeyValue::new("format", "hex")];
        let reset = apply_update(
            &mut column,
            ColumnUpdate {
                kind: Some("color".into()),
                params: Some(params.clone()),
                formula_name: Some("Concat".into()),
                ..Default::default()
            },
        );
        assert_eq!(reset, vec![ColumnField::FormulaArgs]);
        assert_eq!(column.params, params);
        assert_eq!(column.formula_args, "");
    }

    #[test]
    fn test_update_column_by_row_id() {
        let mut form = SchemaForm::default();
        form.columns.push(price_column());
        let id = form.columns[0].id.clone();

        let update = ColumnUpdate {
            name: Some("cost".into()),
            ..Default::default()
        };
        assert_eq!(form.update_column(&id, update.clone()), Some(vec![]));
        assert_eq!(form.columns[0].name, "cost");
        assert_eq!(form.update_column("missing", update), None);
    }

    #[test]
    fn test_reconcile_resets_by_row_id() {
        let mut previous = SchemaForm::default();
        previous.columns.push(price_column());
        previous.columns.push(price_column());

        let mut edited = previous.clone();
        edited.columns[0].kind = "uuid".into();
        edited.columns[1].kind = "color".into();
        edited.columns[1].params = vec![KeyValue::new("format", "hex")];
        edited.columns[1].formula_name = "Concat".into();
        edited.columns.push(ColumnForm::new("added", "word"));
        edited.columns[2].params = vec![KeyValue::new("max", "3")];

        edited.reconcile_columns(&previous);
        assert!(edited.columns[0].params.is_empty());
        assert_eq!(edited.columns[0].formula_args, "2");
        assert_eq!(edited.columns[1].params, vec![KeyValue::new("format", "hex")]);
        assert_eq!(edited.columns[1].formula_args, "");
        assert_eq!(edited.columns[2].params.len(), 1);
    }

    #[test]
    fn test_diff_writes_only_changes() {
        let before = price_column();
        assert_eq!(diff(&before, &before), ColumnUpdate::default());

        let mut after = before.clone();
        after.use_formula = true;
        let update = diff(&before, &after);
        assert_eq!(update.use_formula, Some(true));
        assert!(!update.writes(ColumnField::Type));
    }
}
