///! Base resource table: columns, sorting, namespace filter and row actions

use crate::api::ResourceApi;
use crate::error::{toast, Action, ApiError};
use crate::notify::Notifier;
use plantd_common::util::sort_namespace;
use plantd_common::{AnyResource, ResourceKind, ResourceRef};
use std::cmp::Ordering;

type CellFn = Box<dyn Fn(&AnyResource) -> String + Send + Sync>;
type RowPredicate = Box<dyn Fn(&AnyResource) -> bool + Send + Sync>;

pub struct Column {
    pub title: String,
    pub sortable: bool,
    cell: CellFn,
    compare: fn(&str, &str) -> Ordering,
}

impl Column {
    pub fn new(
        title: impl Into<String>,
        cell: impl Fn(&AnyResource) -> String + Send + Sync + 'static,
    ) -> Self {
        Self {
            title: title.into(),
            sortable: false,
            cell: Box::new(cell),
            compare: <str as Ord>::cmp,
        }
    }

    pub fn sortable(mut self) -> Self {
        self.sortable = true;
        self
    }

    /// Sortable with a custom ordering of cell values
    pub fn sorted_by(mut self, compare: fn(&str, &str) -> Ordering) -> Self {
        self.compare = compare;
        self.sortable()
    }

    pub fn value(&self, row: &AnyResource) -> String {
        (self.cell)(row)
    }

    pub fn compare(&self, a: &AnyResource, b: &AnyResource) -> Ordering {
        (self.compare)(&self.value(a), &self.value(b))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowAction {
    Clone,
    Edit,
    Delete,
}

/// Per-row switch for an action column
pub enum ActionGate {
    Static(bool),
    When(RowPredicate),
}

impl ActionGate {
    pub fn when(predicate: impl Fn(&AnyResource) -> bool + Send + Sync + 'static) -> Self {
        Self::When(Box::new(predicate))
    }

    pub fn allows(&self, row: &AnyResource) -> bool {
        match self {
            Self::Static(enabled) => *enabled,
            Self::When(predicate) => predicate(row),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    Ascending,
    Descending,
}

/// One rendered row
#[derive(Debug, Clone, PartialEq)]
pub struct TableRow<'a> {
    pub key: String,
    pub cells: Vec<String>,
    pub actions: Vec<RowAction>,
    pub resource: &'a AnyResource,
}

/// Asks the operator before destructive actions
pub trait Confirm {
    fn confirm(&self, prompt: &str) -> bool;
}

/// Interactive yes/no prompt; an unusable terminal counts as "no"
#[derive(Debug, Default, Clone, Copy)]
pub struct DialoguerConfirm;

impl Confirm for DialoguerConfirm {
    fn confirm(&self, prompt: &str) -> bool {
        dialoguer::Confirm::new()
            .with_prompt(prompt)
            .default(false)
            .interact()
            .unwrap_or(false)
    }
}

/// Fixed answer, for `--yes` and tests
#[derive(Debug, Clone, Copy)]
pub struct AutoConfirm(pub bool);

impl Confirm for AutoConfirm {
    fn confirm(&self, _prompt: &str) -> bool {
        self.0
    }
}

pub struct ResourceTable {
    kind: ResourceKind,
    columns: Vec<Column>,
    namespace_selection: bool,
    namespace: Option<String>,
    sort: Option<(usize, SortOrder)>,
    clone_gate: ActionGate,
    edit_gate: ActionGate,
    delete_gate: ActionGate,
}

impl ResourceTable {
    /// Namespace (for namespaced kinds), name and status columns; every action enabled
    pub fn new(kind: ResourceKind) -> Self {
        let mut columns = Vec::new();
        if kind.is_namespaced() {
            columns.push(
                Column::new("Namespace", |r| r.metadata.namespace.clone().unwrap_or_default())
                    .sorted_by(sort_namespace),
            );
        }
        columns.push(Column::new("Name", |r| r.metadata.name.clone()).sortable());
        columns.push(Column::new("Status", AnyResource::status_summary));

        Self {
            kind,
            columns,
            namespace_selection: kind.is_namespaced(),
            namespace: None,
            sort: None,
            clone_gate: ActionGate::Static(true),
            edit_gate: ActionGate::Static(true),
            delete_gate: ActionGate::Static(true),
        }
    }

    pub fn kind(&self) -> ResourceKind {
        self.kind
    }

    pub fn with_column(mut self, column: Column) -> Self {
        self.columns.push(column);
        self
    }

    pub fn with_namespace_selection(mut self, enabled: bool) -> Self {
        self.namespace_selection = enabled;
        self
    }

    pub fn with_gate(mut self, action: RowAction, gate: ActionGate) -> Self {
        match action {
            RowAction::Clone => self.clone_gate = gate,
            RowAction::Edit => self.edit_gate = gate,
            RowAction::Delete => self.delete_gate = gate,
        }
        self
    }

    /// `None` shows every namespace
    pub fn select_namespace(&mut self, namespace: Option<String>) {
        self.namespace = namespace;
    }

    /// Returns false when the column is unknown or not sortable
    pub fn sort_by(&mut self, title: &str, order: SortOrder) -> bool {
        let found = self
            .columns
            .iter()
            .position(|c| c.sortable && c.title.eq_ignore_ascii_case(title));
        if let Some(index) = found {
            self.sort = Some((index, order));
        }
        found.is_some()
    }

    pub fn headers(&self) -> Vec<String> {
        let mut headers: Vec<String> = self.columns.iter().map(|c| c.title.clone()).collect();
        headers.push("Actions".to_string());
        headers
    }

    pub fn allowed(&self, action: RowAction, row: &AnyResource) -> bool {
        let gate = match action {
            RowAction::Clone => &self.clone_gate,
            RowAction::Edit => &self.edit_gate,
            RowAction::Delete => &self.delete_gate,
        };
        gate.allows(row)
    }

    pub fn rows<'a>(&self, items: &'a [AnyResource]) -> Vec<TableRow<'a>> {
        let mut visible: Vec<&AnyResource> = items
            .iter()
            .filter(|r| match (&self.namespace, self.namespace_selection) {
                (Some(ns), true) => r.metadata.namespace.as_deref() == Some(ns.as_str()),
                _ => true,
            })
            .collect();

        if let Some((index, order)) = self.sort {
            let column = &self.columns[index];
            visible.sort_by(|a, b| {
                let ordering = column.compare(a, b);
                match order {
                    SortOrder::Ascending => ordering,
                    SortOrder::Descending => ordering.reverse(),
                }
            });
        }

        visible
            .into_iter()
            .map(|resource| TableRow {
                key: resource.metadata.key(),
                cells: self.columns.iter().map(|c| c.value(resource)).collect(),
                actions: [RowAction::Clone, RowAction::Edit, RowAction::Delete]
                    .into_iter()
                    .filter(|a| self.allowed(*a, resource))
                    .collect(),
                resource,
            })
            .collect()
    }

    /// Confirms, then deletes. `Ok(false)` when the action is gated off or declined.
    pub async fn delete_row<B, N, C>(
        &self,
        backend: &B,
        notifier: &N,
        confirm: &C,
        row: &AnyResource,
    ) -> Result<bool, ApiError>
    where
        B: ResourceApi + ?Sized,
        N: Notifier + ?Sized,
        C: Confirm + ?Sized,
    {
        if !self.allowed(RowAction::Delete, row) {
            return Ok(false);
        }
        let prompt = format!("Delete {} '{}'?", self.kind, row.metadata);
        if !confirm.confirm(&prompt) {
            tracing::debug!(resource = %row.metadata, "deletion declined");
            return Ok(false);
        }

        match backend.delete(self.kind, &row.metadata).await {
            Ok(()) => {
                notifier.success(&format!("{} '{}' deleted", self.kind, row.metadata));
                Ok(true)
            }
            Err(err) => {
                notifier.error(&toast(Action::Delete, self.kind, &err));
                Err(err)
            }
        }
    }
}

/// Entry of a resource picker
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectOption {
    pub label: String,
    pub value: ResourceRef,
}

/// Picker options labelled `namespace/name`, default namespace first
pub fn resource_options(items: &[AnyResource]) -> Vec<SelectOption> {
    let mut options: Vec<SelectOption> = items
        .iter()
        .map(|r| SelectOption {
            label: r.metadata.key(),
            value: ResourceRef::from(&r.metadata),
        })
        .collect();
    options.sort_by(|a, b| match sort_namespace(&a.value.namespace, &b.value.namespace) {
        Ordering::Equal => a.value.name.cmp(&b.value.name),
        other => other,
    });
    options
}

/// Distinct namespaces of `items`, default first
pub fn namespaces(items: &[AnyResource]) -> Vec<String> {
    let mut names: Vec<String> = items
        .iter()
        .filter_map(|r| r.metadata.namespace.clone())
        .collect();
    names.sort_by(|a, b| sort_namespace(a, b));
    names.dedup();
    names
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn resource(namespace: &str, name: &str, state: &str) -> AnyResource {
        serde_json::from_value(json!({
            "metadata": {"namespace": namespace, "name": name},
            "spec": {},
            "status": {"experimentState": state}
        }))
        .unwrap()
    }

    fn items() -> Vec<AnyResource> {
        vec![
            resource("team", "b", "Running"),
            resource("default", "c", "Finished"),
            resource("default", "a", "Running"),
        ]
    }

    #[test]
    fn test_namespace_filter_only_when_enabled() {
        let items = items();
        let mut table = ResourceTable::new(ResourceKind::Experiment);
        table.select_namespace(Some("default".into()));
        assert_eq!(table.rows(&items).len(), 2);

        let mut table = table.with_namespace_selection(false);
        table.select_namespace(Some("default".into()));
        assert_eq!(table.rows(&items).len(), 3);
    }

    #[test]
    fn test_sorting_is_stable() {
        let items = items();
        let mut table = ResourceTable::new(ResourceKind::Experiment);
        assert!(!table.sort_by("Status", SortOrder::Ascending));
        assert!(table.sort_by("namespace", SortOrder::Ascending));
        let keys: Vec<_> = table.rows(&items).into_iter().map(|r| r.key).collect();
        assert_eq!(keys, vec!["default/c", "default/a", "team/b"]);

        table.sort_by("Name", SortOrder::Descending);
        let keys: Vec<_> = table.rows(&items).into_iter().map(|r| r.key).collect();
        assert_eq!(keys, vec!["default/c", "team/b", "default/a"]);
    }

    #[test]
    fn test_namespace_column_puts_default_first() {
        let mut items = items();
        items.push(resource("alpha", "d", "Running"));
        let mut table = ResourceTable::new(ResourceKind::Experiment);
        table.sort_by("Namespace", SortOrder::Ascending);
        let keys: Vec<_> = table.rows(&items).into_iter().map(|r| r.key).collect();
        assert_eq!(keys, vec!["default/c", "default/a", "alpha/d", "team/b"]);

        table.sort_by("Namespace", SortOrder::Descending);
        let keys: Vec<_> = table.rows(&items).into_iter().map(|r| r.key).collect();
        assert_eq!(keys, vec!["team/b", "alpha/d", "default/c", "default/a"]);
    }

    #[test]
    fn test_action_gates() {
        let items = items();
        let table = ResourceTable::new(ResourceKind::Experiment)
            .with_gate(RowAction::Clone, ActionGate::Static(false))
            .with_gate(
                RowAction::Delete,
                ActionGate::when(|r| r.status_summary() != "Running"),
            );
        let rows = table.rows(&items);
        assert_eq!(rows[0].actions, vec![RowAction::Edit]);
        assert_eq!(rows[1].actions, vec![RowAction::Edit, RowAction::Delete]);
        assert_eq!(table.headers(), vec!["Namespace", "Name", "Status", "Actions"]);
        assert_eq!(rows[1].cells, vec!["default", "c", "Finished"]);
    }

    #[test]
    fn test_options_and_namespaces() {
        let items = items();
        let labels: Vec<_> = resource_options(&items).into_iter().map(|o| o.label).collect();
        assert_eq!(labels, vec!["default/a", "default/c", "team/b"]);
        assert_eq!(namespaces(&items), vec!["default", "team"]);
    }
}
