///! Resource commands: list, get, create/clone/edit and delete

use super::{spinner, Context};
use anyhow::{bail, Result};
use dialoguer::{Confirm, Editor};
use plantd_cli::api::ResourceApi;
use plantd_cli::editor::{EditorParams, Navigation, ResourceEditor};
use plantd_cli::error::{toast, Action, EditorError};
use plantd_cli::list::ResourceList;
use plantd_cli::notify::ConsoleNotifier;
use plantd_cli::output::{self, OutputFormat};
use plantd_cli::shutdown::Shutdown;
use plantd_cli::table::{AutoConfirm, DialoguerConfirm, ResourceTable, SortOrder};
use plantd_common::{with_form_type, AnyResource, ResourceForm, ResourceKind};
use serde_json::{Map, Value};
use std::path::PathBuf;
use std::time::Duration;

fn table_for(kind: ResourceKind, namespace: Option<String>, sort: Option<&str>, desc: bool) -> ResourceTable {
    let mut table = ResourceTable::new(kind);
    table.select_namespace(namespace);
    if let Some(column) = sort {
        let order = if desc { SortOrder::Descending } else { SortOrder::Ascending };
        if !table.sort_by(column, order) {
            output::print_warning(&format!("Cannot sort by '{}'", column));
        }
    }
    table
}

fn print_items(table: &ResourceTable, items: &[AnyResource], format: OutputFormat) -> Result<()> {
    let rows = table.rows(items);
    match format {
        OutputFormat::Table => output::print_rows(&table.headers(), &rows),
        _ => {
            let visible: Vec<&AnyResource> = rows.iter().map(|r| r.resource).collect();
            output::print_single(&visible, format)?;
        }
    }
    Ok(())
}

pub async fn list(
    ctx: &Context,
    kind: ResourceKind,
    namespace: Option<String>,
    watch: u64,
    sort: Option<String>,
    desc: bool,
) -> Result<()> {
    let table = table_for(kind, namespace, sort.as_deref(), desc);
    let mut list = ResourceList::new(
        kind,
        ctx.resources.clone(),
        ConsoleNotifier,
        Duration::from_secs(watch),
    );

    if watch == 0 {
        let progress = spinner(format!("Fetching {}...", kind.plural()));
        let result = list.refresh().await;
        progress.finish_and_clear();
        let items = result?;
        return print_items(&table, &items, ctx.output);
    }

    let shutdown = Shutdown::new();
    shutdown.listen_for_ctrl_c();

    let mut snapshots = list.subscribe();
    let format = ctx.output;
    let printer = tokio::spawn(async move {
        while snapshots.changed().await.is_ok() {
            let snapshot = snapshots.borrow_and_update().clone();
            if snapshot.loading || snapshot.error.is_some() {
                continue;
            }
            println!("{}", chrono::Local::now().format("%H:%M:%S"));
            if let Err(e) = print_items(&table, &snapshot.items, format) {
                output::print_error(&e.to_string());
            }
        }
    });

    list.watch(shutdown.subscribe()).await;
    drop(list);
    printer.await?;
    Ok(())
}

pub async fn get(ctx: &Context, kind: ResourceKind, target: &[String]) -> Result<()> {
    let metadata = ctx.identity(kind, target)?;
    match ctx.resources.get(kind, &metadata).await {
        Ok(resource) => output::print_single(&resource, ctx.output),
        Err(err) => bail!(toast(Action::Get, kind, &err)),
    }
}

pub async fn delete(ctx: &Context, kind: ResourceKind, target: &[String], yes: bool) -> Result<()> {
    let metadata = ctx.identity(kind, target)?;
    let row = AnyResource::new(metadata, Value::Object(Map::new()));
    let table = ResourceTable::new(kind);

    let deleted = if yes {
        table.delete_row(&*ctx.resources, &ConsoleNotifier, &AutoConfirm(true), &row).await
    } else {
        table.delete_row(&*ctx.resources, &ConsoleNotifier, &DialoguerConfirm, &row).await
    };

    match deleted {
        Ok(true) => Ok(()),
        Ok(false) => {
            output::print_info("Deletion cancelled");
            Ok(())
        }
        Err(err) => Err(err.into()),
    }
}

pub async fn edit(
    ctx: &Context,
    kind: ResourceKind,
    action: &str,
    target: &[String],
    file: Option<PathBuf>,
) -> Result<()> {
    let params = ctx.params(kind, action, target);
    with_form_type!(kind, F => edit_form::<F>(ctx, &params, file).await)
}

/// Loads the form, lets the operator edit it as YAML and submits it.
/// Failed submissions reopen the editor with the rejected text.
async fn edit_form<F: ResourceForm>(ctx: &Context, params: &EditorParams, file: Option<PathBuf>) -> Result<()> {
    let mut editor = ResourceEditor::<F, _, _>::new(params, ctx.resources.clone(), ConsoleNotifier)?;

    let mut text = match &file {
        Some(path) => std::fs::read_to_string(path)?,
        None => {
            let progress = spinner(format!("Loading {}...", F::KIND));
            let form = editor.load().await;
            progress.finish_and_clear();
            let mut form = form?;
            if let Some(namespace) = ctx.default_namespace.as_deref() {
                if params.action == "create" && F::KIND.is_namespaced() {
                    form.metadata_mut().namespace = Some(namespace.to_string());
                }
            }
            serde_yaml::to_string(&form)?
        }
    };

    loop {
        if file.is_none() {
            match Editor::new().extension(".yaml").edit(&text)? {
                Some(edited) => text = edited,
                None => {
                    output::print_info("Edit cancelled");
                    return Ok(());
                }
            }
        }

        let outcome = match serde_yaml::from_str::<F>(&text) {
            Ok(form) => editor.submit(&form).await,
            Err(e) => Err(EditorError::Convert(e.into())),
        };

        match outcome {
            Ok(Navigation::Back) => return Ok(()),
            Err(EditorError::Validation(errors)) => {
                for error in &errors {
                    output::print_error(&error.to_string());
                }
            }
            Err(EditorError::Convert(e)) => output::print_error(&format!("Invalid form: {}", e)),
            // notified by the editor
            Err(EditorError::Api(_)) => {}
            Err(e) => return Err(e.into()),
        }

        if file.is_some() {
            bail!("{} was not saved", F::KIND);
        }
        let retry = Confirm::new()
            .with_prompt("Reopen the editor?")
            .default(true)
            .interact()?;
        if !retry {
            bail!("{} was not saved", F::KIND);
        }
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use plantd_cli::api::ApiClient;
    use plantd_cli::error::ApiError;

    fn unreachable() -> Context {
        let api = ApiClient::new("http://127.0.0.1:9", Duration::from_secs(1)).unwrap();
        Context::new(api, OutputFormat::Json, None)
    }

    #[tokio::test]
    async fn test_failures_are_returned_to_main() {
        let ctx = unreachable();
        let err = list(&ctx, ResourceKind::Schema, None, 0, None, false)
            .await
            .unwrap_err();
        assert_eq!(err.downcast_ref::<ApiError>().map(|e| e.status), Some(0));

        let target = vec!["default/orders".to_string()];
        let err = delete(&ctx, ResourceKind::Schema, &target, true).await.unwrap_err();
        assert_eq!(err.downcast_ref::<ApiError>().map(|e| e.status), Some(0));
    }
}
