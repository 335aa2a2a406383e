///! Bulk import and export of resource archives

use super::{spinner, Context};
use anyhow::{anyhow, bail, Context as _, Result};
use plantd_cli::api::ExportItem;
use plantd_cli::output;
use plantd_common::{Metadata, ResourceKind};
use std::path::Path;

pub async fn import(ctx: &Context, file: &Path) -> Result<()> {
    let progress = spinner(format!("Importing {}...", file.display()));
    let result = ctx.api.import_file(file).await;
    progress.finish_and_clear();

    let summary = result.map_err(|e| anyhow!("Import failed: {}", e.user_message()))?;
    // an archive may touch any kind
    ctx.resources.invalidate_all().await;
    output::print_import_summary(&summary, ctx.output)
}

pub async fn export(ctx: &Context, output_file: &Path, resources: &[String]) -> Result<()> {
    let items = resources
        .iter()
        .map(|r| parse_export_item(r))
        .collect::<Result<Vec<_>>>()?;

    let progress = spinner(format!("Exporting {} resource(s)...", items.len()));
    let result = ctx.api.export(&items).await;
    progress.finish_and_clear();

    let archive = result.map_err(|e| anyhow!("Export failed: {}", e.user_message()))?;
    std::fs::write(output_file, &archive)
        .with_context(|| format!("Cannot write {}", output_file.display()))?;
    output::print_success(&format!(
        "Exported {} resource(s) to {}",
        items.len(),
        output_file.display()
    ));
    Ok(())
}

/// `<kind>/<namespace>/<name>`, or `<kind>/<name>` for cluster-scoped kinds
fn parse_export_item(raw: &str) -> Result<ExportItem> {
    let Some((kind, identity)) = raw.split_once('/') else {
        bail!("Expected <kind>/<namespace>/<name>, got '{}'", raw);
    };
    let kind: ResourceKind = kind.parse()?;
    let metadata: Metadata = identity.parse()?;
    if kind.is_namespaced() != metadata.namespace.is_some() {
        bail!("'{}' does not identify a {}", raw, kind);
    }
    Ok(ExportItem::new(kind, &metadata))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_export_items() {
        let item = parse_export_item("schema/default/orders").unwrap();
        assert_eq!(item.kind, ResourceKind::Schema);
        assert_eq!(item.namespace, "default");
        assert_eq!(item.name, "orders");

        let item = parse_export_item("namespaces/team-a").unwrap();
        assert_eq!(item.kind, ResourceKind::Namespace);
        assert_eq!(item.namespace, "");

        assert!(parse_export_item("schema/orders").is_err());
        assert!(parse_export_item("namespace/default/x").is_err());
        assert!(parse_export_item("widgets/default/x").is_err());
        assert!(parse_export_item("orders").is_err());
    }
}
