///! Command handlers for the `plantd` binary

pub mod bulk;
pub mod config;
pub mod dashboard;
pub mod resource;

use indicatif::{ProgressBar, ProgressStyle};
use plantd_cli::api::ApiClient;
use plantd_cli::cache::QueryCache;
use plantd_cli::editor::EditorParams;
use plantd_cli::output::OutputFormat;
use plantd_common::util::DEFAULT_NAMESPACE;
use plantd_common::{Metadata, ResourceKind};
use std::sync::Arc;
use std::time::Duration;

/// How long a cached read is served before it is refetched
const CACHE_STALE_AFTER: Duration = Duration::from_secs(30);

/// Settings shared by every handler
pub struct Context {
    pub api: ApiClient,
    /// Resource reads and mutations go through here
    pub resources: Arc<QueryCache<ApiClient>>,
    pub output: OutputFormat,
    pub default_namespace: Option<String>,
}

impl Context {
    pub fn new(api: ApiClient, output: OutputFormat, default_namespace: Option<String>) -> Self {
        Self {
            resources: Arc::new(QueryCache::new(api.clone(), CACHE_STALE_AFTER)),
            api,
            output,
            default_namespace,
        }
    }

    pub fn namespace(&self) -> &str {
        self.default_namespace.as_deref().unwrap_or(DEFAULT_NAMESPACE)
    }

    /// Editor parameters from `<namespace> <name>`, `<namespace>/<name>` or `<name>`
    pub fn params(&self, kind: ResourceKind, action: &str, target: &[String]) -> EditorParams {
        let (namespace, name) = match target {
            [] => (None, None),
            [namespace, name, ..] => (Some(namespace.as_str()), Some(name.as_str())),
            [single] => match single.split_once('/') {
                Some((namespace, name)) => (Some(namespace), Some(name)),
                None if kind.is_namespaced() => (Some(self.namespace()), Some(single.as_str())),
                None => (None, Some(single.as_str())),
            },
        };
        EditorParams::new(action, namespace, name)
    }

    /// Identity of an existing resource; same rules as the editor
    pub fn identity(&self, kind: ResourceKind, target: &[String]) -> anyhow::Result<Metadata> {
        let params = self.params(kind, "edit", target);
        let mode = plantd_cli::editor::EditorMode::from_params(kind, &params)?;
        mode.source()
            .cloned()
            .ok_or_else(|| anyhow::anyhow!("{} requires a name", kind))
    }
}

pub fn spinner(message: impl Into<String>) -> ProgressBar {
    let spinner = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.green} {msg}") {
        spinner.set_style(style);
    }
    spinner.set_message(message.into());
    spinner.enable_steady_tick(Duration::from_millis(100));
    spinner
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ctx() -> Context {
        Context::new(
            ApiClient::new("http://localhost:5000", Duration::from_secs(1)).unwrap(),
            OutputFormat::Table,
            Some("team-a".into()),
        )
    }

    #[test]
    fn test_target_forms() {
        let ctx = ctx();
        let two = vec!["default".to_string(), "orders".to_string()];
        assert_eq!(
            ctx.identity(ResourceKind::Schema, &two).unwrap(),
            Metadata::namespaced("default", "orders")
        );

        let slash = vec!["default/orders".to_string()];
        assert_eq!(
            ctx.identity(ResourceKind::Schema, &slash).unwrap(),
            Metadata::namespaced("default", "orders")
        );

        let bare = vec!["orders".to_string()];
        assert_eq!(
            ctx.identity(ResourceKind::Schema, &bare).unwrap(),
            Metadata::namespaced("team-a", "orders")
        );
        assert_eq!(
            ctx.identity(ResourceKind::Namespace, &bare).unwrap(),
            Metadata::cluster("orders")
        );
    }
}
