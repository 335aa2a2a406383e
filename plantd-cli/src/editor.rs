///! Create, clone and edit workflow for a single resource

use crate::api::ResourceApi;
use crate::error::{toast, Action, ApiError, EditorError, RouteError};
use crate::notify::Notifier;
use plantd_common::{Metadata, ResourceForm, ResourceKind};
use serde::{Deserialize, Serialize};

/// Raw editor parameters as they arrive from the command line
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EditorParams {
    pub action: String,
    pub namespace: Option<String>,
    pub name: Option<String>,
}

impl EditorParams {
    pub fn new(action: &str, namespace: Option<&str>, name: Option<&str>) -> Self {
        Self {
            action: action.to_string(),
            namespace: namespace.map(str::to_string),
            name: name.map(str::to_string),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditorMode {
    Create,
    Clone(Metadata),
    Edit(Metadata),
}

impl EditorMode {
    /// Clone and edit need the source identity; the namespace may be left out
    /// only for cluster-scoped kinds
    pub fn from_params(kind: ResourceKind, params: &EditorParams) -> Result<Self, RouteError> {
        let present = |v: &Option<String>| v.as_deref().filter(|s| !s.is_empty()).map(str::to_string);
        let identity = || -> Result<Metadata, RouteError> {
            let missing = || RouteError::MissingIdentity {
                action: params.action.clone(),
            };
            let name = present(&params.name).ok_or_else(missing)?;
            if kind.is_namespaced() {
                let namespace = present(&params.namespace).ok_or_else(missing)?;
                Ok(Metadata::namespaced(namespace, name))
            } else {
                Ok(Metadata::cluster(name))
            }
        };

        match params.action.as_str() {
            "create" => Ok(Self::Create),
            "clone" => identity().map(Self::Clone),
            "edit" => identity().map(Self::Edit),
            other => Err(RouteError::UnknownAction(other.to_string())),
        }
    }

    pub fn source(&self) -> Option<&Metadata> {
        match self {
            Self::Create => None,
            Self::Clone(m) | Self::Edit(m) => Some(m),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MutationState {
    Idle,
    Pending,
    Succeeded,
    Failed(ApiError),
}

/// Where the caller should go after a successful submit
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Navigation {
    Back,
}

pub struct ResourceEditor<F, B, N> {
    mode: EditorMode,
    backend: B,
    notifier: N,
    state: MutationState,
    loaded: Option<F>,
}

impl<F, B, N> ResourceEditor<F, B, N>
where
    F: ResourceForm,
    B: ResourceApi,
    N: Notifier,
{
    pub fn new(params: &EditorParams, backend: B, notifier: N) -> Result<Self, RouteError> {
        let mode = EditorMode::from_params(F::KIND, params)?;
        Ok(Self {
            mode,
            backend,
            notifier,
            state: MutationState::Idle,
            loaded: None,
        })
    }

    pub fn mode(&self) -> &EditorMode {
        &self.mode
    }

    pub fn state(&self) -> &MutationState {
        &self.state
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Initial form: defaults in create mode, the stored resource otherwise
    pub async fn load(&mut self) -> Result<F, EditorError> {
        let Some(source) = self.mode.source().cloned() else {
            let form = F::default_form();
            self.loaded = Some(form.clone());
            return Ok(form);
        };

        let resource = match self.backend.get(F::KIND, &source).await {
            Ok(resource) => resource,
            Err(err) => {
                self.notifier.error(&toast(Action::Get, F::KIND, &err));
                return Err(err.into());
            }
        };
        let form = F::from_dto(&resource.into_typed::<F::Spec>()?);
        tracing::debug!(kind = %F::KIND, resource = %source, "loaded form");
        self.loaded = Some(form.clone());
        Ok(form)
    }

    /// Validates and sends the form. Failures leave the editor ready for another submit.
    /// After `load`, the form is first reconciled against the loaded one.
    pub async fn submit(&mut self, form: &F) -> Result<Navigation, EditorError> {
        let mut form = form.clone();
        if let Some(previous) = &self.loaded {
            form.reconcile(previous);
        }
        let errors = form.validate();
        if !errors.is_empty() {
            return Err(EditorError::Validation(errors));
        }

        let mut dto = form.to_dto();
        if let EditorMode::Edit(identity) = &self.mode {
            dto.metadata = identity.clone();
        }
        let resource = dto.into_any()?;

        self.state = MutationState::Pending;
        let (action, result) = match self.mode {
            EditorMode::Create | EditorMode::Clone(_) => {
                (Action::Create, self.backend.create(F::KIND, &resource).await)
            }
            EditorMode::Edit(_) => (Action::Update, self.backend.update(F::KIND, &resource).await),
        };

        match result {
            Ok(()) => {
                self.state = MutationState::Succeeded;
                let verb = if action == Action::Create { "created" } else { "updated" };
                self.notifier
                    .success(&format!("{} '{}' {}", F::KIND, resource.metadata, verb));
                self.state = MutationState::Idle;
                Ok(Navigation::Back)
            }
            Err(err) => {
                self.notifier.error(&toast(action, F::KIND, &err));
                self.state = MutationState::Failed(err.clone());
                Err(err.into())
            }
        }
    }
}
