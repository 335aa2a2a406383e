//! PlantD studio client library
//!
//! REST access to the PlantD backend plus the editor, list, table and
//! dashboard workflows the `plantd` binary is built from. Every workflow
//! talks to the backend through [`api::ResourceApi`] or [`widget::DataSource`],
//! so it can be driven against an in-memory backend.

pub mod api;
pub mod cache;
pub mod config;
pub mod editor;
pub mod error;
pub mod list;
pub mod logging;
pub mod notify;
pub mod output;
pub mod refresh;
pub mod shutdown;
pub mod table;
pub mod widget;

pub use api::{ApiClient, ResourceApi};
pub use error::{ApiError, EditorError, RouteError};
