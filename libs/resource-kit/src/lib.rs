//! Resource kit: a generic controller that derives list / fetch / search / create
//! endpoints from any backing model that follows the `ResourceModel` conventions.
//!
//! The crate is transport-agnostic. Operations take already-extracted request
//! parameters and return an [`Envelope`]; binding them to HTTP lives elsewhere.

pub mod config;
pub mod controller;
pub mod envelope;
pub mod error;
pub mod format;
pub mod hub;
pub mod model;
pub mod params;

pub use config::{ConfigError, ControllerConfig};
pub use controller::ResourceController;
pub use envelope::Envelope;
pub use error::ControllerError;
pub use format::{IdLabel, ItemFormatter};
pub use hub::{HubError, ModelHub, ModelProvider};
pub use model::{
    FieldDescriptor, Fields, Filters, Item, ItemId, ModelError, ResourceModel, SearchResult,
    INTERNAL_ERROR_MESSAGE,
};
