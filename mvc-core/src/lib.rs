//! Controller activation and request lifecycle engine.
//!
//! A controller type is inspected once into a [`Descriptor`]; every route in
//! its table then becomes a [`Handler`] that allocates a fresh instance per
//! request and drives it through bind, begin, dispatch, model propagation and
//! end. The [`Registrar`] ties the pieces together and hands each handler chain
//! to a host router callback.

pub mod binder;
pub mod config;
pub mod context;
pub mod controller;
pub mod descriptor;
pub mod diagnostics;
pub mod error;
pub mod model;
pub mod persistence;
pub mod prelude;
pub mod registrar;
pub mod resolver;

pub use binder::{BindField, BindValues, Bindable, Binder};
pub use config::{ConfigError, ConfigValue, FromConfigValue, MvcConfig, MvcSettings};
pub use context::{Context, Handler, ResponseParts};
pub use controller::{BaseController, Capabilities, Controller, Template};
pub use descriptor::Descriptor;
pub use diagnostics::{Diagnostic, DiagnosticsSink, RecordingSink, TracingSink};
pub use error::{ActivationError, BoxError, ResolveError};
pub use model::{Model, ModelController, ModelField};
pub use persistence::{Persistent, PersistenceController, PersistentField};
pub use registrar::{register_method_handlers, Registrar, Registration};
pub use resolver::{resolve, routes_conflict, MethodDescriptor, Resolution, Route, Verb};
