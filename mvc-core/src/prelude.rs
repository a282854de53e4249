//! Everything a controller author needs, in one import.
//!
//! ```ignore
//! use mvc_core::prelude::*;
//! ```

pub use crate::binder::{BindField, BindValues, Bindable};
pub use crate::context::{Context, Handler};
pub use crate::controller::{BaseController, Capabilities, Controller, Template};
pub use crate::error::{ActivationError, BoxError};
pub use crate::model::{Model, ModelField};
pub use crate::persistence::{Persistent, PersistentField};
pub use crate::registrar::Registrar;
pub use crate::resolver::{Route, Verb};
pub use http::{Method, StatusCode};
