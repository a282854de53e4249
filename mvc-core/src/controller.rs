use std::sync::Arc;

use crate::binder::{BindField, BindValues, Bindable};
use crate::context::Context;
use crate::error::{ActivationError, BoxError};
use crate::model::{Model, ModelField};
use crate::persistence::{Persistent, PersistentField};
use crate::resolver::Route;

/// The hooks every controller must provide.
///
/// `begin_request` and `end_request` are paired: `end_request` runs for every
/// request that reached `begin_request`, and never for one that did not. It
/// is the place to write the response when nothing else has.
#[diagnostic::on_unimplemented(
    message = "`{Self}` cannot be activated as a controller",
    label = "missing `BaseController` implementation",
    note = "implement `set_name`, `begin_request` and `end_request` \
            from `BaseController` for your type"
)]
pub trait BaseController {
    fn set_name(&mut self, name: &str);

    fn begin_request(&mut self, ctx: &mut Context);

    fn end_request(&mut self, ctx: &mut Context);
}

/// A type whose methods are served as routes, one fresh instance per request.
///
/// # Example
///
/// ```ignore
/// #[derive(Default)]
/// struct Items { name: String }
///
/// impl BaseController for Items {
///     fn set_name(&mut self, name: &str) { self.name = name.to_string(); }
///     fn begin_request(&mut self, _ctx: &mut Context) {}
///     fn end_request(&mut self, _ctx: &mut Context) {}
/// }
///
/// impl Controller for Items {
///     fn routes() -> Vec<Route<Self>> {
///         vec![Route::named("get", Items::get), Route::named("post", Items::post)]
///     }
/// }
/// ```
pub trait Controller: BaseController + Send + Sync + Sized + 'static {
    /// The route table: which methods are exposed and how they are reached.
    fn routes() -> Vec<Route<Self>>;

    /// Optional capabilities this controller implements.
    fn capabilities() -> Capabilities<Self> {
        Capabilities::new()
    }

    /// Called on the template before activation; may adjust the bind values.
    fn on_activate(&self, _bind_values: &mut BindValues) -> Result<(), BoxError> {
        Ok(())
    }
}

/// Declares which optional capability traits a controller implements.
///
/// Each declaration only compiles when the controller implements the
/// matching trait.
pub struct Capabilities<T> {
    bind_fields: Option<fn() -> Vec<BindField<T>>>,
    persistent_fields: Option<fn() -> Vec<PersistentField<T>>>,
    model_fields: Option<fn() -> Vec<ModelField<T>>>,
}

impl<T> Capabilities<T> {
    pub fn new() -> Self {
        Self {
            bind_fields: None,
            persistent_fields: None,
            model_fields: None,
        }
    }

    pub fn bindable(mut self) -> Self
    where
        T: Bindable,
    {
        self.bind_fields = Some(T::bind_fields);
        self
    }

    pub fn persistent(mut self) -> Self
    where
        T: Persistent,
    {
        self.persistent_fields = Some(T::persistent_fields);
        self
    }

    pub fn model(mut self) -> Self
    where
        T: Model,
    {
        self.model_fields = Some(T::model_fields);
        self
    }

    pub(crate) fn bind_fields(&self) -> Vec<BindField<T>> {
        self.bind_fields.map(|f| f()).unwrap_or_default()
    }

    pub(crate) fn persistent_fields(&self) -> Vec<PersistentField<T>> {
        self.persistent_fields.map(|f| f()).unwrap_or_default()
    }

    pub(crate) fn model_fields(&self) -> Vec<ModelField<T>> {
        self.model_fields.map(|f| f()).unwrap_or_default()
    }
}

impl<T> Default for Capabilities<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// A controller template: one representative value plus a factory for fresh
/// request instances.
pub struct Template<T> {
    pub(crate) value: T,
    pub(crate) factory: Arc<dyn Fn() -> T + Send + Sync>,
}

impl<T: Controller + Default> Template<T> {
    /// Template whose request instances come from `T::default()`.
    pub fn new(value: T) -> Self {
        Self::with_factory(value, T::default)
    }
}

impl<T: Controller> Template<T> {
    /// Template whose request instances come from `factory`.
    pub fn with_factory(value: T, factory: impl Fn() -> T + Send + Sync + 'static) -> Self {
        Self {
            value,
            factory: Arc::new(factory),
        }
    }

    /// The representative value.
    pub fn value(&self) -> &T {
        &self.value
    }
}

/// Derive `(name, qualified name)` for `T`.
///
/// The qualified name is `<last module segment>.<name>` and is only used in
/// diagnostics.
pub fn type_names<T>() -> Result<(String, String), ActivationError> {
    let type_name = std::any::type_name::<T>();
    let base = type_name.split('<').next().unwrap_or(type_name);
    let mut segments = base.rsplit("::");
    let name = segments.next().unwrap_or_default();

    let valid = name
        .chars()
        .next()
        .is_some_and(|c| c.is_alphabetic() || c == '_')
        && name.chars().all(|c| c.is_alphanumeric() || c == '_');
    if !valid {
        return Err(ActivationError::InvalidName { type_name });
    }

    let full_name = match segments.next() {
        Some(module) if !module.is_empty() => format!("{module}.{name}"),
        _ => name.to_string(),
    };
    Ok((name.to_string(), full_name))
}
