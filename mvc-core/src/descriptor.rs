//! Per-controller metadata and the per-route handler factory.

use std::sync::Arc;

use crate::binder::{BindValues, Binder};
use crate::context::{Context, Handler};
use crate::controller::{type_names, BaseController, Controller, Template};
use crate::error::ActivationError;
use crate::model::ModelController;
use crate::persistence::PersistenceController;
use crate::resolver::{resolve, MethodDescriptor, Resolution, Route};

/// Everything needed to serve a controller, built once at activation.
///
/// Read-only once built; handlers share it through an `Arc`.
pub struct Descriptor<T> {
    name: String,
    full_name: String,
    template: T,
    factory: Arc<dyn Fn() -> T + Send + Sync>,
    routes: Vec<Route<T>>,
    binder: Option<Binder<T>>,
    persistence: Option<PersistenceController<T>>,
    model: Option<ModelController<T>>,
}

impl<T: Controller> Descriptor<T> {
    /// Inspect `template` and build its sub-controllers.
    ///
    /// A missing binder, persistence or model controller is not an error; it
    /// only means the corresponding lifecycle stage is skipped.
    pub fn build(template: Template<T>, bind_values: &BindValues) -> Result<Self, ActivationError> {
        let (name, full_name) = type_names::<T>()?;
        let capabilities = T::capabilities();

        let binder = Binder::build(capabilities.bind_fields(), bind_values);
        let persistence =
            PersistenceController::load(capabilities.persistent_fields(), &template.value);
        let model = ModelController::load(capabilities.model_fields());

        Ok(Self {
            name,
            full_name,
            template: template.value,
            factory: template.factory,
            routes: T::routes(),
            binder,
            persistence,
            model,
        })
    }

    /// Resolve the route table into method descriptors.
    pub fn resolve(&self) -> Resolution {
        resolve(&self.routes)
    }

    /// Build the request handler for `method`.
    ///
    /// Returns `None` when `method` does not describe a servable route of
    /// this controller.
    pub fn handler_of(self: &Arc<Self>, method: &MethodDescriptor) -> Option<Handler> {
        let route = self.routes.get(method.index)?;
        if route.name() != method.name || !is_valid_path(&method.path) {
            return None;
        }

        let descriptor = Arc::clone(self);
        let call = route.call();

        Some(Arc::new(move |ctx: &mut Context| {
            let mut instance = (descriptor.factory)();
            if let Some(binder) = &descriptor.binder {
                binder.handle(&mut instance);
            }

            instance.set_name(&descriptor.name);

            if let Some(persistence) = &descriptor.persistence {
                persistence.handle(&mut instance);
            }

            // Stopped by middleware: the request never began, so it must not end either.
            if ctx.is_stopped() {
                return;
            }

            instance.begin_request(ctx);
            if !ctx.is_stopped() {
                call(&mut instance, ctx);
            }

            if let Some(model) = &descriptor.model {
                model.handle(ctx, &instance);
            }

            // Always runs once begun; responsible for the response if nothing was written.
            instance.end_request(ctx);
        }))
    }
}

impl<T> Descriptor<T> {
    /// Declared name of the controller type, assigned to every instance.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// `<module>.<Name>`, for diagnostics only.
    pub fn full_name(&self) -> &str {
        &self.full_name
    }

    /// The representative value the descriptor was built from.
    pub fn template(&self) -> &T {
        &self.template
    }

    pub fn binder(&self) -> Option<&Binder<T>> {
        self.binder.as_ref()
    }

    pub fn persistence(&self) -> Option<&PersistenceController<T>> {
        self.persistence.as_ref()
    }

    pub fn model(&self) -> Option<&ModelController<T>> {
        self.model.as_ref()
    }

    pub fn route_count(&self) -> usize {
        self.routes.len()
    }
}

/// Whether `path` can be handed to a host router as a relative route path.
fn is_valid_path(path: &str) -> bool {
    if !path.starts_with('/') || path.chars().any(char::is_whitespace) {
        return false;
    }
    if path
        .split('/')
        .any(|segment| segment.starts_with(':') || segment.starts_with('*'))
    {
        return false;
    }

    let mut depth = 0usize;
    for c in path.chars() {
        match c {
            '{' if depth == 0 => depth = 1,
            '}' if depth == 1 => depth = 0,
            '{' | '}' => return false,
            _ => {}
        }
    }
    depth == 0
}

#[cfg(test)]
mod tests {
    use super::is_valid_path;

    #[test]
    fn valid_paths() {
        assert!(is_valid_path("/"));
        assert!(is_valid_path("/items"));
        assert!(is_valid_path("/user/{param}"));
    }

    #[test]
    fn malformed_paths() {
        assert!(!is_valid_path(""));
        assert!(!is_valid_path("items"));
        assert!(!is_valid_path("/a b"));
        assert!(!is_valid_path("/users/:id"));
        assert!(!is_valid_path("/files/*rest"));
        assert!(!is_valid_path("/user/{param"));
        assert!(!is_valid_path("/user/{{param}}"));
    }
}
