use std::sync::Arc;

use crate::binder::BindValues;
use crate::context::Handler;
use crate::controller::{type_names, Controller, Template};
use crate::descriptor::Descriptor;
use crate::diagnostics::{Diagnostic, DiagnosticsSink};
use crate::error::ActivationError;
use crate::resolver::Verb;

/// What was registered for one controller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Registration {
    /// Qualified name of the controller.
    pub controller: String,
    /// Registered routes, relative to the host's prefix, in registration order.
    pub routes: Vec<(Verb, String)>,
    /// Methods that resolved but whose handler could not be built.
    pub skipped: Vec<String>,
}

/// Activates controllers and hands their handler chains to a host router.
///
/// Only activation failures are returned; unresolvable methods and handler
/// build failures are reported to the sink and the remaining routes are
/// still registered.
pub struct Registrar<'a> {
    sink: &'a dyn DiagnosticsSink,
    log_routes: bool,
}

impl<'a> Registrar<'a> {
    pub fn new(sink: &'a dyn DiagnosticsSink) -> Self {
        Self {
            sink,
            log_routes: true,
        }
    }

    /// Whether every registered route is reported to the sink (default `true`).
    pub fn log_routes(mut self, enabled: bool) -> Self {
        self.log_routes = enabled;
        self
    }

    /// Activate `template` and register each of its routes through `register`,
    /// called as `register(relative_path, verb, [middleware..., handler])`.
    pub fn register<T, F>(
        &self,
        template: Template<T>,
        mut bind_values: BindValues,
        register: &mut F,
    ) -> Result<Registration, ActivationError>
    where
        T: Controller,
        F: FnMut(&str, Verb, Vec<Handler>),
    {
        let (_, full_name) = type_names::<T>().inspect_err(|err| {
            self.activation_failed(std::any::type_name::<T>(), err);
        })?;

        if let Err(source) = template.value.on_activate(&mut bind_values) {
            let err = ActivationError::Hook {
                controller: full_name.clone(),
                source,
            };
            self.activation_failed(&full_name, &err);
            return Err(err);
        }

        let descriptor = Descriptor::build(template, &bind_values).inspect_err(|err| {
            self.activation_failed(&full_name, err);
        })?;

        if let Some(binder) = descriptor.binder() {
            for (field, value_type) in binder.bound_fields() {
                self.sink.emit(&Diagnostic::BinderLoaded {
                    controller: full_name.clone(),
                    field: field.to_string(),
                    value_type: value_type.to_string(),
                });
            }
        }

        Ok(register_methods(
            &Arc::new(descriptor),
            self.sink,
            self.log_routes,
            register,
        ))
    }

    fn activation_failed(&self, controller: &str, err: &ActivationError) {
        self.sink.emit(&Diagnostic::ActivationFailed {
            controller: controller.to_string(),
            error: err.to_string(),
        });
    }
}

/// Register the handlers of an already activated controller.
pub fn register_method_handlers<T, F>(
    descriptor: &Arc<Descriptor<T>>,
    sink: &dyn DiagnosticsSink,
    register: &mut F,
) -> Registration
where
    T: Controller,
    F: FnMut(&str, Verb, Vec<Handler>),
{
    register_methods(descriptor, sink, true, register)
}

fn register_methods<T, F>(
    descriptor: &Arc<Descriptor<T>>,
    sink: &dyn DiagnosticsSink,
    log_routes: bool,
    register: &mut F,
) -> Registration
where
    T: Controller,
    F: FnMut(&str, Verb, Vec<Handler>),
{
    let controller = descriptor.full_name().to_string();
    let middleware: &[Handler] = descriptor
        .binder()
        .map(|binder| binder.middleware())
        .unwrap_or_default();

    let resolution = descriptor.resolve();
    if let Some(err) = &resolution.error {
        sink.emit(&Diagnostic::ResolutionFailed {
            controller: controller.clone(),
            error: err.to_string(),
        });
    }

    let mut registration = Registration {
        controller,
        routes: Vec::with_capacity(resolution.methods.len()),
        skipped: Vec::new(),
    };

    for method in &resolution.methods {
        let Some(handler) = descriptor.handler_of(method) else {
            sink.emit(&Diagnostic::HandlerSkipped {
                controller: registration.controller.clone(),
                method: method.name.clone(),
            });
            registration.skipped.push(method.name.clone());
            continue;
        };

        let mut chain = Vec::with_capacity(middleware.len() + 1);
        chain.extend(middleware.iter().cloned());
        chain.push(handler);
        register(&method.path, method.verb, chain);

        if log_routes {
            sink.emit(&Diagnostic::RouteRegistered {
                controller: registration.controller.clone(),
                verb: method.verb,
                path: method.path.clone(),
                index: method.index,
                method: method.name.clone(),
            });
        }
        registration.routes.push((method.verb, method.path.clone()));
    }

    registration
}
