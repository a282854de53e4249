use std::sync::Arc;

use axum::extract::rejection::RawPathParamsRejection;
use axum::extract::{RawPathParams, Request};
use axum::routing::{any, on, MethodFilter, MethodRouter};
use axum::Router;
use mvc_core::config::{ConfigError, MvcConfig, MvcSettings};
use mvc_core::controller::type_names;
use mvc_core::{
    routes_conflict, ActivationError, BindValues, Controller, Diagnostic, DiagnosticsSink, Handler,
    Registrar, Registration, Template, TracingSink, Verb,
};

use crate::dispatch::Chain;
use crate::layers::{catch_panic_layer, default_trace};

/// Builder that activates controllers and mounts them on an `axum::Router`.
///
/// ```ignore
/// MvcApp::new()
///     .controller("/items", Template::new(Items::default()), BindValues::new())?
///     .serve("0.0.0.0:3000")
///     .await?;
/// ```
pub struct MvcApp {
    router: Router,
    settings: MvcSettings,
    sink: Arc<dyn DiagnosticsSink>,
    mounted: Vec<(Verb, String)>,
    registrations: Vec<Registration>,
}

impl Default for MvcApp {
    fn default() -> Self {
        Self::new()
    }
}

impl MvcApp {
    /// An empty app with default settings, reporting through `tracing`.
    pub fn new() -> Self {
        Self {
            router: Router::new(),
            settings: MvcSettings::default(),
            sink: Arc::new(TracingSink),
            mounted: Vec::new(),
            registrations: Vec::new(),
        }
    }

    /// An empty app whose settings are read from the `mvc.*` keys of `config`.
    pub fn from_config(config: &MvcConfig) -> Result<Self, ConfigError> {
        Ok(Self::new().with_settings(MvcSettings::from_config(config)?))
    }

    /// Replace the settings. Only affects controllers registered afterwards.
    pub fn with_settings(mut self, settings: MvcSettings) -> Self {
        self.settings = settings;
        self
    }

    /// Send registration diagnostics to `sink` instead of `tracing`.
    pub fn with_diagnostics(mut self, sink: impl DiagnosticsSink + 'static) -> Self {
        self.sink = Arc::new(sink);
        self
    }

    pub fn settings(&self) -> &MvcSettings {
        &self.settings
    }

    /// Activate a controller and mount its routes under `prefix`.
    ///
    /// A configured prefix for the controller replaces `prefix`; a disabled
    /// controller is skipped without being activated. Routes that collide
    /// with an already mounted route are reported to the diagnostics sink and
    /// left out of both the router and the returned registration.
    pub fn controller<T: Controller>(
        self,
        prefix: &str,
        template: Template<T>,
        bind_values: BindValues,
    ) -> Result<Self, ActivationError> {
        // A name that cannot be derived is reported by the registrar below.
        if let Ok((name, full_name)) = type_names::<T>() {
            let overrides = self.settings.controller(&name);
            if !overrides.enabled {
                self.sink.emit(&Diagnostic::ControllerDisabled {
                    controller: full_name,
                });
                return Ok(self);
            }
            if let Some(configured) = overrides.prefix {
                return self.mount_controller(&configured, template, bind_values);
            }
        }
        self.mount_controller(prefix, template, bind_values)
    }

    fn mount_controller<T: Controller>(
        mut self,
        prefix: &str,
        template: Template<T>,
        bind_values: BindValues,
    ) -> Result<Self, ActivationError> {
        let mut routes = Vec::new();
        let mut registration = Registrar::new(self.sink.as_ref())
            .log_routes(self.settings.log_routes)
            .register(
                template,
                bind_values,
                &mut |path: &str, verb: Verb, chain: Vec<Handler>| {
                    routes.push((verb, path.to_string(), chain));
                },
            )?;

        for (verb, relative, chain) in routes {
            let path = join_path(prefix, &relative);
            if let Err(reason) = self.mount(verb, &path, chain) {
                self.sink.emit(&Diagnostic::RouteSkipped {
                    controller: registration.controller.clone(),
                    verb,
                    path,
                    reason,
                });
                registration
                    .routes
                    .retain(|(v, p)| !(*v == verb && *p == relative));
            }
        }
        self.registrations.push(registration);
        Ok(self)
    }

    fn mount(&mut self, verb: Verb, path: &str, chain: Vec<Handler>) -> Result<(), String> {
        if let Some((existing, existing_path)) = self
            .mounted
            .iter()
            .find(|(v, p)| routes_conflict((*v, p.as_str()), (verb, path)))
        {
            return Err(format!("conflicts with mounted route {existing} {existing_path}"));
        }

        let chain = Chain::new(chain, self.settings.body_limit);
        let method_router =
            method_router(verb, chain).ok_or_else(|| format!("{verb} has no method filter"))?;
        self.router = std::mem::take(&mut self.router).route(path, method_router);
        self.mounted.push((verb, path.to_string()));
        Ok(())
    }

    /// Every mounted route as `(verb, absolute path)`, in mount order.
    pub fn routes(&self) -> impl Iterator<Item = (Verb, &str)> {
        self.mounted.iter().map(|(verb, path)| (*verb, path.as_str()))
    }

    /// One entry per activated controller.
    pub fn registrations(&self) -> &[Registration] {
        &self.registrations
    }

    /// Finish the app into a router with the configured layers applied.
    pub fn build(self) -> Router {
        let mut router = self.router;
        if self.settings.catch_panic {
            router = router.layer(catch_panic_layer());
        }
        if self.settings.trace {
            router = router.layer(default_trace());
        }
        router
    }

    /// Bind `addr` and serve until the process is stopped.
    pub async fn serve(self, addr: impl tokio::net::ToSocketAddrs) -> std::io::Result<()> {
        let listener = tokio::net::TcpListener::bind(addr).await?;
        tracing::info!(
            addr = %listener.local_addr()?,
            routes = self.mounted.len(),
            "MVC server listening"
        );
        axum::serve(listener, self.build()).await
    }
}

fn method_router(verb: Verb, chain: Chain) -> Option<MethodRouter> {
    let handler = move |params: Result<RawPathParams, RawPathParamsRejection>, request: Request| {
        chain.serve(params, request)
    };
    match verb.to_method() {
        None => Some(any(handler)),
        Some(method) => MethodFilter::try_from(method)
            .ok()
            .map(|filter| on(filter, handler)),
    }
}

/// Join a mount prefix and a controller-relative path.
///
/// A relative path of `/` maps to the prefix itself, so `("/items", "/")`
/// gives `/items` and `("", "/")` gives `/`.
pub fn join_path(prefix: &str, path: &str) -> String {
    let prefix = prefix.trim_end_matches('/');
    let mut joined = String::with_capacity(prefix.len() + path.len() + 1);
    if !prefix.is_empty() && !prefix.starts_with('/') {
        joined.push('/');
    }
    joined.push_str(prefix);
    match path {
        "" | "/" => {
            if joined.is_empty() {
                joined.push('/');
            }
        }
        _ => {
            if !path.starts_with('/') {
                joined.push('/');
            }
            joined.push_str(path);
        }
    }
    joined
}
