use std::sync::{Arc, Mutex};

use mvc_core::prelude::*;
use mvc_core::{Diagnostic, Handler, RecordingSink, Registration};

type Registered = Vec<(String, Verb, Vec<Handler>)>;

fn register<T: Controller>(
    template: Template<T>,
    values: BindValues,
) -> (Result<Registration, ActivationError>, Registered, RecordingSink) {
    let sink = RecordingSink::new();
    let mut routes = Vec::new();
    let result = Registrar::new(&sink).register(
        template,
        values,
        &mut |path: &str, verb: Verb, chain: Vec<Handler>| {
            routes.push((path.to_string(), verb, chain))
        },
    );
    (result, routes, sink)
}

fn run(chain: &[Handler], ctx: &mut Context) {
    for handler in chain {
        if ctx.is_stopped() {
            break;
        }
        handler(ctx);
    }
}

// ── Items: the plain two-verb controller ────────────────────────────────

#[derive(Default)]
struct Items {
    name: String,
}

impl Items {
    fn get(&mut self, ctx: &mut Context) {
        ctx.write(format!("list from {}", self.name));
    }

    fn post(&mut self, ctx: &mut Context) {
        ctx.set_status(StatusCode::CREATED);
        ctx.write("created");
    }
}

impl BaseController for Items {
    fn set_name(&mut self, name: &str) {
        self.name = name.to_string();
    }
    fn begin_request(&mut self, _ctx: &mut Context) {}
    fn end_request(&mut self, _ctx: &mut Context) {}
}

impl Controller for Items {
    fn routes() -> Vec<Route<Self>> {
        vec![Route::named("get", Items::get), Route::named("post", Items::post)]
    }
}

#[test]
fn items_registers_get_and_post() {
    let (result, routes, sink) = register(Template::new(Items::default()), BindValues::new());
    let registration = result.unwrap();

    assert_eq!(registration.controller, "registrar.Items");
    assert_eq!(
        registration.routes,
        [(Verb::Get, "/".to_string()), (Verb::Post, "/".to_string())]
    );
    assert!(registration.skipped.is_empty());

    let summary: Vec<_> = routes.iter().map(|(p, v, c)| (p.as_str(), *v, c.len())).collect();
    assert_eq!(summary, [("/", Verb::Get, 1), ("/", Verb::Post, 1)]);

    let mut ctx = Context::new(Method::POST, "/items");
    run(&routes[1].2, &mut ctx);
    assert_eq!(ctx.status(), StatusCode::CREATED);

    let mut ctx = Context::new(Method::GET, "/items");
    run(&routes[0].2, &mut ctx);
    assert_eq!(ctx.response_body(), b"list from Items");

    let logged: Vec<String> = sink
        .events()
        .iter()
        .filter(|d| matches!(d, Diagnostic::RouteRegistered { .. }))
        .map(ToString::to_string)
        .collect();
    assert_eq!(
        logged,
        [
            "MVC registrar.Items: GET / maps to function[0] 'get'",
            "MVC registrar.Items: POST / maps to function[1] 'post'",
        ]
    );
}

#[test]
fn route_logging_can_be_disabled() {
    let sink = RecordingSink::new();
    let registration = Registrar::new(&sink)
        .log_routes(false)
        .register(
            Template::new(Items::default()),
            BindValues::new(),
            &mut |_: &str, _: Verb, _: Vec<Handler>| {},
        )
        .unwrap();
    assert_eq!(registration.routes.len(), 2);
    assert!(sink.events().is_empty());
}

// ── Partially broken controllers ────────────────────────────────────────

#[derive(Default)]
struct Broken;

impl Broken {
    fn ok(&mut self, ctx: &mut Context) {
        ctx.write("ok");
    }
}

impl BaseController for Broken {
    fn set_name(&mut self, _name: &str) {}
    fn begin_request(&mut self, _ctx: &mut Context) {}
    fn end_request(&mut self, _ctx: &mut Context) {}
}

impl Controller for Broken {
    fn routes() -> Vec<Route<Self>> {
        vec![
            Route::named("get_status", Broken::ok),
            // not a verb: unresolvable
            Route::named("helper", Broken::ok),
            // resolves, but the path is malformed: handler build fails
            Route::new(Verb::Get, "users/:id", "get_user", Broken::ok),
            // duplicates get_status
            Route::new(Verb::Any, "/status", "any_status", Broken::ok),
            Route::named("delete_by", Broken::ok),
        ]
    }
}

#[test]
fn bad_methods_do_not_disable_the_rest() {
    let (result, routes, sink) = register(Template::new(Broken), BindValues::new());
    let registration = result.unwrap();

    assert_eq!(
        registration.routes,
        [
            (Verb::Get, "/status".to_string()),
            (Verb::Delete, "/{param}".to_string()),
        ]
    );
    assert_eq!(registration.skipped, ["get_user"]);
    // routes = resolved (3) - build failures (1)
    assert_eq!(routes.len(), 2);

    let events = sink.events();
    let resolution_error = events
        .iter()
        .find_map(|d| match d {
            Diagnostic::ResolutionFailed { error, .. } => Some(error.clone()),
            _ => None,
        })
        .unwrap();
    assert!(resolution_error.contains("'helper'"));
    assert!(resolution_error.contains("'any_status'"));
    assert!(events.contains(&Diagnostic::HandlerSkipped {
        controller: "registrar.Broken".into(),
        method: "get_user".into(),
    }));
}

#[test]
fn handler_of_rejects_descriptors_from_another_table() {
    let descriptor =
        Arc::new(mvc_core::Descriptor::build(Template::new(Broken), &BindValues::new()).unwrap());
    let foreign = mvc_core::MethodDescriptor {
        name: "get_status".into(),
        verb: Verb::Get,
        path: "/status".into(),
        index: 42,
    };
    assert!(descriptor.handler_of(&foreign).is_none());

    let renamed = mvc_core::MethodDescriptor {
        index: 0,
        name: "something_else".into(),
        ..foreign
    };
    assert!(descriptor.handler_of(&renamed).is_none());
}

// ── Activation failures ────────────────────────────────────────────────

#[derive(Default)]
struct Refusing;

impl BaseController for Refusing {
    fn set_name(&mut self, _name: &str) {}
    fn begin_request(&mut self, _ctx: &mut Context) {}
    fn end_request(&mut self, _ctx: &mut Context) {}
}

impl Controller for Refusing {
    fn routes() -> Vec<Route<Self>> {
        vec![Route::named("get", |_: &mut Refusing, _: &mut Context| {})]
    }

    fn on_activate(&self, _bind_values: &mut BindValues) -> Result<(), BoxError> {
        Err("database handle missing".into())
    }
}

#[test]
fn failing_activation_hook_registers_nothing() {
    let (result, routes, sink) = register(Template::new(Refusing), BindValues::new());
    let err = result.unwrap_err();

    assert!(matches!(err, ActivationError::Hook { .. }));
    assert_eq!(
        err.to_string(),
        "MVC registrar.Refusing: activation hook failed: database handle missing"
    );
    assert!(routes.is_empty());
    assert!(matches!(
        sink.events().as_slice(),
        [Diagnostic::ActivationFailed { .. }]
    ));
}

// ── Binder and activation hook ─────────────────────────────────────────

#[derive(Clone)]
struct Greeting(String);

#[derive(Default)]
struct Greeter {
    greeting: Option<Greeting>,
    audience: Option<Arc<Mutex<Vec<String>>>>,
}

impl Greeter {
    fn get(&mut self, ctx: &mut Context) {
        let greeting = self.greeting.as_ref().map(|g| g.0.as_str()).unwrap_or("none");
        if let Some(audience) = &self.audience {
            audience.lock().unwrap().push(greeting.to_string());
        }
        ctx.write(greeting);
    }
}

impl BaseController for Greeter {
    fn set_name(&mut self, _name: &str) {}
    fn begin_request(&mut self, _ctx: &mut Context) {}
    fn end_request(&mut self, _ctx: &mut Context) {}
}

impl Bindable for Greeter {
    fn bind_fields() -> Vec<BindField<Self>> {
        vec![
            BindField::new("greeting", |c: &mut Greeter, v: Greeting| c.greeting = Some(v)),
            BindField::new("audience", |c: &mut Greeter, v: Arc<Mutex<Vec<String>>>| {
                c.audience = Some(v)
            }),
        ]
    }
}

impl Controller for Greeter {
    fn routes() -> Vec<Route<Self>> {
        vec![Route::named("get", Greeter::get)]
    }

    fn capabilities() -> Capabilities<Self> {
        Capabilities::new().bindable()
    }

    fn on_activate(&self, bind_values: &mut BindValues) -> Result<(), BoxError> {
        if bind_values.get::<Greeting>().is_none() {
            bind_values.push(Greeting("hello from on_activate".into()));
        }
        Ok(())
    }
}

#[test]
fn bound_values_and_middleware_reach_every_request() {
    let audience = Arc::new(Mutex::new(Vec::<String>::new()));
    let values = BindValues::new()
        .with(Greeting("hi".into()))
        .with(audience.clone())
        .with_middleware(|ctx: &mut Context| {
            if ctx.header("authorization").is_none() {
                ctx.set_status(StatusCode::UNAUTHORIZED);
                ctx.write("no credentials");
                ctx.stop_execution();
            }
        });
    let (result, routes, sink) = register(Template::new(Greeter::default()), values);
    result.unwrap();

    let chain = &routes[0].2;
    assert_eq!(chain.len(), 2);

    let mut anonymous = Context::new(Method::GET, "/");
    run(chain, &mut anonymous);
    assert_eq!(anonymous.status(), StatusCode::UNAUTHORIZED);
    assert!(audience.lock().unwrap().is_empty());

    let mut headers = http::HeaderMap::new();
    headers.insert("authorization", "Bearer t".parse().unwrap());
    let mut authorized =
        Context::from_parts(Method::GET, "/".parse().unwrap(), headers, Default::default());
    run(chain, &mut authorized);
    assert_eq!(authorized.response_body(), b"hi");
    assert_eq!(*audience.lock().unwrap(), ["hi"]);

    let bound: Vec<String> = sink
        .events()
        .into_iter()
        .filter_map(|d| match d {
            Diagnostic::BinderLoaded { field, .. } => Some(field),
            _ => None,
        })
        .collect();
    assert_eq!(bound, ["greeting", "audience"]);
}

#[test]
fn activation_hook_can_supply_missing_bind_values() {
    let (result, routes, _) = register(Template::new(Greeter::default()), BindValues::new());
    result.unwrap();

    let mut ctx = Context::new(Method::GET, "/");
    run(&routes[0].2, &mut ctx);
    assert_eq!(ctx.response_body(), b"hello from on_activate");
}

#[test]
fn unmatched_bind_values_leave_no_binder() {
    let descriptor = mvc_core::Descriptor::build(
        Template::new(Items::default()),
        &BindValues::new().with(Greeting("unused".into())),
    )
    .unwrap();
    assert!(descriptor.binder().is_none());
    assert!(descriptor.persistence().is_none());
    assert!(descriptor.model().is_none());
    assert_eq!(descriptor.name(), "Items");
    assert_eq!(descriptor.full_name(), "registrar.Items");
}
