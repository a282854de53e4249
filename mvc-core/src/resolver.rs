//! Route tables and their resolution into method descriptors.

use crate::context::Context;
use crate::error::ResolveError;

/// HTTP verb a controller method answers to. `Any` answers to all of them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Verb {
    Get,
    Post,
    Put,
    Delete,
    Patch,
    Head,
    Options,
    Connect,
    Trace,
    Any,
}

impl Verb {
    pub fn as_str(&self) -> &'static str {
        match self {
            Verb::Get => "GET",
            Verb::Post => "POST",
            Verb::Put => "PUT",
            Verb::Delete => "DELETE",
            Verb::Patch => "PATCH",
            Verb::Head => "HEAD",
            Verb::Options => "OPTIONS",
            Verb::Connect => "CONNECT",
            Verb::Trace => "TRACE",
            Verb::Any => "ANY",
        }
    }

    /// Parse the leading word of a method name (`get`, `post`, ..., `any`).
    pub fn from_word(word: &str) -> Option<Verb> {
        const VERBS: [Verb; 10] = [
            Verb::Get,
            Verb::Post,
            Verb::Put,
            Verb::Delete,
            Verb::Patch,
            Verb::Head,
            Verb::Options,
            Verb::Connect,
            Verb::Trace,
            Verb::Any,
        ];
        VERBS
            .into_iter()
            .find(|v| v.as_str().eq_ignore_ascii_case(word))
    }

    /// The concrete HTTP method, or `None` for [`Verb::Any`].
    pub fn to_method(&self) -> Option<http::Method> {
        let method = match self {
            Verb::Get => http::Method::GET,
            Verb::Post => http::Method::POST,
            Verb::Put => http::Method::PUT,
            Verb::Delete => http::Method::DELETE,
            Verb::Patch => http::Method::PATCH,
            Verb::Head => http::Method::HEAD,
            Verb::Options => http::Method::OPTIONS,
            Verb::Connect => http::Method::CONNECT,
            Verb::Trace => http::Method::TRACE,
            Verb::Any => return None,
        };
        Some(method)
    }

    /// Whether two routes with these verbs on the same path would collide.
    pub fn overlaps(&self, other: &Verb) -> bool {
        self == other || *self == Verb::Any || *other == Verb::Any
    }
}

impl std::fmt::Display for Verb {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One entry of a controller's route table.
///
/// Either carries an explicit verb and relative path, or only a method name
/// from which both are derived (see [`resolve`]).
pub struct Route<T> {
    name: &'static str,
    target: Option<(Verb, String)>,
    call: fn(&mut T, &mut Context),
}

impl<T> Route<T> {
    /// A route with an explicit verb and relative path.
    pub fn new(
        verb: Verb,
        path: impl Into<String>,
        name: &'static str,
        call: fn(&mut T, &mut Context),
    ) -> Self {
        Self {
            name,
            target: Some((verb, path.into())),
            call,
        }
    }

    /// A route whose verb and path come from its snake_case method name,
    /// e.g. `get_user_by` answers `GET /user/{param}`.
    pub fn named(name: &'static str, call: fn(&mut T, &mut Context)) -> Self {
        Self {
            name,
            target: None,
            call,
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub(crate) fn call(&self) -> fn(&mut T, &mut Context) {
        self.call
    }
}

/// A resolved controller method: `(name, verb, path, index)` where `index`
/// points into the route table it was resolved from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MethodDescriptor {
    pub name: String,
    pub verb: Verb,
    pub path: String,
    pub index: usize,
}

/// Outcome of resolving a route table.
#[derive(Debug)]
pub struct Resolution {
    /// Methods that resolved, in declaration order.
    pub methods: Vec<MethodDescriptor>,
    /// Methods that did not, if any.
    pub error: Option<ResolveError>,
}

/// Resolve every entry of `routes` into a [`MethodDescriptor`].
///
/// Unresolvable names and duplicate `(verb, path)` pairs are collected into
/// the returned error; the remaining methods are still returned.
pub fn resolve<T>(routes: &[Route<T>]) -> Resolution {
    let mut methods: Vec<MethodDescriptor> = Vec::with_capacity(routes.len());
    let mut unresolved = Vec::new();

    for (index, route) in routes.iter().enumerate() {
        let target = match &route.target {
            Some((verb, path)) => Ok((*verb, path.clone())),
            None => resolve_name(route.name),
        };
        let (verb, path) = match target {
            Ok(target) => target,
            Err(reason) => {
                unresolved.push((route.name.to_string(), reason));
                continue;
            }
        };

        if let Some(existing) = methods
            .iter()
            .find(|m| routes_conflict((m.verb, &m.path), (verb, &path)))
        {
            unresolved.push((
                route.name.to_string(),
                format!(
                    "{verb} {path} conflicts with {} {} of '{}'",
                    existing.verb, existing.path, existing.name
                ),
            ));
            continue;
        }

        methods.push(MethodDescriptor {
            name: route.name.to_string(),
            verb,
            path,
            index,
        });
    }

    let error = if unresolved.is_empty() {
        None
    } else {
        Some(ResolveError { unresolved })
    };
    Resolution { methods, error }
}

/// Whether two routes cannot both be mounted on one router.
///
/// Identical paths conflict when their verbs overlap. Paths that put
/// parameters with different names at the same position after a shared
/// prefix, such as `/users/{param}` and `/users/{id}/posts`, conflict
/// whatever the verbs, since the router keys parameters by position.
pub fn routes_conflict(a: (Verb, &str), b: (Verb, &str)) -> bool {
    let mut left = a.1.split('/');
    let mut right = b.1.split('/');
    loop {
        match (left.next(), right.next()) {
            (None, None) => return a.0.overlaps(&b.0),
            (Some(x), Some(y)) => match (param_name(x), param_name(y)) {
                (Some(p), Some(q)) if p != q => return true,
                (Some(_), Some(_)) => {}
                (None, None) if x == y => {}
                _ => return false,
            },
            _ => return false,
        }
    }
}

/// `id` for `{id}`, `*rest` for `{*rest}`, `None` for a static segment.
fn param_name(segment: &str) -> Option<&str> {
    segment.strip_prefix('{')?.strip_suffix('}')
}

/// Derive `(verb, relative path)` from a snake_case method name.
fn resolve_name(name: &str) -> Result<(Verb, String), String> {
    let mut words = name.split('_');
    let first = words.next().unwrap_or_default();
    let verb = Verb::from_word(first)
        .ok_or_else(|| format!("name does not start with an HTTP verb (found `{first}`)"))?;

    let mut path = String::new();
    let mut params = 0;
    for word in words {
        if word.is_empty() {
            return Err("name contains an empty word".into());
        }
        path.push('/');
        if word == "by" {
            params += 1;
            if params == 1 {
                path.push_str("{param}");
            } else {
                path.push_str(&format!("{{param{params}}}"));
            }
        } else {
            path.push_str(&word.to_ascii_lowercase());
        }
    }
    if path.is_empty() {
        path.push('/');
    }
    Ok((verb, path))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn noop(_: &mut (), _: &mut Context) {}

    #[test]
    fn bare_verb_maps_to_root() {
        assert_eq!(resolve_name("get").unwrap(), (Verb::Get, "/".into()));
        assert_eq!(resolve_name("any").unwrap(), (Verb::Any, "/".into()));
    }

    #[test]
    fn words_become_segments() {
        assert_eq!(
            resolve_name("get_user_profile").unwrap(),
            (Verb::Get, "/user/profile".into())
        );
        assert_eq!(resolve_name("post_login").unwrap(), (Verb::Post, "/login".into()));
    }

    #[test]
    fn by_becomes_param() {
        assert_eq!(
            resolve_name("get_user_by").unwrap(),
            (Verb::Get, "/user/{param}".into())
        );
        assert_eq!(
            resolve_name("get_by_items_by").unwrap(),
            (Verb::Get, "/{param}/items/{param2}".into())
        );
    }

    #[test]
    fn rejects_non_verb_names() {
        assert!(resolve_name("helper").is_err());
        assert!(resolve_name("getter").is_err());
        assert!(resolve_name("get__double").is_err());
    }

    #[test]
    fn duplicates_are_unresolved_but_others_kept() {
        let routes: Vec<Route<()>> = vec![
            Route::named("get", noop),
            Route::new(Verb::Get, "/", "index", noop),
            Route::named("post", noop),
            Route::named("any_status", noop),
            Route::named("get_status", noop),
        ];
        let resolution = resolve(&routes);
        let names: Vec<_> = resolution.methods.iter().map(|m| m.name.as_str()).collect();
        assert_eq!(names, ["get", "post", "any_status"]);
        assert_eq!(resolution.methods[2].index, 3);

        let error = resolution.error.unwrap();
        assert_eq!(error.names().collect::<Vec<_>>(), ["index", "get_status"]);
    }

    #[test]
    fn parameter_names_must_agree_at_the_same_position() {
        assert!(routes_conflict((Verb::Get, "/{param}"), (Verb::Put, "/{id}")));
        assert!(routes_conflict(
            (Verb::Get, "/users/{param}"),
            (Verb::Post, "/users/{id}/posts")
        ));
        assert!(routes_conflict((Verb::Get, "/{param}"), (Verb::Get, "/{*rest}")));
        assert!(!routes_conflict((Verb::Get, "/{param}"), (Verb::Put, "/{param}")));
        assert!(!routes_conflict((Verb::Get, "/{param}"), (Verb::Get, "/status")));
        assert!(!routes_conflict((Verb::Get, "/a/{x}"), (Verb::Get, "/b/{y}")));
        assert!(routes_conflict((Verb::Any, "/status"), (Verb::Head, "/status")));
    }

    #[test]
    fn renamed_parameters_are_unresolved() {
        let routes: Vec<Route<()>> = vec![
            Route::named("get_by", noop),
            Route::new(Verb::Put, "/{id}", "update", noop),
            Route::named("delete_by", noop),
        ];
        let resolution = resolve(&routes);
        let names: Vec<_> = resolution.methods.iter().map(|m| m.name.as_str()).collect();
        assert_eq!(names, ["get_by", "delete_by"]);

        let error = resolution.error.unwrap();
        assert_eq!(error.names().collect::<Vec<_>>(), ["update"]);
        assert!(error.to_string().contains("conflicts with GET /{param} of 'get_by'"));
    }

    #[test]
    fn verb_to_method() {
        assert_eq!(Verb::Patch.to_method(), Some(http::Method::PATCH));
        assert_eq!(Verb::Any.to_method(), None);
        assert_eq!(Verb::from_word("DELETE"), Some(Verb::Delete));
    }
}
