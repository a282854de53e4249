//! Injection of externally supplied values into fresh controller instances.

use std::any::{Any, TypeId};
use std::sync::Arc;

use crate::context::{Context, Handler};

type AnyValue = Arc<dyn Any + Send + Sync>;
type Assign<T> = Arc<dyn Fn(&mut T, &(dyn Any + Send + Sync)) + Send + Sync>;

/// Values handed to a controller at registration time.
///
/// Plain values are matched by type against the controller's bind fields;
/// middleware values run before the controller handler on every route.
#[derive(Clone, Default)]
pub struct BindValues {
    values: Vec<AnyValue>,
    middleware: Vec<Handler>,
}

impl BindValues {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a value, builder style.
    pub fn with<V: Any + Send + Sync>(mut self, value: V) -> Self {
        self.push(value);
        self
    }

    /// Add a middleware, builder style.
    pub fn with_middleware<F>(mut self, middleware: F) -> Self
    where
        F: Fn(&mut Context) + Send + Sync + 'static,
    {
        self.push_middleware(Arc::new(middleware));
        self
    }

    pub fn push<V: Any + Send + Sync>(&mut self, value: V) {
        self.values.push(Arc::new(value));
    }

    pub fn push_middleware(&mut self, middleware: Handler) {
        self.middleware.push(middleware);
    }

    /// First value of type `V`, if any.
    pub fn get<V: Any + Send + Sync>(&self) -> Option<&V> {
        self.values.iter().find_map(|v| v.downcast_ref::<V>())
    }

    /// Remove every value of type `V`. Returns how many were removed.
    pub fn remove<V: Any + Send + Sync>(&mut self) -> usize {
        let before = self.values.len();
        self.values.retain(|v| !v.is::<V>());
        before - self.values.len()
    }

    /// Number of plain values, middleware excluded.
    pub fn value_count(&self) -> usize {
        self.values.len()
    }

    /// No values and no middleware.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty() && self.middleware.is_empty()
    }

    pub fn middleware(&self) -> &[Handler] {
        &self.middleware
    }

    fn find(&self, type_id: TypeId) -> Option<&AnyValue> {
        self.values.iter().find(|v| v.as_ref().type_id() == type_id)
    }
}

impl std::fmt::Debug for BindValues {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BindValues")
            .field("values", &self.values.len())
            .field("middleware", &self.middleware.len())
            .finish()
    }
}

/// Controllers whose fields are filled from [`BindValues`].
///
/// Declare it with [`Capabilities::bindable`](crate::Capabilities::bindable).
pub trait Bindable: Sized {
    fn bind_fields() -> Vec<BindField<Self>>;
}

/// One injectable field of a controller.
pub struct BindField<T> {
    name: &'static str,
    type_id: TypeId,
    type_name: &'static str,
    assign: Assign<T>,
}

impl<T: 'static> BindField<T> {
    /// Declare a field of type `V`. `assign` receives a clone of the bound
    /// value for every new instance.
    pub fn new<V>(name: &'static str, assign: fn(&mut T, V)) -> Self
    where
        V: Clone + Send + Sync + 'static,
    {
        Self {
            name,
            type_id: TypeId::of::<V>(),
            type_name: std::any::type_name::<V>(),
            assign: Arc::new(move |target: &mut T, value: &(dyn Any + Send + Sync)| {
                if let Some(value) = value.downcast_ref::<V>() {
                    assign(target, value.clone());
                }
            }),
        }
    }
}

impl<T> BindField<T> {
    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn type_name(&self) -> &'static str {
        self.type_name
    }
}

impl<T> Clone for BindField<T> {
    fn clone(&self) -> Self {
        Self {
            name: self.name,
            type_id: self.type_id,
            type_name: self.type_name,
            assign: self.assign.clone(),
        }
    }
}

/// Resolved bindings for one controller type.
pub struct Binder<T> {
    fields: Vec<(BindField<T>, AnyValue)>,
    middleware: Vec<Handler>,
}

impl<T> Binder<T> {
    /// Match `fields` against `values`. Each field takes the first value of its
    /// exact type; fields without a value stay untouched on new instances.
    ///
    /// Returns `None` when nothing was bound and no middleware was supplied.
    pub fn build(fields: Vec<BindField<T>>, values: &BindValues) -> Option<Self> {
        let fields: Vec<_> = fields
            .into_iter()
            .filter_map(|field| {
                let value = values.find(field.type_id)?.clone();
                Some((field, value))
            })
            .collect();
        let middleware = values.middleware.clone();

        if fields.is_empty() && middleware.is_empty() {
            return None;
        }
        Some(Self { fields, middleware })
    }

    /// Set every bound field on `instance`.
    pub fn handle(&self, instance: &mut T) {
        for (field, value) in &self.fields {
            (field.assign)(instance, value.as_ref());
        }
    }

    /// Bound fields as `(field name, value type name)`.
    pub fn bound_fields(&self) -> impl Iterator<Item = (&'static str, &'static str)> + '_ {
        self.fields.iter().map(|(f, _)| (f.name, f.type_name))
    }

    /// Middleware to run before the controller handler.
    pub fn middleware(&self) -> &[Handler] {
        &self.middleware
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn middleware_alone_is_not_empty() {
        let values = BindValues::new().with_middleware(|_: &mut Context| {});
        assert_eq!(values.value_count(), 0);
        assert_eq!(values.middleware().len(), 1);
        assert!(!values.is_empty());
        assert!(BindValues::new().is_empty());
    }

    #[test]
    fn values_are_found_and_removed_by_type() {
        let mut values = BindValues::new().with(1u8).with("a").with(2u8);
        assert_eq!(values.value_count(), 3);
        assert_eq!(values.get::<u8>(), Some(&1));
        assert_eq!(values.remove::<u8>(), 2);
        assert_eq!(values.value_count(), 1);
        assert_eq!(values.get::<&str>(), Some(&"a"));
    }
}
