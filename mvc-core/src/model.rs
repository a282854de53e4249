//! Propagation of controller fields into the response's view data.

use std::sync::Arc;

use serde::Serialize;
use serde_json::Value;

use crate::context::Context;

type Extract<T> = Arc<dyn Fn(&T) -> Result<Value, serde_json::Error> + Send + Sync>;

/// Controllers exposing fields as response model data.
///
/// Declare it with [`Capabilities::model`](crate::Capabilities::model).
pub trait Model: Sized {
    fn model_fields() -> Vec<ModelField<Self>>;
}

/// One model field and the view-data key it is published under.
pub struct ModelField<T> {
    key: String,
    extract: Extract<T>,
}

impl<T: 'static> ModelField<T> {
    /// Publish the field under its own name.
    pub fn new<V: Serialize + 'static>(name: &str, get: fn(&T) -> &V) -> Self {
        Self {
            key: name.to_string(),
            extract: Arc::new(move |instance: &T| serde_json::to_value(get(instance))),
        }
    }

    /// Publish the field under `key` instead of its name.
    pub fn rename(mut self, key: impl Into<String>) -> Self {
        self.key = key.into();
        self
    }
}

impl<T> ModelField<T> {
    pub fn key(&self) -> &str {
        &self.key
    }
}

pub struct ModelController<T> {
    fields: Vec<ModelField<T>>,
}

impl<T> ModelController<T> {
    /// `None` when there are no model fields.
    pub fn load(fields: Vec<ModelField<T>>) -> Option<Self> {
        if fields.is_empty() {
            None
        } else {
            Some(Self { fields })
        }
    }

    /// Copy every model field of `instance` into the view data of `ctx`.
    pub fn handle(&self, ctx: &mut Context, instance: &T) {
        for field in &self.fields {
            match (field.extract)(instance) {
                Ok(value) => ctx.view_data(field.key.clone(), value),
                Err(err) => {
                    tracing::warn!(
                        key = %field.key,
                        error = %err,
                        "model field could not be serialized"
                    );
                }
            }
        }
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> + '_ {
        self.fields.iter().map(|f| f.key.as_str())
    }
}
