//! Fields carried from the template value onto every request instance.

use std::sync::Arc;

type Snapshot<T> = Arc<dyn Fn(&T) -> Restore<T> + Send + Sync>;
type Restore<T> = Box<dyn Fn(&mut T) + Send + Sync>;

/// Controllers with fields whose template values seed every request instance.
///
/// Declare it with [`Capabilities::persistent`](crate::Capabilities::persistent).
pub trait Persistent: Sized {
    fn persistent_fields() -> Vec<PersistentField<Self>>;
}

/// One persistent field: how to read it from the template and write it back.
pub struct PersistentField<T> {
    name: &'static str,
    snapshot: Snapshot<T>,
}

impl<T: 'static> PersistentField<T> {
    pub fn new<V: Clone + Send + Sync + 'static>(
        name: &'static str,
        get: fn(&T) -> &V,
        set: fn(&mut T, V),
    ) -> Self {
        Self {
            name,
            snapshot: Arc::new(move |template: &T| {
                let value = get(template).clone();
                Box::new(move |instance: &mut T| set(instance, value.clone())) as Restore<T>
            }),
        }
    }
}

impl<T> PersistentField<T> {
    pub fn name(&self) -> &'static str {
        self.name
    }
}

/// Values snapshotted from the template once, restored onto each instance.
pub struct PersistenceController<T> {
    fields: Vec<(&'static str, Restore<T>)>,
}

impl<T> PersistenceController<T> {
    /// Snapshot `fields` from `template`. `None` when there is nothing to persist.
    pub fn load(fields: Vec<PersistentField<T>>, template: &T) -> Option<Self> {
        if fields.is_empty() {
            return None;
        }
        let fields = fields
            .into_iter()
            .map(|field| (field.name, (field.snapshot)(template)))
            .collect();
        Some(Self { fields })
    }

    /// Write the snapshotted values onto `instance`.
    pub fn handle(&self, instance: &mut T) {
        for (_, restore) in &self.fields {
            restore(instance);
        }
    }

    pub fn field_names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.fields.iter().map(|(name, _)| *name)
    }
}
