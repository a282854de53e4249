/// Boxed error returned by user hooks.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Failure to activate a controller. Nothing is registered for it.
pub enum ActivationError {
    /// The template's type has no usable declared name (closures, anonymous types).
    InvalidName { type_name: &'static str },
    /// The controller's pre-activation hook returned an error.
    Hook { controller: String, source: BoxError },
}

impl std::fmt::Display for ActivationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ActivationError::InvalidName { type_name } => {
                write!(f, "controller type `{type_name}` has no usable name")
            }
            ActivationError::Hook { controller, source } => {
                write!(f, "MVC {controller}: activation hook failed: {source}")
            }
        }
    }
}

impl std::fmt::Debug for ActivationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        <Self as std::fmt::Display>::fmt(self, f)
    }
}

impl std::error::Error for ActivationError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ActivationError::Hook { source, .. } => Some(source.as_ref()),
            ActivationError::InvalidName { .. } => None,
        }
    }
}

/// Methods of a controller that could not be mapped to a route.
///
/// Never fatal: the methods that did resolve are registered anyway.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolveError {
    pub unresolved: Vec<(String, String)>,
}

impl ResolveError {
    /// Names of the methods that failed to resolve, in declaration order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.unresolved.iter().map(|(name, _)| name.as_str())
    }
}

impl std::fmt::Display for ResolveError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} method(s) could not be resolved", self.unresolved.len())?;
        for (name, reason) in &self.unresolved {
            write!(f, "\n  - '{name}': {reason}")?;
        }
        Ok(())
    }
}

impl std::error::Error for ResolveError {}
