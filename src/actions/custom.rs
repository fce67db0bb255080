use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use crate::actions::errors::ActionError;
use crate::codec::Element;

/// A site-specific transform, referenced from a configuration by name with
/// `{"action": "custom", "name": "..."}`.
///
/// Returning `Ok(None)` removes the element from the output.
pub trait CustomTransform: Send + Sync {
    fn transform(&self, elem: &Element) -> Result<Option<Element>, ActionError>;
}

impl<F> CustomTransform for F
where
    F: Fn(&Element) -> Result<Option<Element>, ActionError> + Send + Sync,
{
    fn transform(&self, elem: &Element) -> Result<Option<Element>, ActionError> {
        self(elem)
    }
}

/// Registry of custom transforms by name.
#[derive(Clone, Default)]
pub struct CustomTransforms(BTreeMap<String, Arc<dyn CustomTransform>>);

impl CustomTransforms {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert<T>(&mut self, name: &str, transform: T)
    where
        T: CustomTransform + 'static,
    {
        self.0.insert(name.into(), Arc::new(transform));
    }

    pub fn get(&self, name: &str) -> Option<&Arc<dyn CustomTransform>> {
        self.0.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.0.contains_key(name)
    }
}

impl fmt::Debug for CustomTransforms {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.0.keys()).finish()
    }
}
