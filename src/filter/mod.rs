//! The filter registry and application of filter chains.

pub mod builtin;

use std::{
    collections::BTreeMap,
    fmt,
    sync::{Arc, LazyLock},
};

use piper_filter_types::{Filter, FilterDyn, FnFilter, RegistryError, Result, Value};

use crate::frontend::FilterChain;

type BoxedFilter = Box<dyn FilterDyn + Send + Sync>;

/// A name-to-implementation table of filters.
///
/// Populate it first, then hand a shared reference to a
/// [`Piper`](crate::interpreter::Piper); the borrow keeps it frozen for as
/// long as evaluation can observe it.
#[derive(Default)]
pub struct FilterRegistry {
    filters: BTreeMap<Arc<str>, BoxedFilter>,
}

static BUILTINS: LazyLock<FilterRegistry> = LazyLock::new(FilterRegistry::with_builtins);

impl FilterRegistry {
    /// An empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A fresh registry holding the built-in filters, ready to be extended.
    #[must_use]
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        builtin::install(&mut registry);
        registry
    }

    /// The shared registry of built-in filters.
    #[must_use]
    pub fn builtins() -> &'static Self {
        &BUILTINS
    }

    /// Binds `name` to `filter`.
    ///
    /// # Errors
    ///
    /// [`RegistryError::DuplicateFilter`] if `name` is already bound.
    pub fn register<F>(&mut self, name: &str, filter: F) -> Result<()>
    where
        F: Filter + Send + Sync + 'static,
    {
        self.register_dyn(name, Box::new(filter))
    }

    /// Rebinds the already bound `name` to `filter`.
    ///
    /// # Errors
    ///
    /// [`RegistryError::UnknownFilter`] if `name` is not bound.
    pub fn replace<F>(&mut self, name: &str, filter: F) -> Result<()>
    where
        F: Filter + Send + Sync + 'static,
    {
        self.replace_dyn(name, Box::new(filter))
    }

    /// [`register`](Self::register) for a closure over the running value and
    /// the raw argument text.
    ///
    /// # Errors
    ///
    /// [`RegistryError::DuplicateFilter`] if `name` is already bound.
    pub fn register_fn<F>(&mut self, name: &str, f: F) -> Result<()>
    where
        F: Fn(Value, Option<&str>) -> Result<Value> + Send + Sync + 'static,
    {
        self.register_dyn(name, Box::new(FnFilter(f)))
    }

    /// [`replace`](Self::replace) for a closure over the running value and the
    /// raw argument text.
    ///
    /// # Errors
    ///
    /// [`RegistryError::UnknownFilter`] if `name` is not bound.
    pub fn replace_fn<F>(&mut self, name: &str, f: F) -> Result<()>
    where
        F: Fn(Value, Option<&str>) -> Result<Value> + Send + Sync + 'static,
    {
        self.replace_dyn(name, Box::new(FnFilter(f)))
    }

    /// # Errors
    ///
    /// [`RegistryError::DuplicateFilter`] if `name` is already bound.
    pub fn register_dyn(&mut self, name: &str, filter: BoxedFilter) -> Result<()> {
        if self.filters.contains_key(name) {
            return Err(RegistryError::DuplicateFilter(name.to_owned()).into());
        }
        self.filters.insert(Arc::from(name), filter);
        Ok(())
    }

    /// # Errors
    ///
    /// [`RegistryError::UnknownFilter`] if `name` is not bound.
    pub fn replace_dyn(&mut self, name: &str, filter: BoxedFilter) -> Result<()> {
        match self.filters.get_mut(name) {
            Some(slot) => {
                *slot = filter;
                Ok(())
            }
            None => Err(RegistryError::UnknownFilter(name.to_owned()).into()),
        }
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&(dyn FilterDyn + Send + Sync)> {
        self.filters.get(name).map(|f| &**f)
    }

    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.filters.contains_key(name)
    }

    /// Names of every bound filter, in sorted order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.filters.keys().map(|k| &**k)
    }

    /// Calls the filter bound to `name` once.
    ///
    /// # Errors
    ///
    /// If `name` is not bound, or the filter itself fails.
    pub fn apply(&self, name: &str, value: Value, args: Option<&str>) -> Result<Value> {
        match self.get(name) {
            Some(filter) => filter.apply(value, args),
            None => Err(RegistryError::UnknownFilter(name.to_owned()).into()),
        }
    }

    /// Runs `value` through every step of `chain`, left to right.
    ///
    /// A step naming an unbound filter, or whose filter fails, leaves the
    /// running value as it was.  An absent value is returned untouched.
    #[must_use]
    pub fn apply_chain(&self, chain: &FilterChain, value: Value) -> Value {
        if value.is_null() || chain.is_empty() {
            return value;
        }

        chain.steps().iter().fold(value, |value, step| {
            match self.apply(&step.name, value.clone(), step.args.as_deref()) {
                Ok(next) => next,
                Err(e) => {
                    tracing::debug!(filter = %step.name, "skipping filter step: {e}");
                    value
                }
            }
        })
    }
}

impl fmt::Debug for FilterRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.names()).finish()
    }
}

#[cfg(test)]
mod tests {
    use piper_filter_types::{bail, ErrorKind, Value};

    use super::FilterRegistry;
    use crate::frontend::FilterChain;

    #[test]
    fn register_rejects_duplicates() {
        let mut registry = FilterRegistry::with_builtins();
        let err = registry
            .register_fn("trimspace", |value, _| Ok(value))
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Registry);

        registry
            .register_fn("shout", |value, _| {
                Ok(value.try_unwrap::<std::sync::Arc<str>>()?.to_uppercase().into())
            })
            .unwrap();
        assert!(registry.contains("shout"));
        assert_eq!(
            registry.apply("shout", "hey".into(), None).unwrap(),
            Value::from("HEY")
        );
    }

    #[test]
    fn replace_requires_existing_name() {
        let mut registry = FilterRegistry::new();
        let err = registry.replace_fn("nope", |value, _| Ok(value)).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Registry);

        registry.register_fn("x", |_, _| Ok(Value::Int(1))).unwrap();
        registry.replace_fn("x", |_, _| Ok(Value::Int(2))).unwrap();
        assert_eq!(registry.apply("x", Value::Null, None).unwrap(), Value::Int(2));
    }

    #[test]
    fn missing_and_failing_steps_are_skipped() {
        let mut registry = FilterRegistry::with_builtins();
        registry
            .register_fn("explode", |_, _| bail!("always fails"))
            .unwrap();

        let chained = registry.apply_chain(
            &FilterChain::parse("trimspace|badfilter()|explode|postadd(!)"),
            "  X  ".into(),
        );
        assert_eq!(chained, Value::from("X!"));

        let alone = registry.apply_chain(&FilterChain::parse("trimspace"), "  X  ".into());
        let with_bad = registry.apply_chain(&FilterChain::parse("trimspace|badfilter()"), "  X  ".into());
        assert_eq!(alone, with_bad);
    }

    #[test]
    fn absent_values_skip_the_chain() {
        let registry = FilterRegistry::builtins();
        assert_eq!(
            registry.apply_chain(&FilterChain::parse("intval|postadd(x)"), Value::Null),
            Value::Null
        );
        assert_eq!(
            registry.apply_chain(&FilterChain::default(), "".into()),
            Value::from("")
        );
    }

    #[test]
    fn builtins_are_listed() {
        let names: Vec<_> = FilterRegistry::builtins().names().collect();
        for name in ["preadd", "join", "paging", "unixmill"] {
            assert!(names.contains(&name), "{name}");
        }
    }
}
