//! Declared classes and their constructor metadata.

use std::any::type_name;
use std::borrow::Cow;
use std::collections::{BTreeMap, HashMap};
use std::marker::PhantomData;
use std::sync::Arc;

use diwire_core::{ArgumentError, Arguments, Error, Instance, Literal, Result};

/// A type that a container can construct on its own.
///
/// The implementation declares the constructor parameters as plain data, which is what the
/// [`Inspector`](crate::inspector::Inspector) reads to wire a class that has no explicit
/// definition.
///
/// # Example
///
/// ```
/// use diwire::{Arguments, Injectable, Parameter, Result};
///
/// #[derive(Clone)]
/// struct Pool;
///
/// impl Injectable for Pool {
///     fn construct(_args: &mut Arguments) -> Result<Self> {
///         Ok(Self)
///     }
/// }
///
/// #[derive(Clone)]
/// struct Database {
///     pool: Pool,
///     port: u16,
/// }
///
/// impl Injectable for Database {
///     fn parameters() -> Vec<Parameter> {
///         vec![
///             Parameter::of::<Pool>("pool"),
///             Parameter::scalar("port").with_default(5432),
///         ]
///     }
///
///     fn construct(args: &mut Arguments) -> Result<Self> {
///         Ok(Self {
///             pool: args.component(0)?,
///             port: args.take(1)?,
///         })
///     }
/// }
///
/// assert_eq!(Database::class_name(), "Database");
/// ```
pub trait Injectable: Clone + Send + Sync + 'static {
    /// The class identity this type is declared under.
    ///
    /// Defaults to the type name without its module path. Generic types should override it,
    /// as their type parameters are dropped.
    fn class_name() -> &'static str {
        short_type_name(type_name::<Self>())
    }

    /// The constructor parameters, in positional order.
    fn parameters() -> Vec<Parameter> {
        Vec::new()
    }

    /// Builds an instance from positional arguments.
    ///
    /// # Errors
    ///
    /// Returns an error if an argument is missing or has the wrong type, or if construction
    /// itself fails.
    fn construct(args: &mut Arguments) -> Result<Self>;

    /// Declares the methods a definition may call by name after construction.
    fn methods(methods: &mut Methods<Self>) {
        let _ = methods;
    }
}

fn short_type_name(name: &'static str) -> &'static str {
    let base = name.split('<').next().unwrap_or(name);
    base.rsplit("::").next().unwrap_or(base)
}

/// A declared constructor parameter.
#[derive(Debug, Clone, PartialEq)]
pub struct Parameter {
    name: Cow<'static, str>,
    kind: ParameterKind,
    default: Option<Literal>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParameterKind {
    /// The parameter is an instance of the named class or interface.
    Dependency(Cow<'static, str>),
    /// The parameter is a plain value that cannot be inferred from its type.
    Scalar,
}

impl Parameter {
    /// A parameter holding an instance of `T`.
    pub fn of<T>(name: impl Into<Cow<'static, str>>) -> Self
    where
        T: Injectable,
    {
        Self::dependency(name, T::class_name())
    }

    /// A parameter holding an instance of the class or interface named `class`.
    pub fn dependency(
        name: impl Into<Cow<'static, str>>,
        class: impl Into<Cow<'static, str>>,
    ) -> Self {
        Self {
            name: name.into(),
            kind: ParameterKind::Dependency(class.into()),
            default: None,
        }
    }

    /// A plain value parameter.
    pub fn scalar(name: impl Into<Cow<'static, str>>) -> Self {
        Self {
            name: name.into(),
            kind: ParameterKind::Scalar,
            default: None,
        }
    }

    /// Sets the value used when nothing else is known about the parameter.
    ///
    /// Dependencies are always resolved by their class, so their default is only informative.
    #[must_use]
    pub fn with_default(mut self, default: impl Into<Literal>) -> Self {
        self.default = Some(default.into());
        self
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    pub const fn kind(&self) -> &ParameterKind {
        &self.kind
    }

    #[inline]
    pub const fn default(&self) -> Option<&Literal> {
        self.default.as_ref()
    }
}

pub(crate) type MethodFn = Arc<dyn Fn(&mut Instance, &mut Arguments) -> Result<()> + Send + Sync>;

/// The table of methods a class exposes to by-name method calls.
pub struct Methods<T> {
    table: BTreeMap<String, MethodFn>,
    _marker: PhantomData<fn(&mut T)>,
}

impl<T> Methods<T>
where
    T: Clone + Send + Sync + 'static,
{
    const fn new() -> Self {
        Self {
            table: BTreeMap::new(),
            _marker: PhantomData,
        }
    }

    /// Declares the method `name`.
    pub fn method<F>(&mut self, name: impl Into<String>, f: F) -> &mut Self
    where
        F: Fn(&mut T, &mut Arguments) -> Result<()> + Send + Sync + 'static,
    {
        self.table.insert(name.into(), erase_method(f));
        self
    }
}

/// Wraps a typed method so it can be invoked on an [`Instance`].
pub(crate) fn erase_method<T, F>(f: F) -> MethodFn
where
    T: Clone + Send + Sync + 'static,
    F: Fn(&mut T, &mut Arguments) -> Result<()> + Send + Sync + 'static,
{
    Arc::new(move |instance: &mut Instance, args: &mut Arguments| {
        let found = instance.type_name();
        let Some(target) = instance.downcast_mut::<T>() else {
            return Err(Error::resolution(
                args.key(),
                ArgumentError::Mismatch {
                    expected: type_name::<T>(),
                    found: format!("instance of `{found}`"),
                },
            ));
        };
        f(target, args)
    })
}

/// A declared class: a constructible type, or an interface that needs a binding.
#[derive(Clone)]
pub struct Class {
    name: String,
    kind: ClassKind,
}

#[derive(Clone)]
enum ClassKind {
    Interface,
    Concrete {
        parameters: fn() -> Vec<Parameter>,
        construct: fn(&mut Arguments) -> Result<Instance>,
        methods: Arc<BTreeMap<String, MethodFn>>,
    },
}

fn construct_erased<T>(args: &mut Arguments) -> Result<Instance>
where
    T: Injectable,
{
    T::construct(args).map(Instance::new)
}

impl Class {
    /// Creates the class record of `T`.
    pub fn of<T>() -> Self
    where
        T: Injectable,
    {
        let mut methods = Methods::<T>::new();
        T::methods(&mut methods);

        Self {
            name: T::class_name().to_owned(),
            kind: ClassKind::Concrete {
                parameters: T::parameters,
                construct: construct_erased::<T>,
                methods: Arc::new(methods.table),
            },
        }
    }

    /// Creates a class record that cannot be constructed.
    pub fn interface(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: ClassKind::Interface,
        }
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    pub const fn is_constructible(&self) -> bool {
        matches!(self.kind, ClassKind::Concrete { .. })
    }

    /// Inspects the declared constructor parameters.
    ///
    /// Returns `None` for interfaces.
    pub fn parameters(&self) -> Option<Vec<Parameter>> {
        match &self.kind {
            ClassKind::Concrete { parameters, .. } => Some(parameters()),
            ClassKind::Interface => None,
        }
    }

    /// Returns the names of the declared methods, in lexicographic order.
    pub fn method_names(&self) -> impl Iterator<Item = &str> {
        let table = match &self.kind {
            ClassKind::Concrete { methods, .. } => Some(methods.keys()),
            ClassKind::Interface => None,
        };
        table.into_iter().flatten().map(String::as_str)
    }

    pub(crate) fn construct(&self, args: &mut Arguments) -> Result<Instance> {
        match &self.kind {
            ClassKind::Concrete { construct, .. } => construct(args),
            ClassKind::Interface => Err(Error::not_found(&*self.name)),
        }
    }

    pub(crate) fn method(&self, name: &str) -> Option<&MethodFn> {
        match &self.kind {
            ClassKind::Concrete { methods, .. } => methods.get(name),
            ClassKind::Interface => None,
        }
    }
}

impl std::fmt::Debug for Class {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Class")
            .field("name", &self.name)
            .field("constructible", &self.is_constructible())
            .finish_non_exhaustive()
    }
}

/// [`Catalog`] is the set of classes known to a container, keyed by class identity.
///
/// A catalog holds at most one class per identity; declaring a class again replaces it.
#[derive(Debug, Clone, Default)]
pub struct Catalog(HashMap<String, Class>);

impl Catalog {
    /// Creates a new, empty [`Catalog`].
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self(HashMap::new())
    }

    /// Declares `T`, returning the class it replaced, if any.
    pub fn declare<T>(&mut self) -> Option<Class>
    where
        T: Injectable,
    {
        self.insert(Class::of::<T>())
    }

    /// Declares an interface named `name`, returning the class it replaced, if any.
    pub fn declare_interface(&mut self, name: impl Into<String>) -> Option<Class> {
        self.insert(Class::interface(name))
    }

    /// Inserts a class record, returning the class it replaced, if any.
    pub fn insert(&mut self, class: Class) -> Option<Class> {
        self.0.insert(class.name.clone(), class)
    }

    #[inline]
    pub fn get(&self, name: &str) -> Option<&Class> {
        self.0.get(name)
    }

    /// Returns the class named `name` if it can be constructed.
    #[inline]
    pub fn constructible(&self, name: &str) -> Option<&Class> {
        self.get(name).filter(|class| class.is_constructible())
    }

    #[inline]
    pub fn contains(&self, name: &str) -> bool {
        self.0.contains_key(name)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use diwire_core::Value;

    use super::*;

    #[derive(Clone, Debug, PartialEq, Eq)]
    struct Counter {
        count: i64,
    }

    impl Injectable for Counter {
        fn parameters() -> Vec<Parameter> {
            vec![Parameter::scalar("start").with_default(0)]
        }

        fn construct(args: &mut Arguments) -> Result<Self> {
            Ok(Self {
                count: args.take(0)?,
            })
        }

        fn methods(methods: &mut Methods<Self>) {
            methods.method("add", |counter: &mut Self, args| {
                counter.count += args.take::<i64>(0)?;
                Ok(())
            });
        }
    }

    #[derive(Clone)]
    struct Generic<T>(T);

    impl<T> Injectable for Generic<T>
    where
        T: Clone + Send + Sync + 'static,
    {
        fn construct(_args: &mut Arguments) -> Result<Self> {
            Err(Error::other("not constructible in tests"))
        }
    }

    #[test]
    fn test_class_name() {
        assert_eq!(Counter::class_name(), "Counter");
        assert_eq!(Generic::<Counter>::class_name(), "Generic");
    }

    #[test]
    fn test_declare_and_construct() {
        let mut catalog = Catalog::new();
        assert!(catalog.declare::<Counter>().is_none());
        assert!(catalog.declare::<Counter>().is_some());
        assert_eq!(catalog.len(), 1);

        let class = catalog.constructible("Counter").unwrap();
        assert_eq!(
            class.parameters().unwrap(),
            vec![Parameter::scalar("start").with_default(0)]
        );

        let mut args = Arguments::new("Counter", vec![Value::from(3)]);
        let mut instance = class.construct(&mut args).unwrap();

        let add = class.method("add").unwrap();
        add(&mut instance, &mut Arguments::new("Counter", vec![Value::from(4)])).unwrap();
        assert_eq!(instance.downcast::<Counter>().unwrap(), Counter { count: 7 });
        assert_eq!(class.method_names().collect::<Vec<_>>(), vec!["add"]);
    }

    #[test]
    fn test_interface_is_not_constructible() {
        let mut catalog = Catalog::new();
        catalog.declare_interface("Logger");
        assert!(catalog.contains("Logger"));
        assert!(catalog.constructible("Logger").is_none());

        let class = catalog.get("Logger").unwrap();
        assert!(class.parameters().is_none());
        let err = class
            .construct(&mut Arguments::new("Logger", Vec::new()))
            .unwrap_err();
        assert!(err.is_not_found_for("Logger"));
    }

    #[test]
    fn test_method_on_wrong_instance() {
        let add = Class::of::<Counter>().method("add").unwrap().clone();
        let mut instance = Instance::new("not a counter".to_owned());
        let err = add(&mut instance, &mut Arguments::new("x", Vec::new())).unwrap_err();
        assert!(err.is_resolution());
    }
}
