//! Positional argument lists handed to constructors and methods.

use std::any::type_name;

use crate::error::{ArgumentError, Error, Result};
use crate::instance::Instance;
use crate::value::{Literal, Value};

/// A wrapper around a single component type.
///
/// Taking a `Component<T>` from [`Arguments`] downcasts an instance argument into `T`.
#[derive(Debug, Default, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct Component<T>(pub T);

/// Conversion from a resolved [`Value`] into a concrete parameter type.
pub trait FromValue: Sized {
    /// Describes the accepted value, used in mismatch diagnostics.
    fn expected() -> &'static str;

    /// Converts `value`, handing it back unchanged when it is not acceptable.
    ///
    /// # Errors
    ///
    /// Returns the original value if it cannot be converted into `Self`.
    fn from_value(value: Value) -> Result<Self, Value>;
}

impl FromValue for Value {
    fn expected() -> &'static str {
        "any value"
    }

    fn from_value(value: Value) -> Result<Self, Value> {
        Ok(value)
    }
}

impl FromValue for Literal {
    fn expected() -> &'static str {
        "literal"
    }

    fn from_value(value: Value) -> Result<Self, Value> {
        match value {
            Value::Literal(literal) => Ok(literal),
            other => Err(other),
        }
    }
}

impl FromValue for Instance {
    fn expected() -> &'static str {
        "instance"
    }

    fn from_value(value: Value) -> Result<Self, Value> {
        match value {
            Value::Instance(instance) => Ok(instance),
            other => Err(other),
        }
    }
}

impl<T> FromValue for Component<T>
where
    T: Clone + Send + Sync + 'static,
{
    fn expected() -> &'static str {
        type_name::<T>()
    }

    fn from_value(value: Value) -> Result<Self, Value> {
        match value {
            Value::Instance(instance) => instance
                .downcast::<T>()
                .map(Component)
                .map_err(Value::Instance),
            other => Err(other),
        }
    }
}

impl FromValue for bool {
    fn expected() -> &'static str {
        "bool"
    }

    fn from_value(value: Value) -> Result<Self, Value> {
        match value {
            Value::Literal(Literal::Bool(b)) => Ok(b),
            other => Err(other),
        }
    }
}

impl FromValue for String {
    fn expected() -> &'static str {
        "string"
    }

    fn from_value(value: Value) -> Result<Self, Value> {
        match value {
            Value::Literal(Literal::String(s)) => Ok(s),
            other => Err(other),
        }
    }
}

impl FromValue for f64 {
    fn expected() -> &'static str {
        "float"
    }

    #[allow(clippy::cast_precision_loss)]
    fn from_value(value: Value) -> Result<Self, Value> {
        match value {
            Value::Literal(Literal::Float(f)) => Ok(f),
            Value::Literal(Literal::Integer(n)) => Ok(n as Self),
            other => Err(other),
        }
    }
}

macro_rules! impl_from_value_int {
    ($($ty:ty),*) => {
        $(
            impl FromValue for $ty {
                fn expected() -> &'static str {
                    stringify!($ty)
                }

                fn from_value(value: Value) -> Result<Self, Value> {
                    match value {
                        Value::Literal(Literal::Integer(n)) => {
                            <$ty>::try_from(n).map_err(|_| Value::Literal(Literal::Integer(n)))
                        }
                        other => Err(other),
                    }
                }
            }
        )*
    };
}

impl_from_value_int!(i8, i16, i32, i64, isize, u8, u16, u32, u64, usize);

impl<T> FromValue for Option<T>
where
    T: FromValue,
{
    fn expected() -> &'static str {
        T::expected()
    }

    fn from_value(value: Value) -> Result<Self, Value> {
        match value {
            Value::Literal(Literal::Null) => Ok(None),
            other => T::from_value(other).map(Some),
        }
    }
}

impl<T> FromValue for Vec<T>
where
    T: FromValue,
{
    fn expected() -> &'static str {
        "list"
    }

    fn from_value(value: Value) -> Result<Self, Value> {
        match value {
            Value::Literal(Literal::List(items)) => {
                let original = items.clone();
                items
                    .into_iter()
                    .map(|item| T::from_value(Value::Literal(item)))
                    .collect::<Result<Self, Value>>()
                    .map_err(|_| Value::Literal(Literal::List(original)))
            }
            other => Err(other),
        }
    }
}

/// Resolved positional arguments of a single constructor or method invocation.
///
/// Values are taken out by index; each one can be taken only once. After the invocation, the
/// container rejects lists with values that were never taken, so a constructor that ignores a
/// surplus argument surfaces as an arity error rather than being silently accepted.
#[derive(Debug)]
pub struct Arguments {
    key: String,
    method: Option<String>,
    values: Vec<Option<Value>>,
}

impl Arguments {
    /// Creates the argument list of a constructor of `key`.
    pub fn new(key: impl Into<String>, values: Vec<Value>) -> Self {
        Self {
            key: key.into(),
            method: None,
            values: values.into_iter().map(Some).collect(),
        }
    }

    /// Marks this list as the arguments of the method call `name`.
    #[must_use]
    pub fn for_method(mut self, name: impl Into<String>) -> Self {
        self.method = Some(name.into());
        self
    }

    /// Returns the key being resolved.
    #[inline]
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Returns the number of arguments, taken or not.
    #[inline]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Takes the argument at `index` and converts it into `T`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Resolution`] if there is no argument at `index`, if it was already taken,
    /// or if it cannot be converted into `T`.
    pub fn take<T>(&mut self, index: usize) -> Result<T>
    where
        T: FromValue,
    {
        let taken = self.values.get_mut(index).and_then(Option::take);
        let Some(value) = taken else {
            return Err(self.error(index, ArgumentError::Missing));
        };

        T::from_value(value).map_err(|value| {
            self.error(
                index,
                ArgumentError::Mismatch {
                    expected: T::expected(),
                    found: value.describe(),
                },
            )
        })
    }

    /// Takes the argument at `index`, falling back to `default` when there is none.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Resolution`] if the argument exists but cannot be converted into `T`.
    pub fn take_or<T>(&mut self, index: usize, default: T) -> Result<T>
    where
        T: FromValue,
    {
        if self.values.get(index).is_some_and(Option::is_some) {
            self.take(index)
        } else {
            Ok(default)
        }
    }

    /// Takes the instance argument at `index` and downcasts it into `T`.
    ///
    /// # Errors
    ///
    /// See [`take`](Self::take).
    pub fn component<T>(&mut self, index: usize) -> Result<T>
    where
        T: Clone + Send + Sync + 'static,
    {
        self.take::<Component<T>>(index).map(|Component(value)| value)
    }

    /// Checks that every argument was taken.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Resolution`] pointing at the first argument that was left over.
    pub fn finish(self) -> Result<()> {
        match self.values.iter().position(Option::is_some) {
            Some(index) => Err(self.error(index, ArgumentError::Unexpected)),
            None => Ok(()),
        }
    }

    fn error(&self, index: usize, source: ArgumentError) -> Error {
        let err = Error::resolution(&*self.key, source).at_argument(index);
        match &self.method {
            Some(method) => err.in_method(method.as_str()),
            None => err,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;

    #[derive(Clone, Debug, PartialEq, Eq)]
    struct Bar(u32);

    #[test]
    fn test_take_literals() {
        let mut args = Arguments::new(
            "foo",
            vec![Value::from(8080), Value::from("db"), Value::from(true)],
        );
        assert_eq!(args.take::<u16>(0).unwrap(), 8080);
        assert_eq!(args.take::<String>(1).unwrap(), "db");
        assert!(args.take::<bool>(2).unwrap());
        args.finish().unwrap();
    }

    #[test]
    fn test_take_component() {
        let mut args = Arguments::new("foo", vec![Instance::new(Bar(3)).into()]);
        assert_eq!(args.component::<Bar>(0).unwrap(), Bar(3));
    }

    #[test]
    fn test_take_twice_is_missing() {
        let mut args = Arguments::new("foo", vec![Value::from(1)]);
        args.take::<i64>(0).unwrap();
        let err = args.take::<i64>(0).unwrap_err();
        assert_eq!(
            err.to_string(),
            "failed to resolve `foo` (argument #0): missing argument"
        );
    }

    #[test]
    fn test_mismatch() {
        let mut args =
            Arguments::new("foo", vec![Instance::new(Arc::new(1_u8)).into()]).for_method("set");
        let err = args.take::<String>(0).unwrap_err();
        assert!(err.is_resolution());
        assert_eq!(
            err.to_string(),
            "failed to resolve `foo` (argument #0 of method `set`): \
             expected string, found instance of `alloc::sync::Arc<u8>`"
        );
    }

    #[test]
    fn test_integer_out_of_range() {
        let mut args = Arguments::new("foo", vec![Value::from(-1)]);
        assert!(args.take::<u32>(0).is_err());
    }

    #[test]
    fn test_option_and_list() {
        let mut args = Arguments::new(
            "foo",
            vec![
                Value::from(()),
                Value::from(vec![Literal::from("a"), Literal::from("b")]),
                Value::from(2.5),
            ],
        );
        assert_eq!(args.take::<Option<String>>(0).unwrap(), None);
        assert_eq!(args.take::<Vec<String>>(1).unwrap(), vec!["a", "b"]);
        assert_eq!(args.take::<Option<f64>>(2).unwrap(), Some(2.5));
    }

    #[test]
    fn test_take_or() {
        let mut args = Arguments::new("foo", vec![Value::from(5)]);
        assert_eq!(args.take_or::<i64>(0, 1).unwrap(), 5);
        assert_eq!(args.take_or::<i64>(1, 1).unwrap(), 1);
    }

    #[test]
    fn test_finish_rejects_leftovers() {
        let mut args = Arguments::new("foo", vec![Value::from(1), Value::from(2)]);
        args.take::<i64>(0).unwrap();
        let err = args.finish().unwrap_err();
        assert_eq!(
            err.to_string(),
            "failed to resolve `foo` (argument #1): unexpected argument"
        );
    }
}
