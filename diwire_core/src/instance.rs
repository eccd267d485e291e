//! Type-erased instances handed out by a container.

use std::any::{Any, type_name};

/// [`CloneBoxed`] is a trait to clone a reference to an `?Sized` type into a [`Box`].
///
/// This trait is used to work around [`Sized`] bound on [`Clone`].
trait CloneBoxed: Any + Send + Sync {
    /// Returns the boxed clone of `self`.
    fn clone_boxed(&self) -> Box<dyn CloneBoxed + Send + Sync>;
}

impl<T> CloneBoxed for T
where
    T: Any + Clone + Send + Sync,
{
    fn clone_boxed(&self) -> Box<dyn CloneBoxed + Send + Sync> {
        Box::new(self.clone())
    }
}

/// [`Instance`] is an object built by a container, with its concrete type erased.
///
/// Any `'static` type that implements [`Clone`], [`Send`], and [`Sync`] can be held. Types that
/// are expensive to clone, or that should be observed by several owners, are usually wrapped in
/// an [`Arc`](std::sync::Arc) first.
pub struct Instance {
    value: Box<dyn CloneBoxed + Send + Sync>,
    type_name: &'static str,
}

impl Instance {
    /// Wraps `value` into a new `Instance`.
    #[must_use]
    pub fn new<T>(value: T) -> Self
    where
        T: Clone + Send + Sync + 'static,
    {
        Self {
            value: Box::new(value),
            type_name: type_name::<T>(),
        }
    }

    /// Returns the name of the concrete type held by this instance.
    #[inline]
    pub const fn type_name(&self) -> &'static str {
        self.type_name
    }

    /// Returns `true` if the concrete type held by this instance is `T`.
    #[inline]
    pub fn is<T>(&self) -> bool
    where
        T: 'static,
    {
        (&*self.value as &dyn Any).is::<T>()
    }

    /// Tries to downcast `self` into type `T`.
    ///
    /// # Errors
    ///
    /// If the underlying value is not of type `T`, this method will return
    /// itself as error.
    pub fn downcast<T>(self) -> Result<T, Self>
    where
        T: Clone + Send + Sync + 'static,
    {
        if self.is::<T>() {
            #[expect(clippy::missing_panics_doc, reason = "already checked")]
            let concrete = (self.value as Box<dyn Any + Send + Sync>)
                .downcast::<T>()
                .expect("the concrete type of this box should be `T` as it was checked before downcasting.");
            Ok(*concrete)
        } else {
            Err(self)
        }
    }

    /// Returns a reference to the held value if it is of type `T`.
    #[inline]
    pub fn downcast_ref<T>(&self) -> Option<&T>
    where
        T: 'static,
    {
        (&*self.value as &dyn Any).downcast_ref()
    }

    /// Returns a mutable reference to the held value if it is of type `T`.
    #[inline]
    pub fn downcast_mut<T>(&mut self) -> Option<&mut T>
    where
        T: 'static,
    {
        (&mut *self.value as &mut dyn Any).downcast_mut()
    }
}

impl Clone for Instance {
    fn clone(&self) -> Self {
        Self {
            value: self.value.clone_boxed(),
            type_name: self.type_name,
        }
    }
}

impl std::fmt::Debug for Instance {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Instance")
            .field("type_name", &self.type_name)
            .finish_non_exhaustive()
    }
}
