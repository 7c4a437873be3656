use std::{collections::HashMap, fmt, hash::Hash, marker::PhantomData, num::NonZeroU32, rc::Rc};

/// A handle to some interned value of type `T`, such as an identifier's text.
/// To retrieve a `&T`, use [`Interner::get`].
///
/// Handles are only meaningful for the interner which produced them.
pub struct Interned<T: ?Sized> {
    // Non zero, so that `Option<Interned<T>>` has the same size as the handle.
    handle: NonZeroU32,
    _ty: PhantomData<T>,
}

impl<T: ?Sized> Interned<T> {
    const fn new(handle: NonZeroU32) -> Self {
        Interned {
            handle,
            _ty: PhantomData,
        }
    }

    fn index(self) -> usize {
        self.handle.get() as usize - 1
    }
}

impl<T: ?Sized> Copy for Interned<T> {}

impl<T: ?Sized> Clone for Interned<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T: ?Sized> Hash for Interned<T> {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.handle.hash(state);
    }
}

impl<T: ?Sized> PartialEq for Interned<T> {
    fn eq(&self, other: &Self) -> bool {
        self.handle == other.handle
    }
}

impl<T: ?Sized> Eq for Interned<T> {}

impl<T: ?Sized> fmt::Debug for Interned<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Interned({})", self.handle)
    }
}

impl<T: ?Sized> From<&Interned<T>> for Interned<T> {
    fn from(value: &Interned<T>) -> Self {
        *value
    }
}

/// Owns the text of every identifier seen during a compilation.
///
/// Interning the same value twice yields the same handle, so identifiers are
/// compared and hashed by handle.
pub struct Interner<T: ?Sized> {
    map: HashMap<Rc<T>, Interned<T>>,
    vec: Vec<Rc<T>>,
}

impl fmt::Debug for Interner<str> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map()
            .entries(self.vec.iter().enumerate().map(|(i, value)| (i + 1, value)))
            .finish()
    }
}

impl<T: ?Sized> Interner<T> {
    pub fn with_capacity(capacity: usize) -> Self {
        Interner {
            map: HashMap::with_capacity(capacity),
            vec: Vec::with_capacity(capacity),
        }
    }

    pub fn len(&self) -> usize {
        self.vec.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vec.is_empty()
    }

    /// Interns the provided value, returning a handle which can be used to
    /// retrieve it later.
    pub fn intern(&mut self, value: &T) -> Interned<T>
    where
        T: Eq + Hash + ToOwned,
        T::Owned: Into<Rc<T>>,
    {
        if let Some(handle) = self.lookup(value) {
            return handle;
        }
        let handle = u32::try_from(self.vec.len() + 1)
            .ok()
            .and_then(NonZeroU32::new)
            .map(Interned::new)
            .expect("interner out of capacity");
        let key: Rc<T> = value.to_owned().into();
        self.vec.push(Rc::clone(&key));
        self.map.insert(key, handle);
        handle
    }

    /// Returns the handle of an already interned value, without interning it.
    pub fn lookup(&self, value: &T) -> Option<Interned<T>>
    where
        T: Eq + Hash,
    {
        self.map.get(value).copied()
    }

    /// Returns the corresponding value for the provided [`Interned`] handle.
    /// Panics if the handle was produced by another interner.
    pub fn get(&self, handle: impl Into<Interned<T>>) -> &T {
        &self.vec[handle.into().index()]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_same_text_same_handle() {
        let mut i = Interner::<str>::with_capacity(3);

        let make = i.intern("make-posn");
        let posn = i.intern("posn");
        let make_again = i.intern("make-posn");

        assert_eq!(make, make_again);
        assert_ne!(make, posn);
        assert_eq!(i.get(make), "make-posn");
        assert_eq!(i.get(&posn), "posn");
        assert_eq!(i.len(), 2);
    }

    #[test]
    fn test_lookup_does_not_intern() {
        let mut i = Interner::<str>::with_capacity(1);
        assert_eq!(i.lookup("x"), None);
        assert!(i.is_empty());

        let x = i.intern("x");
        assert_eq!(i.lookup("x"), Some(x));
    }

    #[test]
    fn test_debug_lists_values_by_handle() {
        let mut i = Interner::<str>::with_capacity(2);
        i.intern("a");
        i.intern("b?");
        assert_eq!(format!("{i:?}"), r#"{1: "a", 2: "b?"}"#);
    }
}
