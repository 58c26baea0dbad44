//! Ordering and key-extraction policies consumed by [`RbTree`](super::RbTree).

/// Strict weak ordering over keys.
///
/// Two keys `a` and `b` are equivalent when neither `less(a, b)` nor `less(b, a)` holds.
/// Implementations must be pure: the tree assumes repeated calls give the same answer.
///
/// Any `Fn(&K, &K) -> bool` closure is a `Compare<K>`.
pub trait Compare<K: ?Sized> {
    /// Is `a` ordered strictly before `b`?
    fn less(&self, a: &K, b: &K) -> bool;
}

/// Ascending order according to [`Ord`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Less;

impl<K: Ord + ?Sized> Compare<K> for Less {
    #[inline]
    fn less(&self, a: &K, b: &K) -> bool {
        a < b
    }
}

/// Descending order according to [`Ord`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Greater;

impl<K: Ord + ?Sized> Compare<K> for Greater {
    #[inline]
    fn less(&self, a: &K, b: &K) -> bool {
        b < a
    }
}

impl<K: ?Sized, F> Compare<K> for F
where
    F: Fn(&K, &K) -> bool,
{
    #[inline]
    fn less(&self, a: &K, b: &K) -> bool {
        self(a, b)
    }
}

/// Projection from a stored value to the key it is ordered by.
pub trait KeyOf<V> {
    /// The ordering key.
    type Key: ?Sized;

    /// Get the key of `value`.
    fn key_of(value: &V) -> &Self::Key;
}

/// The value is its own key (set-like trees).
#[derive(Clone, Copy, Debug, Default)]
pub struct Identity;

impl<V> KeyOf<V> for Identity {
    type Key = V;

    #[inline]
    fn key_of(value: &V) -> &V {
        value
    }
}

/// The first element of a pair is the key (map-like trees).
#[derive(Clone, Copy, Debug, Default)]
pub struct First;

impl<K, T> KeyOf<(K, T)> for First {
    type Key = K;

    #[inline]
    fn key_of(value: &(K, T)) -> &K {
        &value.0
    }
}
