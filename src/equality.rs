//! Equality strategies for slice subscriptions.
//!
//! [`StrictEq`] is the default comparison: shared values (`Arc`, `Rc`) compare
//! by pointer identity, plain values compare by value. [`ShallowEq`] goes one
//! level deeper, comparing each field of a record with [`StrictEq`], so a
//! freshly built record with the same field values counts as equal.

use std::collections::{BTreeMap, HashMap};
use std::hash::{BuildHasher, Hash};
use std::rc::Rc;
use std::sync::Arc;

/// Boxed equality function used by slice subscriptions.
pub type EqualityFn<T> = Arc<dyn Fn(&T, &T) -> bool + Send + Sync>;

/// Strict comparison: identity for shared values, `==` for plain ones.
pub trait StrictEq {
    fn strict_eq(&self, other: &Self) -> bool;
}

/// One-level structural comparison.
pub trait ShallowEq {
    fn shallow_eq(&self, other: &Self) -> bool;
}

/// Default equality used by [`Store::subscribe_to_slice`](crate::Store::subscribe_to_slice).
pub fn strict<T: StrictEq + ?Sized>(a: &T, b: &T) -> bool {
    a.strict_eq(b)
}

/// Shallow equality helper for callers of
/// [`Store::subscribe_to_slice_with`](crate::Store::subscribe_to_slice_with).
pub fn shallow_equal<T: ShallowEq + ?Sized>(a: &T, b: &T) -> bool {
    a.shallow_eq(b)
}

impl<T: ?Sized> StrictEq for Arc<T> {
    fn strict_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(self, other)
    }
}

impl<T: ?Sized> StrictEq for Rc<T> {
    fn strict_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(self, other)
    }
}

impl<T: ?Sized> StrictEq for &T {
    fn strict_eq(&self, other: &Self) -> bool {
        std::ptr::eq(*self, *other)
    }
}

macro_rules! strict_by_value {
    ($($ty:ty),* $(,)?) => {
        $(
            impl StrictEq for $ty {
                fn strict_eq(&self, other: &Self) -> bool {
                    self == other
                }
            }
        )*
    };
}

strict_by_value!(
    (), bool, char, u8, u16, u32, u64, u128, usize, i8, i16, i32, i64, i128, isize, String, str,
);

// NaN is never equal to itself under `==`; identity semantics say a value is
// always the same as itself.
impl StrictEq for f32 {
    fn strict_eq(&self, other: &Self) -> bool {
        self.to_bits() == other.to_bits()
    }
}

impl StrictEq for f64 {
    fn strict_eq(&self, other: &Self) -> bool {
        self.to_bits() == other.to_bits()
    }
}

impl<T: StrictEq> StrictEq for Option<T> {
    fn strict_eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Some(a), Some(b)) => a.strict_eq(b),
            (None, None) => true,
            _ => false,
        }
    }
}

impl<A: StrictEq, B: StrictEq> StrictEq for (A, B) {
    fn strict_eq(&self, other: &Self) -> bool {
        self.0.strict_eq(&other.0) && self.1.strict_eq(&other.1)
    }
}

impl<A: StrictEq, B: StrictEq, C: StrictEq> StrictEq for (A, B, C) {
    fn strict_eq(&self, other: &Self) -> bool {
        self.0.strict_eq(&other.0) && self.1.strict_eq(&other.1) && self.2.strict_eq(&other.2)
    }
}

impl<K, V, H> ShallowEq for HashMap<K, V, H>
where
    K: Eq + Hash,
    V: StrictEq,
    H: BuildHasher,
{
    fn shallow_eq(&self, other: &Self) -> bool {
        self.len() == other.len()
            && self
                .iter()
                .all(|(k, v)| other.get(k).is_some_and(|o| v.strict_eq(o)))
    }
}

impl<K: Ord, V: StrictEq> ShallowEq for BTreeMap<K, V> {
    fn shallow_eq(&self, other: &Self) -> bool {
        self.len() == other.len()
            && self
                .iter()
                .all(|(k, v)| other.get(k).is_some_and(|o| v.strict_eq(o)))
    }
}

impl<T: ShallowEq + ?Sized> ShallowEq for Arc<T> {
    fn shallow_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(self, other) || (**self).shallow_eq(other)
    }
}

impl<T: ShallowEq> ShallowEq for Option<T> {
    fn shallow_eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Some(a), Some(b)) => a.shallow_eq(b),
            (None, None) => true,
            _ => false,
        }
    }
}
