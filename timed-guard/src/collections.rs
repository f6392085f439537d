//! Ready-made [`Guarded`] instantiations for the standard collections.

use std::collections;

use crate::Guarded;

pub type Map<K, V> = Guarded<collections::BTreeMap<K, V>>;

/// An ordered map allowing several values per key.
pub type MultiMap<K, V> = Guarded<collections::BTreeMap<K, Vec<V>>>;

pub type HashMap<K, V> = Guarded<collections::HashMap<K, V>>;

pub type Set<T> = Guarded<collections::BTreeSet<T>>;

pub type HashSet<T> = Guarded<collections::HashSet<T>>;

pub type GuardedString = Guarded<String>;
