/// Type alias for sets, we use this to hide which type of `HashSet` we are actually using.
pub type Set<S> = fxhash::FxHashSet<S>;
/// Type alias for maps, we use this to hide which type of `HashMap` we are actually using.
pub type Map<K, V> = fxhash::FxHashMap<K, V>;

/// Type alias for sets that preserve the order in which elements were inserted. The record
/// format demands this for the accepting set, which must come back out in the order it went in.
pub type OrderedSet<S> = indexmap::IndexSet<S, fxhash::FxBuildHasher>;
/// Type alias for maps that preserve the order in which keys were inserted. Used for the
/// per-state transition mapping, whose key order is part of how a record reads.
pub type OrderedMap<K, V> = indexmap::IndexMap<K, V, fxhash::FxBuildHasher>;
