//! Hash containers used for lookup tables on hot paths. Keys are names and
//! uids owned by a single context, so the fast non-cryptographic hasher is
//! sufficient.

pub type FastHashMap<K, V> = rustc_hash::FxHashMap<K, V>;
pub type FastHashSet<K> = rustc_hash::FxHashSet<K>;
