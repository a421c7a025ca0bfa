use fnv::FnvHasher;
use rand::Rng;
use std::{
    collections::{HashMap, HashSet},
    hash::{BuildHasherDefault, Hash}
};

pub type FnvHashSet<T> = HashSet<T, BuildHasherDefault<FnvHasher>>;
pub type FnvHashMap<K, V> = HashMap<K, V, BuildHasherDefault<FnvHasher>>;

/// An empty fnv hashed set with room for `capacity` entries.
///
/// Fnv suits the short keys used here, such as ids and encoded locations, but offers no
/// protection against crafted collisions.
pub fn fnv_hashset<T: Hash + Eq>(capacity: usize) -> FnvHashSet<T> {
    HashSet::with_capacity_and_hasher(capacity, BuildHasherDefault::<FnvHasher>::default())
}

/// An empty fnv hashed map with room for `capacity` entries.
pub fn fnv_hashmap<K: Hash + Eq, V>(capacity: usize) -> FnvHashMap<K, V> {
    HashMap::with_capacity_and_hasher(capacity, BuildHasherDefault::<FnvHasher>::default())
}

/// A uniformly distributed integer in the closed range `[min, max]`. Both ends can be drawn.
///
/// The bounds are swapped if given the wrong way round rather than panicking.
pub fn rand_inclusive<R: Rng + ?Sized>(rng: &mut R, min: usize, max: usize) -> usize {
    if min <= max {
        rng.gen_range(min..=max)
    } else {
        rng.gen_range(max..=min)
    }
}
