use std::cmp::Ordering;
use std::collections::HashMap;
use std::fmt::Debug;
use std::hash::Hash;

use serde::Serialize;

/// An abstract domain which forms a lattice
pub trait AbstractDomain: Clone + Eq + Debug {
    /// Join two abstract values
    fn join(&self, other: &Self) -> Self;

    /// Meet two abstract values
    fn meet(&self, other: &Self) -> Self;

    /// Widening of two abstract values
    fn widen(&self, other: &Self) -> Self;

    /// Narrowing of two abstract values
    fn narrow(&self, other: &Self) -> Self;

    /// Partial ordering comparison between two abstract values
    fn partial_order(&self, other: &Self) -> Option<Ordering>;

    /// Get the Bottom value of this lattice
    fn bottom() -> Self;
}

/// Combine the orderings of two independent components
fn combine(lhs: Option<Ordering>, rhs: Option<Ordering>) -> Option<Ordering> {
    match (lhs?, rhs?) {
        (Ordering::Equal, order) | (order, Ordering::Equal) => Some(order),
        (l, r) if l == r => Some(l),
        _ => None,
    }
}

//
// Abstract Domain Combinators
//

#[derive(Clone, PartialEq, Eq, Debug, Default, Serialize)]
pub struct PairDomain<A: AbstractDomain, B: AbstractDomain> {
    pub first: A,
    pub second: B,
}

impl<A: AbstractDomain, B: AbstractDomain> AbstractDomain for PairDomain<A, B> {
    fn join(&self, other: &Self) -> Self {
        PairDomain {
            first: self.first.join(&other.first),
            second: self.second.join(&other.second),
        }
    }

    fn meet(&self, other: &Self) -> Self {
        PairDomain {
            first: self.first.meet(&other.first),
            second: self.second.meet(&other.second),
        }
    }

    fn widen(&self, other: &Self) -> Self {
        PairDomain {
            first: self.first.widen(&other.first),
            second: self.second.widen(&other.second),
        }
    }

    fn narrow(&self, other: &Self) -> Self {
        PairDomain {
            first: self.first.narrow(&other.first),
            second: self.second.narrow(&other.second),
        }
    }

    fn partial_order(&self, other: &Self) -> Option<Ordering> {
        combine(
            self.first.partial_order(&other.first),
            self.second.partial_order(&other.second),
        )
    }

    fn bottom() -> Self {
        PairDomain {
            first: A::bottom(),
            second: B::bottom(),
        }
    }
}

/// A point-wise lattice over keys, absent keys stand for bottom
#[derive(Clone, PartialEq, Eq, Debug, Serialize)]
pub struct MapDomain<K, V>
where
    K: Hash + Eq,
    V: AbstractDomain,
{
    pub map: HashMap<K, V>,
}

impl<K: Hash + Eq, V: AbstractDomain> Default for MapDomain<K, V> {
    fn default() -> Self {
        Self {
            map: HashMap::new(),
        }
    }
}

impl<K: Hash + Eq + Clone + Debug, V: AbstractDomain> MapDomain<K, V> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &K) -> Option<&V> {
        self.map.get(key)
    }

    /// The value at `key`, bottom if absent
    pub fn value_of(&self, key: &K) -> V {
        self.map.get(key).cloned().unwrap_or_else(V::bottom)
    }

    /// Overwrite the value at `key`
    pub fn set(&mut self, key: K, value: V) {
        self.map.insert(key, value);
    }

    /// Join `value` into the entry at `key`, reporting whether it changed
    pub fn push(&mut self, key: K, value: V) -> bool {
        match self.map.get_mut(&key) {
            None => {
                self.map.insert(key, value);
                true
            }
            Some(existing) => {
                let joined = existing.join(&value);
                if joined == *existing {
                    false
                } else {
                    *existing = joined;
                    true
                }
            }
        }
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&K, &V)> {
        self.map.iter()
    }

    fn merge_with<F: Fn(&V, &V) -> V>(&self, other: &Self, f: F) -> Self {
        let mut new_map = HashMap::new();
        for key in self.map.keys().chain(other.map.keys()) {
            if new_map.contains_key(key) {
                continue;
            }
            let merged = f(&self.value_of(key), &other.value_of(key));
            if merged != V::bottom() {
                new_map.insert(key.clone(), merged);
            }
        }
        MapDomain { map: new_map }
    }
}

impl<K: Hash + Eq + Clone + Debug, V: AbstractDomain> AbstractDomain for MapDomain<K, V> {
    fn join(&self, other: &Self) -> Self {
        self.merge_with(other, |a, b| a.join(b))
    }

    fn meet(&self, other: &Self) -> Self {
        self.merge_with(other, |a, b| a.meet(b))
    }

    fn widen(&self, other: &Self) -> Self {
        self.merge_with(other, |a, b| a.widen(b))
    }

    fn narrow(&self, other: &Self) -> Self {
        self.merge_with(other, |a, b| a.narrow(b))
    }

    fn partial_order(&self, other: &Self) -> Option<Ordering> {
        let mut order = Some(Ordering::Equal);
        for key in self.map.keys().chain(other.map.keys()) {
            order = combine(
                order,
                self.value_of(key).partial_order(&other.value_of(key)),
            );
            if order.is_none() {
                break;
            }
        }
        order
    }

    fn bottom() -> Self {
        MapDomain {
            map: HashMap::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::interval::LatticeInterval;

    type Store = MapDomain<&'static str, LatticeInterval>;

    fn store(entries: &[(&'static str, LatticeInterval)]) -> Store {
        let mut result = Store::new();
        for (k, v) in entries {
            result.set(*k, *v);
        }
        result
    }

    #[test]
    fn push_reports_changes() {
        let mut state = Store::new();
        assert!(state.push("x", LatticeInterval::constant(1)));
        assert!(!state.push("x", LatticeInterval::constant(1)));
        assert!(state.push("x", LatticeInterval::constant(3)));
        assert_eq!(state.value_of(&"x"), LatticeInterval::range(1, 3));
        assert_eq!(state.value_of(&"y"), LatticeInterval::Bottom);
    }

    #[test]
    fn point_wise_join_and_order() {
        let a = store(&[("x", LatticeInterval::constant(1))]);
        let b = store(&[
            ("x", LatticeInterval::constant(4)),
            ("y", LatticeInterval::top()),
        ]);
        let joined = a.join(&b);
        assert_eq!(joined.value_of(&"x"), LatticeInterval::range(1, 4));
        assert_eq!(joined.value_of(&"y"), LatticeInterval::top());
        assert_eq!(a.partial_order(&joined), Some(Ordering::Less));
        assert_eq!(joined.partial_order(&b), Some(Ordering::Greater));
        assert_eq!(a.partial_order(&b), None);
        assert_eq!(joined.partial_order(&joined), Some(Ordering::Equal));
    }

    #[test]
    fn widening_keeps_one_sided_keys() {
        let previous = store(&[
            ("x", LatticeInterval::range(1, 2)),
            ("y", LatticeInterval::constant(0)),
        ]);
        let current = store(&[("y", LatticeInterval::range(0, 4))]);
        let widened = previous.widen(&current);
        assert_eq!(widened.value_of(&"x"), LatticeInterval::range(1, 2));
        assert_eq!(widened.value_of(&"y"), LatticeInterval::at_least(0));
        assert_eq!(previous.widen(&Store::new()), previous);
        assert_eq!(Store::new().widen(&current), current);
    }

    #[test]
    fn pair_components_are_independent() {
        let mut pair: PairDomain<Store, Store> = PairDomain::bottom();
        pair.first.set("x", LatticeInterval::constant(2));
        let copy = pair.clone();
        pair.second.set("x", LatticeInterval::constant(5));
        assert_eq!(copy.second.value_of(&"x"), LatticeInterval::Bottom);
        assert_eq!(pair.first.value_of(&"x"), LatticeInterval::constant(2));
        assert_eq!(copy.partial_order(&pair), Some(Ordering::Less));

        let joined = copy.join(&pair);
        assert_eq!(joined, pair);
    }
}
