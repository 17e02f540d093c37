//! Bounded fitness memoization
//!
//! `FitnessCache` maps genomes to their fitness and evicts the least recently
//! used entries once it holds more than its capacity. Both insertion and
//! reading count as use, so genomes that survive many generations (elites,
//! frequently reselected individuals) stay cached while one-off offspring
//! age out first.

use std::collections::{BTreeMap, HashMap, HashSet};

use tracing::trace;

use crate::fitness::evaluator::BatchEvaluator;
use crate::fitness::traits::Fitness;
use crate::genome::traits::EvolutionaryGenome;

#[derive(Clone, Debug)]
struct Entry<F> {
    value: F,
    stamp: u64,
}

/// Least-recently-used map from genome to fitness value
///
/// Entries are ordered by a monotonically increasing use stamp; the entry
/// with the smallest stamp is the next one evicted. Eviction only happens in
/// [`FitnessCache::trim`], so the map may briefly exceed its capacity between
/// a bulk update and the following trim.
#[derive(Clone, Debug)]
pub struct FitnessCache<G, F>
where
    G: EvolutionaryGenome,
{
    entries: HashMap<G, Entry<F>>,
    order: BTreeMap<u64, G>,
    clock: u64,
    capacity: usize,
    evictions: usize,
}

impl<G, F> FitnessCache<G, F>
where
    G: EvolutionaryGenome,
{
    /// Create an empty cache retaining at most `capacity` entries
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: HashMap::with_capacity(capacity),
            order: BTreeMap::new(),
            clock: 0,
            capacity,
            evictions: 0,
        }
    }

    /// Maximum number of entries kept after a trim
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of cached entries
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if the cache is empty
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Total number of entries evicted so far
    pub fn evictions(&self) -> usize {
        self.evictions
    }

    /// Check whether a genome has a cached fitness
    pub fn contains(&self, genome: &G) -> bool {
        self.entries.contains_key(genome)
    }

    /// Read a fitness value and mark the entry as most recently used
    pub fn get(&mut self, genome: &G) -> Option<&F> {
        let entry = self.entries.get_mut(genome)?;
        self.clock += 1;
        if let Some(key) = self.order.remove(&entry.stamp) {
            self.order.insert(self.clock, key);
        }
        entry.stamp = self.clock;
        Some(&entry.value)
    }

    /// Read a fitness value without touching its recency
    pub fn peek(&self, genome: &G) -> Option<&F> {
        self.entries.get(genome).map(|entry| &entry.value)
    }

    /// Insert or overwrite a fitness value as the most recently used entry
    pub fn insert(&mut self, genome: G, value: F) {
        self.clock += 1;
        let stamp = self.clock;
        match self.entries.get_mut(&genome) {
            Some(entry) => {
                if let Some(key) = self.order.remove(&entry.stamp) {
                    self.order.insert(stamp, key);
                }
                entry.value = value;
                entry.stamp = stamp;
            }
            None => {
                self.order.insert(stamp, genome.clone());
                self.entries.insert(genome, Entry { value, stamp });
            }
        }
    }

    /// Evict least recently used entries until the cache fits its capacity
    ///
    /// Returns the number of evicted entries.
    pub fn trim(&mut self) -> usize {
        let mut evicted = 0;
        while self.entries.len() > self.capacity {
            let Some((_, genome)) = self.order.pop_first() else {
                break;
            };
            self.entries.remove(&genome);
            evicted += 1;
        }
        if evicted > 0 {
            self.evictions += evicted;
            trace!(evicted, remaining = self.entries.len(), "trimmed fitness cache");
        }
        evicted
    }

    /// Iterate over entries from least to most recently used
    pub fn iter(&self) -> impl Iterator<Item = (&G, &F)> + '_ {
        self.order.values().filter_map(move |genome| {
            self.entries
                .get_key_value(genome)
                .map(|(genome, entry)| (genome, &entry.value))
        })
    }

    /// Evaluate and insert every genome that has no cached fitness yet
    ///
    /// Genomes already cached are left untouched (their recency is not
    /// refreshed). Equal genomes appearing several times in `genomes` are
    /// evaluated once. New entries are inserted in the order they first
    /// appear. Returns the number of fitness evaluations performed.
    pub fn evaluate_missing<Fit, E>(&mut self, genomes: &[G], fitness: &Fit, evaluator: &E) -> usize
    where
        Fit: Fitness<Genome = G, Value = F>,
        E: BatchEvaluator<Fit>,
    {
        let mut seen = HashSet::new();
        let missing: Vec<G> = genomes
            .iter()
            .filter(|genome| !self.entries.contains_key(*genome) && seen.insert(*genome))
            .cloned()
            .collect();
        if missing.is_empty() {
            return 0;
        }

        let values = evaluator.evaluate_batch(fitness, &missing);
        debug_assert_eq!(values.len(), missing.len(), "evaluator must return one value per genome");

        let evaluated = missing.len();
        for (genome, value) in missing.into_iter().zip(values) {
            self.insert(genome, value);
        }
        evaluated
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fitness::evaluator::SequentialEvaluator;
    use crate::fitness::traits::FnFitness;
    use std::cell::Cell;

    #[test]
    fn test_insert_and_get() {
        let mut cache = FitnessCache::new(4);
        cache.insert("a", 1.0);
        cache.insert("b", 2.0);

        assert_eq!(cache.len(), 2);
        assert_eq!(cache.get(&"a"), Some(&1.0));
        assert_eq!(cache.peek(&"b"), Some(&2.0));
        assert_eq!(cache.get(&"c"), None);
    }

    #[test]
    fn test_trim_evicts_oldest() {
        let mut cache = FitnessCache::new(2);
        cache.insert(1, 10);
        cache.insert(2, 20);
        cache.insert(3, 30);

        assert_eq!(cache.trim(), 1);
        assert!(!cache.contains(&1));
        assert!(cache.contains(&2));
        assert!(cache.contains(&3));
        assert_eq!(cache.evictions(), 1);
    }

    #[test]
    fn test_get_refreshes_recency() {
        let mut cache = FitnessCache::new(2);
        cache.insert(1, 10);
        cache.insert(2, 20);
        cache.get(&1);
        cache.insert(3, 30);

        cache.trim();
        assert!(cache.contains(&1));
        assert!(!cache.contains(&2));
        assert!(cache.contains(&3));
    }

    #[test]
    fn test_peek_keeps_recency() {
        let mut cache = FitnessCache::new(2);
        cache.insert(1, 10);
        cache.insert(2, 20);
        cache.peek(&1);
        cache.insert(3, 30);

        cache.trim();
        assert!(!cache.contains(&1));
    }

    #[test]
    fn test_reinsert_overwrites_and_promotes() {
        let mut cache = FitnessCache::new(2);
        cache.insert(1, 10);
        cache.insert(2, 20);
        cache.insert(1, 11);
        cache.insert(3, 30);

        cache.trim();
        assert_eq!(cache.peek(&1), Some(&11));
        assert!(!cache.contains(&2));
    }

    #[test]
    fn test_iter_is_lru_ordered() {
        let mut cache = FitnessCache::new(8);
        cache.insert('x', 1);
        cache.insert('y', 2);
        cache.insert('z', 3);
        cache.get(&'x');

        let keys: Vec<char> = cache.iter().map(|(k, _)| *k).collect();
        assert_eq!(keys, vec!['y', 'z', 'x']);
    }

    #[test]
    fn test_evaluate_missing_skips_cached_and_duplicates() {
        let calls = Cell::new(0);
        let fitness = FnFitness::new(|genome: &Vec<i64>| {
            calls.set(calls.get() + 1);
            genome.iter().sum::<i64>()
        });
        let mut cache = FitnessCache::new(10);
        cache.insert(vec![1], 1);

        let population = vec![vec![1], vec![2], vec![2], vec![3, 4]];
        let evaluated = cache.evaluate_missing(&population, &fitness, &SequentialEvaluator);

        assert_eq!(evaluated, 2);
        assert_eq!(calls.get(), 2);
        assert_eq!(cache.len(), 3);
        assert_eq!(cache.peek(&vec![3, 4]), Some(&7));
    }

    #[test]
    fn test_zero_capacity_trims_everything() {
        let mut cache = FitnessCache::new(0);
        cache.insert(1, 1);
        cache.insert(2, 2);
        assert_eq!(cache.trim(), 2);
        assert!(cache.is_empty());
    }
}
