//! Bounded archive of behaviour descriptors.

/// Which entry leaves a full archive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum EvictionPolicy {
    /// Lowest novelty at insertion; ties evict the oldest.
    #[default]
    LeastNovel,
    /// First in, first out.
    Oldest,
}

#[derive(Debug, Clone, PartialEq)]
struct Entry {
    descriptor: Vec<f64>,
    novelty: f64,
}

/// Descriptors of individuals that were novel when they were scored.
///
/// Entries are kept in insertion order. The archive never holds more than
/// `capacity` entries.
#[derive(Debug, Clone, PartialEq)]
pub struct NoveltyArchive {
    capacity: usize,
    policy: EvictionPolicy,
    entries: Vec<Entry>,
}

impl NoveltyArchive {
    pub fn new(capacity: usize, policy: EvictionPolicy) -> Self {
        Self {
            capacity,
            policy,
            entries: Vec::new(),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn policy(&self) -> EvictionPolicy {
        self.policy
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Stored descriptors, oldest first.
    pub fn descriptors(&self) -> impl Iterator<Item = &[f64]> {
        self.entries.iter().map(|e| e.descriptor.as_slice())
    }

    /// Novelty each entry had when it was inserted, oldest first.
    pub fn novelties(&self) -> impl Iterator<Item = f64> + '_ {
        self.entries.iter().map(|e| e.novelty)
    }

    pub fn contains(&self, descriptor: &[f64]) -> bool {
        self.entries.iter().any(|e| e.descriptor == descriptor)
    }

    /// Adds a descriptor, then evicts until the capacity is respected.
    pub fn insert(&mut self, descriptor: Vec<f64>, novelty: f64) {
        self.entries.push(Entry {
            descriptor,
            novelty,
        });
        while self.entries.len() > self.capacity {
            let victim = match self.policy {
                EvictionPolicy::Oldest => 0,
                EvictionPolicy::LeastNovel => self
                    .entries
                    .iter()
                    .enumerate()
                    .min_by(|(_, a), (_, b)| a.novelty.total_cmp(&b.novelty))
                    .map_or(0, |(i, _)| i),
            };
            self.entries.remove(victim);
        }
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_least_novel_evicted_first_ties_oldest() {
        let mut archive = NoveltyArchive::new(2, EvictionPolicy::LeastNovel);
        archive.insert(vec![0.0], 1.0);
        archive.insert(vec![1.0], 1.0);
        archive.insert(vec![2.0], 5.0);
        let kept: Vec<&[f64]> = archive.descriptors().collect();
        assert_eq!(kept, vec![&[1.0][..], &[2.0][..]]);

        archive.insert(vec![3.0], 0.5);
        assert_eq!(archive.len(), 2);
        assert_eq!(archive.novelties().collect::<Vec<_>>(), vec![1.0, 5.0]);
    }

    #[test]
    fn test_oldest_is_fifo() {
        let mut archive = NoveltyArchive::new(3, EvictionPolicy::Oldest);
        for i in 0..5 {
            archive.insert(vec![i as f64], 100.0 - i as f64);
        }
        let kept: Vec<f64> = archive.descriptors().map(|d| d[0]).collect();
        assert_eq!(kept, vec![2.0, 3.0, 4.0]);
    }

    #[test]
    fn test_contains_matches_whole_descriptor() {
        let mut archive = NoveltyArchive::new(4, EvictionPolicy::Oldest);
        archive.insert(vec![1.0, 2.0], 3.0);
        assert!(archive.contains(&[1.0, 2.0]));
        assert!(!archive.contains(&[1.0]));
        assert!(!archive.contains(&[2.0, 1.0]));
    }

    #[test]
    fn test_zero_capacity_stays_empty() {
        let mut archive = NoveltyArchive::new(0, EvictionPolicy::LeastNovel);
        archive.insert(vec![1.0], 10.0);
        assert!(archive.is_empty());
    }
}
