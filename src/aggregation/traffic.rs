//! Detection counts per traffic type, ordered by first appearance
//!
//! No eviction: the label vocabulary comes from the sensor and stays small.

#[derive(Debug, Clone, Default)]
pub struct TrafficTally {
    counts: Vec<(String, u64)>,
}

impl TrafficTally {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, traffic_type: &str) {
        match self.counts.iter_mut().find(|(label, _)| label == traffic_type) {
            Some((_, count)) => *count += 1,
            None => self.counts.push((traffic_type.to_string(), 1)),
        }
    }

    pub fn get(&self, traffic_type: &str) -> Option<u64> {
        self.counts
            .iter()
            .find(|(label, _)| label == traffic_type)
            .map(|(_, count)| *count)
    }

    /// Sum over all labels
    pub fn total(&self) -> u64 {
        self.counts.iter().map(|(_, count)| count).sum()
    }

    pub fn len(&self) -> usize {
        self.counts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, u64)> {
        self.counts.iter().map(|(label, count)| (label.as_str(), *count))
    }
}
