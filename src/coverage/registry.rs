use std::collections::{HashMap, HashSet};

/// Record ids already counted, per professional, for one processing run.
///
/// Professionals are remembered in the order their first id was counted so
/// the summary rows come out in document order.
#[derive(Debug, Default, Clone)]
pub struct DedupRegistry {
    order: Vec<String>,
    counted: HashMap<String, HashSet<String>>,
}

impl DedupRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, professional: &str, record_id: &str) -> bool {
        self.counted
            .get(professional)
            .is_some_and(|ids| ids.contains(record_id))
    }

    /// Returns false when the id was already counted for this professional.
    pub fn insert(&mut self, professional: &str, record_id: &str) -> bool {
        match self.counted.get_mut(professional) {
            Some(ids) => ids.insert(record_id.to_string()),
            None => {
                self.order.push(professional.to_string());
                self.counted.insert(
                    professional.to_string(),
                    HashSet::from([record_id.to_string()]),
                );
                true
            }
        }
    }

    pub fn count_for(&self, professional: &str) -> usize {
        self.counted.get(professional).map_or(0, HashSet::len)
    }

    /// `(professional, unique ids)` in first-counted order.
    pub fn counts(&self) -> impl Iterator<Item = (&str, usize)> + '_ {
        self.order
            .iter()
            .map(|name| (name.as_str(), self.count_for(name)))
    }

    pub fn total(&self) -> usize {
        self.counted.values().map(HashSet::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}
