use std::collections::BTreeMap;

/// Opaque cluster label. Only equality is meaningful.
pub type ClusterId = usize;

/// A partition of `n` items into clusters.
///
/// Items are addressed by their position in the slice that was clustered.
/// Built once from the engine's labels and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Clustering {
    labels: Vec<ClusterId>,
    members: BTreeMap<ClusterId, Vec<usize>>,
}

impl Clustering {
    /// Group positions by label. Members of each cluster are in ascending order.
    pub fn from_labels(labels: Vec<ClusterId>) -> Self {
        let mut members: BTreeMap<ClusterId, Vec<usize>> = BTreeMap::new();
        for (idx, &label) in labels.iter().enumerate() {
            members.entry(label).or_default().push(idx);
        }
        Self { labels, members }
    }

    /// Build from an explicit membership table, bypassing the consistency
    /// that [`Clustering::from_labels`] guarantees.
    #[cfg(test)]
    pub(crate) fn from_parts(labels: Vec<ClusterId>, members: BTreeMap<ClusterId, Vec<usize>>) -> Self {
        Self { labels, members }
    }

    /// Label of the item at `idx`.
    pub fn label(&self, idx: usize) -> ClusterId {
        self.labels[idx]
    }

    #[cfg(test)]
    pub fn labels(&self) -> &[ClusterId] {
        &self.labels
    }

    /// Number of items clustered.
    pub fn item_count(&self) -> usize {
        self.labels.len()
    }

    /// Number of clusters.
    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    #[cfg(test)]
    pub fn members(&self, id: ClusterId) -> Option<&[usize]> {
        self.members.get(&id).map(Vec::as_slice)
    }

    /// Clusters in ascending id order.
    pub fn iter(&self) -> impl Iterator<Item = (ClusterId, &[usize])> {
        self.members.iter().map(|(&id, m)| (id, m.as_slice()))
    }

    /// Up to `limit` clusters with more than one member, largest first.
    /// Equal sizes keep ascending id order.
    pub fn largest_duplicate_groups(&self, limit: usize) -> Vec<(ClusterId, &[usize])> {
        let mut groups: Vec<_> = self.iter().filter(|(_, m)| m.len() > 1).collect();
        groups.sort_by(|a, b| b.1.len().cmp(&a.1.len()));
        groups.truncate(limit);
        groups
    }

    /// Cluster membership as sets of positions, independent of label values.
    #[cfg(test)]
    pub fn composition(&self) -> Vec<Vec<usize>> {
        let mut groups: Vec<Vec<usize>> = self.members.values().cloned().collect();
        groups.sort();
        groups
    }
}
