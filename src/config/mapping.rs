use crate::error::ConfigurationError;
use tracing::warn;

/// Validated class-to-cluster assignment for the hierarchical head.
///
/// Built from the dictionary's raw `(cluster, slot)` pairs, one per class,
/// both 0-based. Cluster ids must cover `0..K` with no gaps and, within a
/// cluster, slots must cover `0..size` exactly once.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ClusterMapping {
    assignments: Vec<(usize, usize)>,
    /// Member classes of each cluster, ordered by slot
    clusters: Vec<Vec<usize>>,
}

fn malformed(reason: String) -> ConfigurationError {
    ConfigurationError::MalformedClusterMapping(reason)
}

impl ClusterMapping {
    pub fn from_pairs(
        pairs: &[(usize, usize)],
        n_classes: usize,
    ) -> Result<Self, ConfigurationError> {
        if pairs.len() != n_classes {
            return Err(malformed(format!(
                "mapping has {} entries but there are {n_classes} classes",
                pairs.len()
            )));
        }
        // contiguous cluster ids never exceed the class count
        if let Some((class, &(k, _))) = pairs
            .iter()
            .enumerate()
            .find(|(_, (k, _))| *k >= n_classes)
        {
            return Err(malformed(format!(
                "class {class}: cluster {k} out of range for {n_classes} classes"
            )));
        }
        let n_clusters = pairs.iter().map(|&(k, _)| k + 1).max().unwrap_or(0);
        if n_clusters == 0 {
            return Err(malformed("mapping is empty".to_string()));
        }

        let mut sizes = vec![0_usize; n_clusters];
        for &(k, _) in pairs {
            sizes[k] += 1;
        }
        if let Some(k) = sizes.iter().position(|&s| s == 0) {
            return Err(malformed(format!("cluster {k} has no classes")));
        }

        let mut slots: Vec<Vec<Option<usize>>> = sizes.iter().map(|&s| vec![None; s]).collect();
        for (class, &(k, slot)) in pairs.iter().enumerate() {
            let members = &mut slots[k];
            let size = members.len();
            let Some(entry) = members.get_mut(slot) else {
                return Err(malformed(format!(
                    "class {class}: slot {slot} out of range for cluster {k} of size {size}"
                )));
            };
            if let Some(other) = entry.replace(class) {
                return Err(malformed(format!(
                    "classes {other} and {class} share slot {slot} of cluster {k}"
                )));
            }
        }

        let singletons = sizes.iter().filter(|&&s| s == 1).count();
        if singletons > 0 {
            warn!(
                singletons,
                n_clusters, "class mapping has single-class clusters"
            );
        }

        // Counting plus the duplicate check leaves every slot filled
        let clusters = slots
            .into_iter()
            .map(|members| members.into_iter().flatten().collect())
            .collect();
        Ok(Self {
            assignments: pairs.to_vec(),
            clusters,
        })
    }

    #[must_use]
    pub fn n_classes(&self) -> usize {
        self.assignments.len()
    }

    #[must_use]
    pub fn n_clusters(&self) -> usize {
        self.clusters.len()
    }

    /// `(cluster, slot)` of `class`
    #[must_use]
    pub fn cluster_of(&self, class: usize) -> Option<(usize, usize)> {
        self.assignments.get(class).copied()
    }

    /// Classes in `cluster`, ordered by slot
    #[must_use]
    pub fn members(&self, cluster: usize) -> &[usize] {
        self.clusters.get(cluster).map_or(&[], Vec::as_slice)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn is_malformed(r: Result<ClusterMapping, ConfigurationError>) -> bool {
        matches!(r, Err(ConfigurationError::MalformedClusterMapping(_)))
    }

    #[test]
    fn test_valid_mapping() {
        // classes 0 and 2 in cluster 0, class 1 in cluster 1
        let m = ClusterMapping::from_pairs(&[(0, 1), (1, 0), (0, 0)], 3).unwrap();
        assert_eq!(m.n_classes(), 3);
        assert_eq!(m.n_clusters(), 2);
        assert_eq!(m.members(0), &[2, 0]);
        assert_eq!(m.members(1), &[1]);
        assert_eq!(m.cluster_of(0), Some((0, 1)));
        assert_eq!(m.cluster_of(3), None);
    }

    #[test]
    fn test_length_mismatch() {
        assert!(is_malformed(ClusterMapping::from_pairs(&[(0, 0)], 2)));
    }

    #[test]
    fn test_gap_in_cluster_ids() {
        assert!(is_malformed(ClusterMapping::from_pairs(&[(0, 0), (2, 0)], 2)));
    }

    #[test]
    fn test_slot_out_of_range() {
        assert!(is_malformed(ClusterMapping::from_pairs(&[(0, 0), (0, 2)], 2)));
    }

    #[test]
    fn test_duplicate_slot() {
        assert!(is_malformed(ClusterMapping::from_pairs(
            &[(0, 0), (0, 0), (1, 0)],
            3
        )));
    }

    #[test]
    fn test_huge_cluster_id_is_rejected() {
        assert!(is_malformed(ClusterMapping::from_pairs(
            &[(0, 0), (usize::MAX, 0)],
            2
        )));
        assert!(is_malformed(ClusterMapping::from_pairs(
            &[(0, 0), (usize::MAX / 4, 0)],
            2
        )));
    }

    #[test]
    fn test_empty_mapping() {
        assert!(is_malformed(ClusterMapping::from_pairs(&[], 0)));
    }
}
