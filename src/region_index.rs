// region_index.rs

use std::collections::BTreeMap;

use crate::features::Feature;

/// Bucket for features without a usable dzongkhag name.
pub const UNKNOWN_REGION: &str = "Unknown";

/// Features grouped by dzongkhag. Keys iterate in sorted order, which is the
/// order regions are offered for selection and batch export.
#[derive(Debug, Clone, Default)]
pub struct RegionIndex {
    groups: BTreeMap<String, Vec<Feature>>,
}

impl RegionIndex {
    pub fn build(features: Vec<Feature>) -> Self {
        let mut groups: BTreeMap<String, Vec<Feature>> = BTreeMap::new();
        for feature in features {
            let key = feature
                .region
                .clone()
                .unwrap_or_else(|| UNKNOWN_REGION.to_string());
            groups.entry(key).or_default().push(feature);
        }
        RegionIndex { groups }
    }

    pub fn regions(&self) -> Vec<&str> {
        self.groups.keys().map(String::as_str).collect()
    }

    /// Features of `region` in load order; empty for unknown regions.
    pub fn features_in(&self, region: &str) -> &[Feature] {
        self.groups.get(region).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn contains(&self, region: &str) -> bool {
        self.groups.contains_key(region)
    }

    pub fn feature_count(&self) -> usize {
        self.groups.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn feature(region: Option<&str>) -> Feature {
        Feature {
            region: region.map(str::to_string),
            ..Feature::default()
        }
    }

    #[test]
    fn groups_with_unknown_bucket() {
        let index = RegionIndex::build(vec![
            feature(Some("A")),
            feature(Some("A")),
            feature(Some("B")),
            feature(None),
        ]);
        assert_eq!(index.regions(), vec!["A", "B", "Unknown"]);
        assert_eq!(index.features_in("A").len(), 2);
        assert_eq!(index.features_in("B").len(), 1);
        assert_eq!(index.features_in(UNKNOWN_REGION).len(), 1);
        assert_eq!(index.feature_count(), 4);
    }

    #[test]
    fn ordering_is_case_sensitive() {
        let index = RegionIndex::build(vec![
            feature(Some("bumthang")),
            feature(Some("Paro")),
            feature(Some("Bumthang")),
        ]);
        assert_eq!(index.regions(), vec!["Bumthang", "Paro", "bumthang"]);
    }

    #[test]
    fn missing_region_is_empty_slice() {
        let index = RegionIndex::build(Vec::new());
        assert!(index.is_empty());
        assert!(index.features_in("Haa").is_empty());
        assert!(!index.contains("Haa"));
    }
}
