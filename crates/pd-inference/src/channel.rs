//! Channel tags and the cross-channel result table.

use std::collections::HashMap;
use std::path::Path;

use pd_core::{Error, FitResult, Result};
use serde::{Deserialize, Serialize};

/// Tags sorted ahead of every other channel.
pub const RESERVED_TAGS: [&str; 2] = ["inclusive", "combined"];

/// Reference-channel preference for the systematic breakdown rows.
pub const REFERENCE_PREFERENCE: [&str; 3] = ["combined", "inclusive", "total"];

/// Substrings marking the channel whose interval bounds span the combined curve plot.
pub const GLOBAL_MARKERS: [&str; 3] = ["inclusive", "combined", "total"];

/// Derive a human-readable channel tag from a source identifier.
///
/// Only the file name is inspected. Flavor markers (`_ee`, `_emu`, `_mumu`) or
/// `combined` replace the default `inclusive`; jet-multiplicity and VBF markers
/// append a qualifier.
///
/// ```
/// use pd_inference::channel::channel_tag;
///
/// assert_eq!(channel_tag("cards/datacard_mumu_geq1jets.json"), "mumu (>=1 jets)");
/// assert_eq!(channel_tag("cards/datacard.json"), "inclusive");
/// ```
pub fn channel_tag(source: &str) -> String {
    let name = Path::new(source).file_name().and_then(|n| n.to_str()).unwrap_or(source);

    let mut tag = if name.contains("combined") {
        "combined"
    } else if name.contains("_ee") {
        "ee"
    } else if name.contains("_emu") {
        "emu"
    } else if name.contains("_mumu") {
        "mumu"
    } else {
        "inclusive"
    }
    .to_string();

    if name.contains("_eq0jets") {
        tag.push_str(" (=0 jets)");
    }
    for n in [1, 2] {
        if name.contains(&format!("geq{n}jets")) {
            tag.push_str(&format!(" (>={n} jets)"));
        } else if name.contains(&format!("eq{n}jets")) {
            tag.push_str(&format!(" (={n} jets)"));
        }
    }
    for n in [3, 4] {
        if name.contains(&format!("eq{n}jets")) {
            tag.push_str(&format!(" (={n} jets)"));
        }
    }
    if name.contains("vbf") {
        tag.push_str(" (VBF)");
    }
    tag
}

/// Sort key: reserved tags first, then lexical.
fn sort_key(tag: &str) -> (bool, &str) {
    (!RESERVED_TAGS.contains(&tag), tag)
}

/// One row of the [`ChannelTable`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChannelEntry {
    /// Channel tag.
    pub tag: String,
    /// Finalized decomposition.
    pub result: FitResult,
}

/// Ordered channel results with a tag index.
///
/// Entries are kept sorted with `inclusive`/`combined` first and the remaining tags
/// in lexical order. Tags are unique and entries are never removed.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChannelTable {
    entries: Vec<ChannelEntry>,
    index: HashMap<String, usize>,
}

impl ChannelTable {
    /// Empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a finalized result; a tag already present is a `Validation` error.
    pub fn insert(&mut self, tag: impl Into<String>, result: FitResult) -> Result<()> {
        let tag = tag.into();
        if self.index.contains_key(&tag) {
            return Err(Error::Validation(format!("channel '{tag}' is already in the table")));
        }
        let pos = self.entries.partition_point(|e| sort_key(&e.tag) < sort_key(&tag));
        self.entries.insert(pos, ChannelEntry { tag, result });
        for (i, e) in self.entries.iter().enumerate().skip(pos) {
            self.index.insert(e.tag.clone(), i);
        }
        Ok(())
    }

    /// Result for a tag.
    pub fn get(&self, tag: &str) -> Option<&FitResult> {
        self.index.get(tag).map(|&i| &self.entries[i].result)
    }

    /// `true` if the tag is present.
    pub fn contains(&self, tag: &str) -> bool {
        self.index.contains_key(tag)
    }

    /// Entries in table order.
    pub fn entries(&self) -> &[ChannelEntry] {
        &self.entries
    }

    /// Iterate in table order.
    pub fn iter(&self) -> std::slice::Iter<'_, ChannelEntry> {
        self.entries.iter()
    }

    /// Tags in table order.
    pub fn tags(&self) -> Vec<&str> {
        self.entries.iter().map(|e| e.tag.as_str()).collect()
    }

    /// Number of channels.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// `true` if no channel was inserted.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Channel whose sources label the breakdown rows:
    /// `combined`, else `inclusive`, else `total`, else the first entry.
    pub fn reference(&self) -> Option<&ChannelEntry> {
        REFERENCE_PREFERENCE
            .iter()
            .find_map(|t| self.index.get(*t).map(|&i| &self.entries[i]))
            .or_else(|| self.entries.first())
    }

    /// Baseline interval bounds of the first channel, in table order, whose tag
    /// contains `inclusive`, `combined` or `total`.
    ///
    /// Table order puts `combined` ahead of `inclusive`, so the choice does not
    /// depend on the order the sources were given in.
    pub fn global_bounds(&self) -> Option<(f64, f64)> {
        self.entries
            .iter()
            .find(|e| GLOBAL_MARKERS.iter().any(|m| e.tag.contains(m)))
            .map(|e| (e.result.interval_lower, e.result.interval_upper))
    }
}

impl<'a> IntoIterator for &'a ChannelTable {
    type Item = &'a ChannelEntry;
    type IntoIter = std::slice::Iter<'a, ChannelEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    fn result(r: f64, sources: &[&str]) -> FitResult {
        FitResult {
            point_estimate: r,
            interval_lower: r - 0.1,
            interval_upper: r + 0.1,
            total_relative_uncertainty: 0.1,
            statistical_relative_uncertainty: 0.05,
            per_source_uncertainty: sources.iter().map(|s| (s.to_string(), 0.01)).collect(),
            post_fit_nuisance_values: BTreeMap::new(),
            diagnostics: Vec::new(),
        }
    }

    #[test]
    fn test_channel_tags() {
        assert_eq!(channel_tag("datacard.json"), "inclusive");
        assert_eq!(channel_tag("datacard_ee.json"), "ee");
        assert_eq!(channel_tag("datacard_emu.json"), "emu");
        assert_eq!(channel_tag("/tmp/x/datacard_mumu_eq0jets.json"), "mumu (=0 jets)");
        assert_eq!(channel_tag("datacard_ee_geq1jets.json"), "ee (>=1 jets)");
        assert_eq!(channel_tag("datacard_ee_eq1jets.json"), "ee (=1 jets)");
        assert_eq!(channel_tag("datacard_ee_geq2jets_vbf.json"), "ee (>=2 jets) (VBF)");
        assert_eq!(channel_tag("datacard_mumu_eq4jets.json"), "mumu (=4 jets)");
        assert_eq!(channel_tag("datacard_combined.json"), "combined");
    }

    #[test]
    fn test_tag_ignores_directories() {
        assert_eq!(channel_tag("/data/run_ee/datacard.json"), "inclusive");
    }

    #[test]
    fn test_reserved_tags_sort_first() {
        let mut table = ChannelTable::new();
        for tag in ["mumu", "ee", "inclusive", "emu (=0 jets)", "combined"] {
            table.insert(tag, result(1.0, &[])).unwrap();
        }
        assert_eq!(table.tags(), vec!["combined", "inclusive", "ee", "emu (=0 jets)", "mumu"]);
        for (i, e) in table.iter().enumerate() {
            assert_eq!(table.get(&e.tag), Some(&table.entries()[i].result));
        }
    }

    #[test]
    fn test_duplicate_tag_rejected() {
        let mut table = ChannelTable::new();
        table.insert("ee", result(1.0, &[])).unwrap();
        let err = table.insert("ee", result(2.0, &[])).unwrap_err();
        assert!(err.to_string().contains("already in the table"));
        assert_eq!(table.len(), 1);
        assert_eq!(table.get("ee").unwrap().point_estimate, 1.0);
    }

    #[test]
    fn test_reference_prefers_combined() {
        let mut table = ChannelTable::new();
        table.insert("ee", result(1.0, &["jes"])).unwrap();
        table.insert("combined", result(1.1, &["jes", "pu", "lumi"])).unwrap();
        table.insert("mumu", result(0.9, &["pu"])).unwrap();
        let reference = table.reference().unwrap();
        assert_eq!(reference.tag, "combined");
        let rows: Vec<&String> = reference.result.per_source_uncertainty.keys().collect();
        assert_eq!(rows, vec!["jes", "lumi", "pu"]);
    }

    #[test]
    fn test_reference_fallbacks() {
        let mut table = ChannelTable::new();
        assert!(table.reference().is_none());
        table.insert("mumu", result(1.0, &[])).unwrap();
        table.insert("ee", result(1.0, &[])).unwrap();
        assert_eq!(table.reference().unwrap().tag, "ee");
        table.insert("total", result(1.0, &[])).unwrap();
        assert_eq!(table.reference().unwrap().tag, "total");
        table.insert("inclusive", result(1.0, &[])).unwrap();
        assert_eq!(table.reference().unwrap().tag, "inclusive");
    }

    #[test]
    fn test_global_bounds() {
        let mut table = ChannelTable::new();
        table.insert("ee", result(1.0, &[])).unwrap();
        assert_eq!(table.global_bounds(), None);
        table.insert("inclusive (=0 jets)", result(2.0, &[])).unwrap();
        assert_eq!(table.global_bounds(), Some((1.9, 2.1)));
    }

    #[test]
    fn test_global_bounds_independent_of_insert_order() {
        let mut a = ChannelTable::new();
        a.insert("inclusive", result(2.0, &[])).unwrap();
        a.insert("combined", result(3.0, &[])).unwrap();
        let mut b = ChannelTable::new();
        b.insert("combined", result(3.0, &[])).unwrap();
        b.insert("inclusive", result(2.0, &[])).unwrap();
        assert_eq!(a.global_bounds(), Some((2.9, 3.1)));
        assert_eq!(a.global_bounds(), b.global_bounds());
    }
}
