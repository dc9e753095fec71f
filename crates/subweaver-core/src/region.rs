// Region classification
//
// Node labels are free text, so region membership is decided by an explicit
// keyword table (code -> substrings) rather than inline conditionals. A label
// may match several regions; that is accepted behavior -- a node can serve
// more than one region and joins every matching group.

use indexmap::IndexMap;

/// Default keyword table: territory codes, CJK names, and airport codes.
pub fn default_keywords() -> IndexMap<String, Vec<String>> {
    let table = [
        ("HK", vec!["HK", "香港", "HONGKONG", "HKG", "KONG"]),
        ("TW", vec!["TW", "台湾", "TAIWAN", "ROC", "台北"]),
        ("SG", vec!["SG", "新加坡", "SINGAPORE", "SIN", "狮城"]),
        ("JP", vec!["JP", "日本", "JAPAN", "TOKYO", "OSAKA", "东京", "大阪"]),
        ("US", vec!["US", "美国", "AMERICA", "LAX", "SFO", "SEA"]),
    ];
    table
        .into_iter()
        .map(|(code, kws)| {
            (
                code.to_owned(),
                kws.into_iter().map(str::to_owned).collect(),
            )
        })
        .collect()
}

/// Default flag glyphs used in synthesized group labels.
pub fn default_flags() -> IndexMap<String, String> {
    [
        ("HK", "\u{1f1ed}\u{1f1f0}"),
        ("TW", "\u{1f1f9}\u{1f1fc}"),
        ("SG", "\u{1f1f8}\u{1f1ec}"),
        ("JP", "\u{1f1ef}\u{1f1f5}"),
        ("US", "\u{1f1fa}\u{1f1f8}"),
    ]
    .into_iter()
    .map(|(code, flag)| (code.to_owned(), flag.to_owned()))
    .collect()
}

/// Case-insensitive keyword table mapping region codes to label substrings.
///
/// Insertion order is significant: groups are synthesized and emitted in
/// table order, which keeps the output deterministic.
#[derive(Debug, Clone)]
pub struct RegionTable {
    /// Keywords stored upper-cased; matching upper-cases the label once.
    keywords: IndexMap<String, Vec<String>>,
    flags: IndexMap<String, String>,
}

impl Default for RegionTable {
    fn default() -> Self {
        Self::new(default_keywords(), default_flags())
    }
}

impl RegionTable {
    pub fn new(
        keywords: IndexMap<String, Vec<String>>,
        flags: IndexMap<String, String>,
    ) -> Self {
        let keywords = keywords
            .into_iter()
            .map(|(code, kws)| (code, kws.iter().map(|k| k.to_uppercase()).collect()))
            .collect();
        Self { keywords, flags }
    }

    /// Region codes in table order.
    pub fn codes(&self) -> impl Iterator<Item = &str> {
        self.keywords.keys().map(String::as_str)
    }

    /// Whether `code` has an entry in the table.
    pub fn contains(&self, code: &str) -> bool {
        self.keywords.contains_key(code)
    }

    /// Flag glyph for a region code; empty if none is configured.
    pub fn flag(&self, code: &str) -> &str {
        self.flags.get(code).map_or("", String::as_str)
    }

    /// Whether `label` matches the given region's keywords.
    pub fn matches(&self, code: &str, label: &str) -> bool {
        let upper = label.to_uppercase();
        self.keywords
            .get(code)
            .is_some_and(|kws| kws.iter().any(|kw| upper.contains(kw)))
    }

    /// All region codes whose keywords the label matches. May be empty,
    /// may contain more than one code.
    pub fn classify(&self, label: &str) -> Vec<&str> {
        let upper = label.to_uppercase();
        self.keywords
            .iter()
            .filter(|(_, kws)| kws.iter().any(|kw| upper.contains(kw)))
            .map(|(code, _)| code.as_str())
            .collect()
    }

    /// Whether the label matches no region at all (the miscellaneous pool).
    pub fn is_unclassified(&self, label: &str) -> bool {
        let upper = label.to_uppercase();
        !self
            .keywords
            .values()
            .flatten()
            .any(|kw| upper.contains(kw))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn classification_is_case_insensitive() {
        let table = RegionTable::default();
        assert_eq!(table.classify("hk-fast"), table.classify("HK-FAST"));
        assert_eq!(table.classify("hk-fast"), vec!["HK"]);
    }

    #[test]
    fn label_can_match_multiple_regions() {
        let table = RegionTable::default();
        // "SIN" is an SG airport code; "HK" the territory code.
        let codes = table.classify("HK-SIN relay");
        assert_eq!(codes, vec!["HK", "SG"]);
    }

    #[test]
    fn unmatched_label_is_unclassified() {
        let table = RegionTable::default();
        assert!(table.classify("Frankfurt 01").is_empty());
        assert!(table.is_unclassified("Frankfurt 01"));
        assert!(!table.is_unclassified("东京 premium"));
    }

    #[test]
    fn custom_table_keywords_are_upper_cased_once() {
        let keywords: IndexMap<String, Vec<String>> =
            [("DE".to_owned(), vec!["frankfurt".to_owned()])]
                .into_iter()
                .collect();
        let table = RegionTable::new(keywords, IndexMap::new());
        assert!(table.matches("DE", "FRANKFURT-01"));
        assert!(table.matches("DE", "Frankfurt-01"));
        assert_eq!(table.flag("DE"), "");
    }
}
