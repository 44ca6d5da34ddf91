//! Keyword fingerprints used to spot duplicate reports.

use serde::{Deserialize, Serialize};

use crate::shared::validation::WHITESPACE_RUN;

/// Upper bound on keywords sent to the candidate query. Array-overlap
/// lookups are bounded to this many terms.
pub const MAX_MATCH_KEYWORDS: usize = 10;

/// Normalized keyword list: trimmed, lowercased, whitespace collapsed,
/// empties dropped and duplicates removed keeping first occurrence
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<String>", into = "Vec<String>")]
pub struct Fingerprint(Vec<String>);

impl Fingerprint {
    pub fn normalize<I, S>(keywords: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut normalized: Vec<String> = Vec::new();
        for keyword in keywords {
            let cleaned = WHITESPACE_RUN
                .replace_all(keyword.as_ref().trim(), " ")
                .to_lowercase();
            if !cleaned.is_empty() && !normalized.contains(&cleaned) {
                normalized.push(cleaned);
            }
        }
        Self(normalized)
    }

    pub fn empty() -> Self {
        Self(Vec::new())
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn keywords(&self) -> &[String] {
        &self.0
    }

    /// The first `MAX_MATCH_KEYWORDS` keywords, in extraction order
    pub fn match_keys(&self) -> &[String] {
        &self.0[..self.0.len().min(MAX_MATCH_KEYWORDS)]
    }

    /// True when `keywords` shares at least one entry with the match keys
    pub fn overlaps(&self, keywords: &[String]) -> bool {
        self.match_keys().iter().any(|k| keywords.contains(k))
    }

    pub fn into_keywords(self) -> Vec<String> {
        self.0
    }
}

impl From<Vec<String>> for Fingerprint {
    fn from(keywords: Vec<String>) -> Self {
        Self::normalize(keywords)
    }
}

impl From<Fingerprint> for Vec<String> {
    fn from(fingerprint: Fingerprint) -> Self {
        fingerprint.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(values: &[&str]) -> Vec<String> {
        values.iter().map(|v| v.to_string()).collect()
    }

    #[test]
    fn test_normalize_cleans_and_dedupes_in_order() {
        let fp = Fingerprint::normalize(["  Pothole ", "ASPHALT", "metal\t  pole", "", "pothole", "   "]);
        assert_eq!(fp.keywords(), &strings(&["pothole", "asphalt", "metal pole"])[..]);
    }

    #[test]
    fn test_match_keys_are_capped_at_ten() {
        let keywords: Vec<String> = (1..=15).map(|i| format!("k{}", i)).collect();
        let fp = Fingerprint::normalize(&keywords);

        assert_eq!(fp.len(), 15);
        assert_eq!(fp.match_keys().len(), MAX_MATCH_KEYWORDS);
        assert_eq!(fp.match_keys(), &keywords[..10]);
    }

    #[test]
    fn test_overlap_only_considers_match_keys() {
        let keywords: Vec<String> = (1..=15).map(|i| format!("k{}", i)).collect();
        let fp = Fingerprint::normalize(&keywords);

        assert!(fp.overlaps(&strings(&["k3"])));
        assert!(fp.overlaps(&strings(&["other", "k10"])));
        assert!(!fp.overlaps(&strings(&["k11", "k15"])));
        assert!(!Fingerprint::empty().overlaps(&strings(&["k1"])));
    }

    #[test]
    fn test_deserialize_normalizes() {
        let fp: Fingerprint = serde_json::from_str(r#"["Graffiti", "graffiti ", "Brick"]"#).unwrap();
        assert_eq!(fp.keywords(), &strings(&["graffiti", "brick"])[..]);
        assert_eq!(serde_json::to_string(&fp).unwrap(), r#"["graffiti","brick"]"#);
    }
}
