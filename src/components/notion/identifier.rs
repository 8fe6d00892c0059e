use serde::{Deserialize, Serialize};
use std::fmt;

/// Length of a database or page identifier without separators
pub const ID_LEN: usize = 32;

/// Positions (in the compact form) where the canonical form has a hyphen
const HYPHEN_OFFSETS: [usize; 4] = [8, 12, 16, 20];

const NOTION_PAGE_BASE: &str = "https://www.notion.so/";

/// A Notion database identifier in the form used for upstream calls
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DatabaseId(String);

impl DatabaseId {
    /// Normalize user input.
    ///
    /// Separators are stripped; when exactly 32 characters remain they are
    /// regrouped 8-4-4-4-12. Any other length is kept as the trimmed input.
    pub fn normalize(input: &str) -> Self {
        let trimmed = input.trim();
        let compact = compact(trimmed);
        if compact.chars().count() != ID_LEN {
            return Self(trimmed.to_string());
        }

        let mut canonical = String::with_capacity(ID_LEN + HYPHEN_OFFSETS.len());
        for (i, c) in compact.chars().enumerate() {
            if HYPHEN_OFFSETS.contains(&i) {
                canonical.push('-');
            }
            canonical.push(c);
        }
        Self(canonical)
    }

    /// Number of characters once separators are removed
    pub fn compact_len(&self) -> usize {
        compact(&self.0).chars().count()
    }

    pub fn is_well_formed(&self) -> bool {
        self.compact_len() == ID_LEN
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DatabaseId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Strip the separators from an identifier
pub fn compact(id: &str) -> String {
    id.chars().filter(|c| *c != '-').collect()
}

/// Browser link for a page
pub fn page_url(page_id: &str) -> String {
    format!("{}{}", NOTION_PAGE_BASE, compact(page_id))
}

#[cfg(test)]
mod tests {
    use super::*;

    const COMPACT: &str = "f6a9e1d80b5c4c7a9f0d1e2f3a4b5c6d";
    const CANONICAL: &str = "f6a9e1d8-0b5c-4c7a-9f0d-1e2f3a4b5c6d";

    #[test]
    fn test_normalize_compact_id() {
        assert_eq!(DatabaseId::normalize(COMPACT).as_str(), CANONICAL);
    }

    #[test]
    fn test_normalize_is_idempotent() {
        let once = DatabaseId::normalize(COMPACT);
        let twice = DatabaseId::normalize(once.as_str());
        assert_eq!(once, twice);
        assert_eq!(DatabaseId::normalize(CANONICAL).as_str(), CANONICAL);
    }

    #[test]
    fn test_normalize_odd_hyphenation_and_whitespace() {
        let id = DatabaseId::normalize("  f6a9-e1d80b5c4c7a9f0d1e2f3a4b5c-6d ");
        assert_eq!(id.as_str(), CANONICAL);
        assert!(id.is_well_formed());
    }

    #[test]
    fn test_wrong_length_passes_through() {
        let id = DatabaseId::normalize(" abc-123 ");
        assert_eq!(id.as_str(), "abc-123");
        assert_eq!(id.compact_len(), 6);
        assert!(!id.is_well_formed());
    }

    #[test]
    fn test_page_url_strips_hyphens() {
        assert_eq!(
            page_url(CANONICAL),
            "https://www.notion.so/f6a9e1d80b5c4c7a9f0d1e2f3a4b5c6d"
        );
    }
}
