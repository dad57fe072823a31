//! Question categories and the label parser for model output.

use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Comparison,
    Causal,
    Effectiveness,
    Association,
    Other,
    /// A label that matched none of the above. Queried like `Other`.
    Unrecognized(String),
}

const KNOWN: [(&str, Category); 5] = [
    ("comparison", Category::Comparison),
    ("causal", Category::Causal),
    ("effectiveness", Category::Effectiveness),
    ("association", Category::Association),
    ("other", Category::Other),
];

impl Category {
    pub const SPECIFIC: [Category; 4] = [
        Category::Comparison,
        Category::Causal,
        Category::Effectiveness,
        Category::Association,
    ];

    /// Parse a category label, tolerating the noise models add around it.
    ///
    /// Surrounding whitespace, quotes and punctuation are dropped, case is
    /// folded and a leading `category:` is removed. If that doesn't leave an
    /// exact label, a response mentioning exactly one category name is
    /// accepted. Anything else is `Unrecognized` with the raw text.
    pub fn from_label(raw: &str) -> Category {
        let mut label = raw
            .trim()
            .trim_matches(|c: char| !c.is_alphanumeric())
            .to_lowercase();
        if let Some(rest) = label.strip_prefix("category") {
            label = rest
                .trim_start_matches(|c: char| c == ':' || c.is_whitespace())
                .trim_matches(|c: char| !c.is_alphanumeric())
                .to_string();
        }

        if let Some((_, cat)) = KNOWN.iter().find(|(name, _)| *name == label) {
            return cat.clone();
        }

        let words: Vec<&str> = label
            .split(|c: char| !c.is_alphanumeric())
            .filter(|w| !w.is_empty())
            .collect();
        let mut mentioned = KNOWN
            .iter()
            .filter(|(name, _)| words.contains(name))
            .map(|(_, cat)| cat);
        match (mentioned.next(), mentioned.next()) {
            (Some(cat), None) => cat.clone(),
            _ => Category::Unrecognized(raw.trim().to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Category::Comparison => "comparison",
            Category::Causal => "causal",
            Category::Effectiveness => "effectiveness",
            Category::Association => "association",
            Category::Other => "other",
            Category::Unrecognized(raw) => raw,
        }
    }

    /// Relation types a category's template may follow. `None` means the
    /// generic any-relation template.
    pub fn relation_types(&self) -> Option<&'static [&'static str]> {
        match self {
            Category::Comparison => Some(&[
                "IS_BETTER_THAN",
                "HAS_BETTER_RESULTS_THAN",
                "IS_MORE_EFFECTIVE_THAN",
                "IS_AS_EFFECTIVE_AS",
                "IMPROVES",
                "TREATS",
                "ENHANCES",
            ]),
            Category::Causal => Some(&[
                "CAUSES",
                "INCREASES_RISK_OF",
                "REDUCES_RISK_OF",
                "PREDISPOSES_TO",
                "IS_A_RISK_FACTOR_FOR",
                "WORSENS",
                "IMPROVES",
            ]),
            Category::Effectiveness => Some(&[
                "IS_AS_EFFECTIVE_AS",
                "IS_MORE_EFFECTIVE_THAN",
                "TREATS",
                "IMPROVES",
                "IS_SAFE_FOR",
                "ENHANCES",
                "FACILITATES",
            ]),
            Category::Association => Some(&[
                "IS_ASSOCIATED_WITH",
                "PREDICTS",
                "WORSENS",
                "IMPROVES",
                "INFLUENCES",
                "ENABLES",
                "FACILITATES",
                "CAUSES",
                "CORRELATES_WITH",
            ]),
            Category::Other | Category::Unrecognized(_) => None,
        }
    }

    /// Column aliases for `(source, relation, target)` in rendered queries.
    pub fn columns(&self) -> [&'static str; 3] {
        match self {
            Category::Comparison => ["better", "relation", "worse"],
            Category::Causal => ["cause", "relation", "effect"],
            Category::Effectiveness => ["treatment1", "relation", "treatment2"],
            _ => ["from_node", "relation", "to_node"],
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exact_labels_with_noise() {
        assert_eq!(Category::from_label("comparison"), Category::Comparison);
        assert_eq!(Category::from_label("  Causal\n"), Category::Causal);
        assert_eq!(Category::from_label("\"EFFECTIVENESS\"."), Category::Effectiveness);
        assert_eq!(Category::from_label("Category: association"), Category::Association);
        assert_eq!(Category::from_label("other"), Category::Other);
    }

    #[test]
    fn single_mention_in_a_sentence_is_accepted() {
        assert_eq!(
            Category::from_label("The category is causal."),
            Category::Causal
        );
    }

    #[test]
    fn ambiguous_or_unknown_labels_are_unrecognized() {
        assert_eq!(
            Category::from_label("causal or association"),
            Category::Unrecognized("causal or association".into())
        );
        assert_eq!(
            Category::from_label(" diagnostic "),
            Category::Unrecognized("diagnostic".into())
        );
        assert!(matches!(Category::from_label(""), Category::Unrecognized(_)));
    }

    #[test]
    fn only_specific_categories_have_whitelists() {
        for cat in Category::SPECIFIC {
            assert!(cat.relation_types().is_some_and(|r| !r.is_empty()));
        }
        assert!(Category::Other.relation_types().is_none());
        assert!(Category::Unrecognized("x".into()).relation_types().is_none());
    }

    #[test]
    fn whitelist_entries_are_valid_relation_types() {
        for cat in Category::SPECIFIC {
            for rel in cat.relation_types().unwrap_or_default() {
                assert!(kgqa_ingest::is_valid_relation_type(rel), "{rel}");
            }
        }
    }
}
