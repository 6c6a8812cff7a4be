//! Category-to-markup classification.
//!
//! Products arriving from the provider carry free-form category names. Pricing policy
//! is keyed on a small set of internal category keys, so each product must be
//! classified before a margin can be applied. Classification is a single pure function
//! over an explicit, ordered rule table: the first rule with a keyword contained in
//! the lower-cased `"{category} {name}"` text wins, and anything unmatched falls back
//! to the `default` key.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

pub const DEFAULT_CATEGORY_KEY: &str = "default";

/// One classification rule: a category key and the keywords that select it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarkupRule {
    pub category_key: String,
    pub keywords: Vec<String>,
}

/// The full rule table plus the margin multiplier per category key. Stored as a JSON
/// value in the settings table and injected where needed; there is no module-level
/// cache.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarkupRules {
    pub rules: Vec<MarkupRule>,
    /// Margin multipliers, e.g. 1.15 for a 15% markup. The `default` entry applies to
    /// unmatched categories; absent that, 1.0 (no markup).
    pub margins: HashMap<String, f64>,
}

impl Default for MarkupRules {
    fn default() -> Self {
        let mut margins = HashMap::new();
        margins.insert(DEFAULT_CATEGORY_KEY.to_string(), 1.0);
        Self { rules: Vec::new(), margins }
    }
}

impl MarkupRules {
    /// Classifies a product into a category key. Deterministic: rule order decides
    /// ties, matching is case-insensitive substring containment against
    /// `"{category_name} {product_name}"`.
    pub fn classify<'a>(&'a self, category_name: &str, product_name: &str) -> &'a str {
        let haystack = format!("{} {}", category_name.to_lowercase(), product_name.to_lowercase());
        self.rules
            .iter()
            .find(|rule| rule.keywords.iter().any(|kw| haystack.contains(&kw.to_lowercase())))
            .map(|rule| rule.category_key.as_str())
            .unwrap_or(DEFAULT_CATEGORY_KEY)
    }

    /// The margin multiplier for a category key, falling back to the default entry
    /// and then to 1.0.
    pub fn margin_for(&self, category_key: &str) -> f64 {
        self.margins
            .get(category_key)
            .or_else(|| self.margins.get(DEFAULT_CATEGORY_KEY))
            .copied()
            .unwrap_or(1.0)
    }

    /// Convenience: classify and apply the margin to a raw provider price.
    pub fn marked_up_price(&self, category_name: &str, product_name: &str, raw_price: f64) -> f64 {
        let key = self.classify(category_name, product_name);
        raw_price * self.margin_for(key)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn fixture() -> MarkupRules {
        let rules = vec![
            MarkupRule {
                category_key: "pubg".to_string(),
                keywords: vec!["pubg".to_string(), "uc".to_string()],
            },
            MarkupRule {
                category_key: "streaming".to_string(),
                keywords: vec!["netflix".to_string(), "shahid".to_string()],
            },
        ];
        let mut margins = HashMap::new();
        margins.insert("pubg".to_string(), 1.10);
        margins.insert("streaming".to_string(), 1.25);
        margins.insert(DEFAULT_CATEGORY_KEY.to_string(), 1.05);
        MarkupRules { rules, margins }
    }

    #[test]
    fn classification_is_keyword_based_and_case_insensitive() {
        let rules = fixture();
        assert_eq!(rules.classify("PUBG Mobile", "60 UC"), "pubg");
        assert_eq!(rules.classify("Gift Cards", "Netflix 1 Month"), "streaming");
        assert_eq!(rules.classify("Telecom", "Syriatel Units"), DEFAULT_CATEGORY_KEY);
    }

    #[test]
    fn first_matching_rule_wins() {
        let rules = fixture();
        // "uc" appears in the first rule; a product mentioning both matches it.
        assert_eq!(rules.classify("UC store", "netflix themed uc pack"), "pubg");
    }

    #[test]
    fn margins_fall_back_to_default_then_one() {
        let rules = fixture();
        assert_eq!(rules.margin_for("pubg"), 1.10);
        assert_eq!(rules.margin_for("unknown"), 1.05);
        let empty = MarkupRules { rules: Vec::new(), margins: HashMap::new() };
        assert_eq!(empty.margin_for("anything"), 1.0);
    }

    #[test]
    fn marked_up_price_applies_the_right_margin() {
        let rules = fixture();
        let price = rules.marked_up_price("PUBG Mobile", "60 UC", 100.0);
        assert!((price - 110.0).abs() < 1e-9);
        let default_price = rules.marked_up_price("Telecom", "Units", 100.0);
        assert!((default_price - 105.0).abs() < 1e-9);
    }

    #[test]
    fn default_table_is_a_no_op() {
        let rules = MarkupRules::default();
        assert_eq!(rules.classify("Anything", "At All"), DEFAULT_CATEGORY_KEY);
        assert_eq!(rules.marked_up_price("Anything", "At All", 42.0), 42.0);
    }
}
