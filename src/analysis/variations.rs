//! Query variation generation
//!
//! Expands a base query into the variations a searcher might actually type:
//! comparison forms, buying-intent forms, question forms, plus product- and
//! category-specific phrasings when those fields are supplied. Generation is
//! deterministic so the same request always yields the same variation set.

use crate::ValidationError;
use serde::{Deserialize, Serialize};

/// Minimum number of variations per analysis
pub const MIN_VARIATIONS: u32 = 5;

/// Maximum number of variations per analysis
pub const MAX_VARIATIONS: u32 = 30;

/// A request to generate and analyze query variations
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisRequest {
    /// The query to expand
    pub base_query: String,

    /// Product category, used for category-specific phrasings
    #[serde(default)]
    pub product_category: Option<String>,

    /// Product name, used for product-specific phrasings
    #[serde(default)]
    pub product_name: Option<String>,

    /// Number of variations to generate, [`MIN_VARIATIONS`]..=[`MAX_VARIATIONS`]
    pub count: u32,
}

impl AnalysisRequest {
    /// Validates the request shape before any work is done
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.base_query.trim().is_empty() {
            return Err(ValidationError::MissingBaseQuery);
        }
        if self.count < MIN_VARIATIONS || self.count > MAX_VARIATIONS {
            return Err(ValidationError::CountOutOfRange {
                got: self.count,
                min: MIN_VARIATIONS,
                max: MAX_VARIATIONS,
            });
        }
        Ok(())
    }
}

// {} is replaced with the base query. Ordered by how commonly each form
// shows up in real search logs; the base query itself always comes first.
const QUERY_TEMPLATES: &[&str] = &[
    "{}",
    "best {}",
    "{} reviews",
    "{} comparison",
    "top rated {}",
    "{} alternatives",
    "how to choose {}",
    "{} pros and cons",
    "is {} worth it",
    "{} for beginners",
    "{} buying guide",
    "cheapest {}",
    "{} vs competitors",
    "which {} is best",
    "what {} should I buy",
    "{} recommendations",
    "most popular {}",
    "{} for small business",
    "{} for professionals",
    "affordable {}",
    "premium {}",
    "{} features explained",
    "{} user experiences",
    "{} long term review",
    "why choose {}",
    "where to buy {}",
    "{} expert opinion",
    "{} frequently asked questions",
    "{} hidden drawbacks",
    "{} honest review",
];

const CATEGORY_TEMPLATES: &[&str] = &[
    "best {category} like {query}",
    "{query} in the {category} market",
    "top {category} options compared to {query}",
    "how does {query} rank among {category}",
];

const PRODUCT_TEMPLATES: &[&str] = &[
    "{product} review",
    "{product} vs {query}",
    "is {product} the best {query}",
    "{product} alternatives",
];

/// Generates exactly `count` distinct variations for a validated request
///
/// Product- and category-specific phrasings (when available) are preferred
/// over the tail of the generic templates. The base query itself is always
/// the first variation.
pub fn generate_variations(request: &AnalysisRequest) -> Vec<String> {
    let query = request.base_query.trim();
    let mut variations: Vec<String> = Vec::new();

    fn push_unique(candidate: String, variations: &mut Vec<String>) {
        if !variations.contains(&candidate) {
            variations.push(candidate);
        }
    }

    // The base query always leads.
    push_unique(query.to_string(), &mut variations);

    if let Some(product) = request.product_name.as_deref().filter(|s| !s.trim().is_empty()) {
        for template in PRODUCT_TEMPLATES {
            let candidate = template
                .replace("{product}", product.trim())
                .replace("{query}", query);
            push_unique(candidate, &mut variations);
        }
    }

    if let Some(category) = request
        .product_category
        .as_deref()
        .filter(|s| !s.trim().is_empty())
    {
        for template in CATEGORY_TEMPLATES {
            let candidate = template
                .replace("{category}", category.trim())
                .replace("{query}", query);
            push_unique(candidate, &mut variations);
        }
    }

    for template in QUERY_TEMPLATES {
        if variations.len() >= request.count as usize {
            break;
        }
        push_unique(template.replace("{}", query), &mut variations);
    }

    variations.truncate(request.count as usize);
    variations
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(count: u32) -> AnalysisRequest {
        AnalysisRequest {
            base_query: "crm software".to_string(),
            product_category: None,
            product_name: None,
            count,
        }
    }

    #[test]
    fn test_validate_count_bounds() {
        assert_eq!(
            request(3).validate(),
            Err(ValidationError::CountOutOfRange {
                got: 3,
                min: 5,
                max: 30
            })
        );
        assert!(request(5).validate().is_ok());
        assert!(request(30).validate().is_ok());
        assert!(request(31).validate().is_err());
    }

    #[test]
    fn test_validate_rejects_empty_query() {
        let mut r = request(10);
        r.base_query = "   ".to_string();
        assert_eq!(r.validate(), Err(ValidationError::MissingBaseQuery));
    }

    #[test]
    fn test_generates_exact_count() {
        for count in [5, 12, 30] {
            let variations = generate_variations(&request(count));
            assert_eq!(variations.len(), count as usize);
        }
    }

    #[test]
    fn test_variations_are_distinct() {
        let variations = generate_variations(&request(30));
        let mut deduped = variations.clone();
        deduped.sort();
        deduped.dedup();
        assert_eq!(deduped.len(), variations.len());
    }

    #[test]
    fn test_base_query_comes_first() {
        let variations = generate_variations(&request(5));
        assert_eq!(variations[0], "crm software");
    }

    #[test]
    fn test_generation_is_deterministic() {
        assert_eq!(
            generate_variations(&request(20)),
            generate_variations(&request(20))
        );
    }

    #[test]
    fn test_product_phrasings_included() {
        let mut r = request(10);
        r.product_name = Some("AcmeCRM".to_string());
        let variations = generate_variations(&r);
        assert!(variations.iter().any(|v| v.contains("AcmeCRM")));
    }

    #[test]
    fn test_category_phrasings_included() {
        let mut r = request(10);
        r.product_category = Some("sales tools".to_string());
        let variations = generate_variations(&r);
        assert!(variations.iter().any(|v| v.contains("sales tools")));
    }
}
