//! Keyword taxonomy: category → subcategory → trigger terms.

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::info;

use threadsift_core::{Category, Result};

/// Static mapping from domain category to subcategories of trigger terms.
///
/// The default mirrors the term lists the business supplied; a
/// `taxonomy.json` file with the same shape replaces it wholesale so tests
/// and deployments can tag against alternate vocabularies.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Taxonomy {
    /// Keyed by category name; BTreeMap keeps iteration order stable.
    pub categories: BTreeMap<Category, BTreeMap<String, Vec<String>>>,
}

impl Taxonomy {
    /// Load a taxonomy override from disk, falling back to the default.
    pub fn load_or_default(path: &Path) -> Result<Self> {
        if path.exists() {
            let data = std::fs::read_to_string(path)?;
            let taxonomy: Taxonomy = serde_json::from_str(&data)?;
            info!("Loaded taxonomy override from {}", path.display());
            Ok(taxonomy)
        } else {
            Ok(Self::default())
        }
    }

    /// All trigger terms for one category, across its subcategories.
    pub fn terms_for(&self, category: Category) -> Vec<&str> {
        self.categories
            .get(&category)
            .map(|subcats| {
                subcats
                    .values()
                    .flat_map(|terms| terms.iter().map(String::as_str))
                    .collect()
            })
            .unwrap_or_default()
    }
}

impl Default for Taxonomy {
    fn default() -> Self {
        fn subcats(entries: &[(&str, &[&str])]) -> BTreeMap<String, Vec<String>> {
            entries
                .iter()
                .map(|(name, terms)| {
                    (
                        name.to_string(),
                        terms.iter().map(|t| t.to_string()).collect(),
                    )
                })
                .collect()
        }

        let mut categories = BTreeMap::new();

        categories.insert(
            Category::Law,
            subcats(&[
                (
                    "Case Management",
                    &["clio", "filevine", "smokeball", "practicepanther"][..],
                ),
                ("Research", &["lexisnexis", "westlaw"][..]),
                (
                    "Document Mgmt",
                    &["imanage", "everlaw", "relativity", "document automation"][..],
                ),
                ("Payments", &["lawpay"][..]),
                ("Other", &["ediscovery", "contract software"][..]),
            ]),
        );

        categories.insert(
            Category::Construction,
            subcats(&[
                (
                    "Design",
                    &["autocad", "revit", "bim", "sketchup", "solidworks"][..],
                ),
                (
                    "Project Mgmt",
                    &[
                        "bluebeam",
                        "procore",
                        "plangrid",
                        "primavera",
                        "project management",
                    ][..],
                ),
                (
                    "Other",
                    &["construction software", "estimating software"][..],
                ),
            ]),
        );

        categories.insert(
            Category::Tech,
            subcats(&[
                ("DevOps", &["jira", "docker", "kubernetes", "ansible"][..]),
                ("Cloud", &["aws", "azure", "gcp"][..]),
                (
                    "Security",
                    &["firewall", "endpoint management", "security software"][..],
                ),
                (
                    "Infra",
                    &["servicenow", "splunk", "active directory", "linux"][..],
                ),
            ]),
        );

        Self { categories }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_covers_all_categories() {
        let taxonomy = Taxonomy::default();
        for cat in Category::all() {
            assert!(
                !taxonomy.terms_for(*cat).is_empty(),
                "no terms for {}",
                cat
            );
        }
    }

    #[test]
    fn test_terms_are_category_scoped() {
        let taxonomy = Taxonomy::default();
        let law_terms = taxonomy.terms_for(Category::Law);
        assert!(law_terms.contains(&"westlaw"));
        assert!(!law_terms.contains(&"procore"));
    }

    #[test]
    fn test_json_override_roundtrip() {
        let taxonomy = Taxonomy::default();
        let json = serde_json::to_string(&taxonomy).unwrap();
        let parsed: Taxonomy = serde_json::from_str(&json).unwrap();
        assert_eq!(
            parsed.terms_for(Category::Tech).len(),
            taxonomy.terms_for(Category::Tech).len()
        );
    }
}
