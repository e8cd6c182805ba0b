//! Category routing for incoming questions.

use threadsift_core::Category;

/// One routing rule: a category and the hint words that select it.
#[derive(Debug, Clone)]
pub struct RouteRule {
    pub category: Category,
    pub hints: Vec<String>,
}

/// Maps a free-text question onto an optional category filter.
///
/// Rules are evaluated in order and the first whose hint word appears as a
/// case-insensitive substring wins, so at most one filter is ever produced.
/// The order is policy: construction, then law, then tech. A question
/// mentioning both tech and legal terms routes to Law.
pub struct CategoryRouter {
    rules: Vec<RouteRule>,
}

impl CategoryRouter {
    pub fn new(rules: Vec<RouteRule>) -> Self {
        Self { rules }
    }

    /// The category filter for `question`, if any rule matches.
    pub fn route(&self, question: &str) -> Option<Category> {
        let lowered = question.to_lowercase();
        self.rules
            .iter()
            .find(|rule| rule.hints.iter().any(|hint| lowered.contains(hint.as_str())))
            .map(|rule| rule.category)
    }
}

impl Default for CategoryRouter {
    fn default() -> Self {
        Self::new(vec![
            RouteRule {
                category: Category::Construction,
                hints: vec!["construction".into()],
            },
            RouteRule {
                category: Category::Law,
                hints: vec!["law".into(), "legal".into()],
            },
            RouteRule {
                category: Category::Tech,
                hints: vec!["tech".into(), "software".into()],
            },
        ])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_construction_hint() {
        let router = CategoryRouter::default();
        assert_eq!(
            router.route("What do construction workers think of Procore?"),
            Some(Category::Construction)
        );
    }

    #[test]
    fn test_law_hints_any_case() {
        let router = CategoryRouter::default();
        assert_eq!(router.route("any LEGAL trouble?"), Some(Category::Law));
        assert_eq!(router.route("is this against the law"), Some(Category::Law));
    }

    #[test]
    fn test_tech_hints() {
        let router = CategoryRouter::default();
        assert_eq!(router.route("best tech stack"), Some(Category::Tech));
        assert_eq!(
            router.route("recommend software for invoicing"),
            Some(Category::Tech)
        );
    }

    #[test]
    fn test_no_hint_no_filter() {
        let router = CategoryRouter::default();
        assert_eq!(router.route("what do people say about pricing?"), None);
    }

    #[test]
    fn test_priority_law_before_tech() {
        // Both tech and legal hints present; law is checked first.
        let router = CategoryRouter::default();
        assert_eq!(
            router.route("tech talk about legal issues"),
            Some(Category::Law)
        );
    }

    #[test]
    fn test_priority_construction_first() {
        let router = CategoryRouter::default();
        assert_eq!(
            router.route("construction law software question"),
            Some(Category::Construction)
        );
    }

    #[test]
    fn test_custom_rules() {
        let router = CategoryRouter::new(vec![RouteRule {
            category: Category::Tech,
            hints: vec!["cloud".into()],
        }]);
        assert_eq!(router.route("moving to the cloud"), Some(Category::Tech));
        assert_eq!(router.route("construction site"), None);
    }
}
