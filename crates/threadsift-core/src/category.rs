//! Domain categories for scraped discussions.

use serde::{Deserialize, Serialize};

/// One of the fixed industry categories every record belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Category {
    Law,
    Construction,
    Tech,
}

impl Category {
    /// All categories, in a stable order.
    pub fn all() -> &'static [Category] {
        &[Category::Law, Category::Construction, Category::Tech]
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Law => "Law",
            Category::Construction => "Construction",
            Category::Tech => "Tech",
        }
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for Category {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Law" => Ok(Category::Law),
            "Construction" => Ok(Category::Construction),
            "Tech" => Ok(Category::Tech),
            other => Err(format!("unknown category: {}", other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_roundtrip_str() {
        for cat in Category::all() {
            assert_eq!(cat.as_str().parse::<Category>().unwrap(), *cat);
        }
    }

    #[test]
    fn test_unknown_rejected() {
        assert!("Finance".parse::<Category>().is_err());
    }
}
