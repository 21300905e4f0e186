//! Taxonomy terms (categories and tags)

use serde::{Deserialize, Serialize};

/// A category or tag
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Term {
    /// CMS term id
    pub id: u64,
    /// Display name (HTML entities decoded)
    pub name: String,
    /// URL slug
    #[serde(default)]
    pub slug: String,
    /// Number of published posts in this term
    #[serde(default)]
    pub count: u32,
}

/// A post category
pub type Category = Term;

/// A post tag
pub type Tag = Term;
