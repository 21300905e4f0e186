//! Post model (id plus opaque CMS payload)

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Identifier assigned to a post by the CMS
pub type PostId = u64;

/// A blog post.
///
/// Only `id` is structural. Every other field the CMS returns is kept verbatim
/// in `payload` so that cached posts round-trip through storage unchanged and
/// the collection layer never depends on the remote schema.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Post {
    /// Stable CMS identifier
    pub id: PostId,
    /// Remaining fields, passed through untouched
    #[serde(flatten)]
    pub payload: Map<String, Value>,
}

impl Post {
    /// Create a post with an empty payload
    pub fn new(id: PostId) -> Self {
        Self {
            id,
            payload: Map::new(),
        }
    }

    /// Set `title.rendered`
    pub fn with_title(mut self, title: &str) -> Self {
        self.set_rendered("title", title);
        self
    }

    /// Set `excerpt.rendered`
    pub fn with_excerpt(mut self, excerpt: &str) -> Self {
        self.set_rendered("excerpt", excerpt);
        self
    }

    /// Set the category id list
    pub fn with_categories(mut self, categories: &[u64]) -> Self {
        self.payload.insert(
            "categories".to_string(),
            Value::Array(categories.iter().map(|id| Value::from(*id)).collect()),
        );
        self
    }

    /// Title text (`title.rendered`)
    pub fn title(&self) -> Option<&str> {
        self.rendered("title")
    }

    /// Excerpt HTML (`excerpt.rendered`)
    pub fn excerpt(&self) -> Option<&str> {
        self.rendered("excerpt")
    }

    /// Body HTML (`content.rendered`)
    pub fn content(&self) -> Option<&str> {
        self.rendered("content")
    }

    /// Permalink
    pub fn link(&self) -> Option<&str> {
        self.payload.get("link").and_then(Value::as_str)
    }

    /// Publication date in site-local time
    pub fn date(&self) -> Option<NaiveDateTime> {
        self.payload
            .get("date")
            .and_then(Value::as_str)
            .and_then(|s| NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S").ok())
    }

    /// Category ids this post is filed under
    pub fn categories(&self) -> Vec<u64> {
        self.payload
            .get("categories")
            .and_then(Value::as_array)
            .map(|ids| ids.iter().filter_map(Value::as_u64).collect())
            .unwrap_or_default()
    }

    /// Featured image URL from the `_embed` expansion
    pub fn featured_image(&self) -> Option<&str> {
        self.payload
            .get("_embedded")?
            .get("wp:featuredmedia")?
            .get(0)?
            .get("source_url")?
            .as_str()
    }

    /// Read a `{ "rendered": "..." }` field
    pub fn rendered(&self, field: &str) -> Option<&str> {
        self.payload.get(field)?.get("rendered")?.as_str()
    }

    /// Overwrite a `{ "rendered": "..." }` field, keeping sibling keys
    pub fn set_rendered(&mut self, field: &str, text: &str) {
        let slot = self
            .payload
            .entry(field.to_string())
            .or_insert_with(|| Value::Object(Map::new()));
        if !slot.is_object() {
            *slot = Value::Object(Map::new());
        }
        if let Some(obj) = slot.as_object_mut() {
            obj.insert("rendered".to_string(), Value::String(text.to_string()));
        }
    }

    /// Get a short plain-text preview of the excerpt
    pub fn preview(&self, max_len: usize) -> String {
        let text = crate::catalog::strip_html(self.excerpt().unwrap_or_default());
        let text = text.split_whitespace().collect::<Vec<_>>().join(" ");
        if text.chars().count() <= max_len {
            text
        } else {
            let cut: String = text.chars().take(max_len.saturating_sub(3)).collect();
            format!("{cut}...")
        }
    }
}
