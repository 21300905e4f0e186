//! Filtering helpers over fetched posts

use std::collections::HashSet;

use crate::models::{Category, Post};

/// Default cap for [`related`]
pub const DEFAULT_RELATED_LIMIT: usize = 10;

/// Posts whose title or excerpt contains `keyword` (case-insensitive).
///
/// An empty or blank keyword matches everything.
pub fn search<'a>(posts: &'a [Post], keyword: &str) -> Vec<&'a Post> {
    let keyword = keyword.trim().to_lowercase();
    if keyword.is_empty() {
        return posts.iter().collect();
    }

    posts
        .iter()
        .filter(|post| {
            let title = post.title().unwrap_or_default().to_lowercase();
            let excerpt = post.excerpt().unwrap_or_default().to_lowercase();
            title.contains(&keyword) || excerpt.contains(&keyword)
        })
        .collect()
}

/// Posts filed under a category, in input order
pub fn in_category<'a>(
    posts: impl IntoIterator<Item = &'a Post>,
    category_id: u64,
) -> Vec<&'a Post> {
    posts
        .into_iter()
        .filter(|post| post.categories().contains(&category_id))
        .collect()
}

/// Posts sharing at least one category with `post`, excluding `post` itself
pub fn related<'a>(posts: &'a [Post], post: &Post, limit: usize) -> Vec<&'a Post> {
    let wanted: HashSet<u64> = post.categories().into_iter().collect();
    posts
        .iter()
        .filter(|other| other.id != post.id)
        .filter(|other| other.categories().iter().any(|id| wanted.contains(id)))
        .take(limit)
        .collect()
}

/// Names for category ids; unknown ids are dropped
pub fn category_names(categories: &[Category], ids: &[u64]) -> Vec<String> {
    ids.iter()
        .filter_map(|id| categories.iter().find(|cat| cat.id == *id))
        .map(|cat| cat.name.clone())
        .collect()
}

/// Remove HTML tags and decode entities for terminal display
pub fn strip_html(html: &str) -> String {
    let text = html
        .replace("<br>", "\n")
        .replace("<br/>", "\n")
        .replace("<br />", "\n")
        .replace("</p><p>", "\n\n")
        .replace("</p>\n<p>", "\n\n");

    let text = regex_lite::Regex::new(r"<[^>]+>")
        .map(|re| re.replace_all(&text, "").to_string())
        .unwrap_or(text);

    html_escape::decode_html_entities(&text).trim().to_string()
}
