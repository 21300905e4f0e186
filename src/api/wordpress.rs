//! WordPress REST API client (`/wp-json/wp/v2`)

use anyhow::{Context, Result};
use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::config::Config;
use crate::models::{Category, Comment, Post, PostId, Tag, Term};

use super::ContentApi;

/// Response header carrying the number of result pages
const TOTAL_PAGES_HEADER: &str = "x-wp-totalpages";

/// Largest page size the API accepts for taxonomy listings
const TERMS_PER_PAGE: u32 = 100;

/// WordPress API client
pub struct WordPressClient {
    client: Client,
    base_url: String,
    per_page: u32,
    max_pages: u32,
}

impl WordPressClient {
    /// Create a new client for an API root such as `https://example.com/wp-json/wp/v2`
    pub fn new(base_url: &str) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            per_page: 25,
            max_pages: 40,
        }
    }

    /// Create a client from configuration
    pub fn from_config(config: &Config) -> Self {
        Self::new(&config.api_base)
            .with_page_size(config.per_page)
            .with_max_pages(config.max_pages)
    }

    /// Set the number of posts requested per page
    pub fn with_page_size(mut self, per_page: u32) -> Self {
        self.per_page = per_page.clamp(1, 100);
        self
    }

    /// Cap how many post pages `fetch_posts` walks
    pub fn with_max_pages(mut self, max_pages: u32) -> Self {
        self.max_pages = max_pages.max(1);
        self
    }

    /// Build API URL
    fn api_url(&self, endpoint: &str) -> String {
        format!("{}{}", self.base_url, endpoint)
    }

    async fn get(&self, endpoint: &str, query: &[(&str, String)]) -> Result<Response> {
        let url = self.api_url(endpoint);
        debug!(%url, ?query, "GET");

        let response = self
            .client
            .get(&url)
            .query(query)
            .send()
            .await
            .with_context(|| format!("Failed to fetch {endpoint}"))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("WordPress error {status}: {body}");
        }

        Ok(response)
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        query: &[(&str, String)],
    ) -> Result<T> {
        self.get(endpoint, query)
            .await?
            .json()
            .await
            .with_context(|| format!("Failed to parse {endpoint} response"))
    }

    async fn fetch_terms(&self, endpoint: &str) -> Result<Vec<Term>> {
        let mut terms: Vec<Term> = self
            .get_json(endpoint, &[("per_page", TERMS_PER_PAGE.to_string())])
            .await?;
        for term in &mut terms {
            term.name = html_escape::decode_html_entities(&term.name).to_string();
        }
        Ok(terms)
    }
}

impl ContentApi for WordPressClient {
    async fn fetch_posts(&self) -> Result<Vec<Post>> {
        let mut all_posts = Vec::new();
        let mut page = 1;
        let mut total_pages = 1;

        loop {
            let response = self
                .get(
                    "/posts",
                    &[
                        ("_embed", "true".to_string()),
                        ("per_page", self.per_page.to_string()),
                        ("page", page.to_string()),
                        ("context", "view".to_string()),
                    ],
                )
                .await?;

            if page == 1 {
                total_pages = total_pages_from(&response).min(self.max_pages);
            }

            let posts: Vec<Post> = response
                .json()
                .await
                .context("Failed to parse posts response")?;
            all_posts.extend(posts.into_iter().map(decode_post));

            page += 1;
            if page > total_pages {
                break;
            }
        }

        debug!(count = all_posts.len(), pages = total_pages, "fetched posts");
        Ok(all_posts)
    }

    async fn fetch_post(&self, id: PostId) -> Result<Post> {
        let post: Post = self
            .get_json(&format!("/posts/{id}"), &[("_embed", "true".to_string())])
            .await?;
        Ok(decode_post(post))
    }

    async fn fetch_categories(&self) -> Result<Vec<Category>> {
        self.fetch_terms("/categories").await
    }

    async fn fetch_tags(&self) -> Result<Vec<Tag>> {
        self.fetch_terms("/tags").await
    }

    async fn fetch_comments(&self, post_id: PostId, page: u32) -> Result<Vec<Comment>> {
        self.get_json(
            "/comments",
            &[
                ("post", post_id.to_string()),
                ("page", page.max(1).to_string()),
                ("per_page", self.per_page.to_string()),
            ],
        )
        .await
    }
}

/// Page count from the response header, 1 if absent or malformed
fn total_pages_from(response: &Response) -> u32 {
    response
        .headers()
        .get(TOTAL_PAGES_HEADER)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.trim().parse().ok())
        .unwrap_or(1)
}

/// Decode HTML entities in the rendered title, excerpt and content
fn decode_post(mut post: Post) -> Post {
    for field in ["title", "excerpt", "content"] {
        if let Some(decoded) = post
            .rendered(field)
            .map(|text| html_escape::decode_html_entities(text).to_string())
        {
            post.set_rendered(field, &decoded);
        }
    }
    post
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn wp_post(id: u64, title: &str) -> serde_json::Value {
        json!({
            "id": id,
            "date": "2024-10-21T07:28:00",
            "link": format!("https://blog.example/{id}"),
            "title": { "rendered": title },
            "excerpt": { "rendered": "<p>Caf&eacute; &amp; more</p>" },
            "content": { "rendered": "<p>Body</p>", "protected": false },
            "categories": [1]
        })
    }

    #[tokio::test]
    async fn test_fetch_posts_walks_pages() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/posts"))
            .and(query_param("page", "1"))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("X-WP-TotalPages", "2")
                    .set_body_json(json!([wp_post(2, "Second &#8217;s"), wp_post(1, "First")])),
            )
            .mount(&server)
            .await;

        Mock::given(method("GET"))
            .and(path("/posts"))
            .and(query_param("page", "2"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([wp_post(0, "Zero")])))
            .mount(&server)
            .await;

        let client = WordPressClient::new(&server.uri()).with_page_size(2);
        let posts = client.fetch_posts().await.unwrap();

        let ids: Vec<_> = posts.iter().map(|p| p.id).collect();
        assert_eq!(ids, vec![2, 1, 0]);
        assert_eq!(posts[0].title(), Some("Second \u{2019}s"));
        assert_eq!(posts[0].excerpt(), Some("<p>Café & more</p>"));
        assert_eq!(posts[0].payload["content"]["protected"], json!(false));
    }

    #[tokio::test]
    async fn test_fetch_posts_respects_max_pages() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/posts"))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("X-WP-TotalPages", "9")
                    .set_body_json(json!([wp_post(1, "One")])),
            )
            .expect(1)
            .mount(&server)
            .await;

        let client = WordPressClient::new(&server.uri()).with_max_pages(1);
        assert_eq!(client.fetch_posts().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_fetch_comments_and_terms() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/comments"))
            .and(query_param("post", "7"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([{
                "id": 70,
                "post": 7,
                "parent": 0,
                "author_name": "Jane",
                "date": "2024-10-22T09:00:00",
                "content": { "rendered": "<p>Nice</p>" }
            }])))
            .mount(&server)
            .await;

        Mock::given(method("GET"))
            .and(path("/categories"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                { "id": 1, "name": "News &amp; Views", "slug": "news", "count": 3 }
            ])))
            .mount(&server)
            .await;

        Mock::given(method("GET"))
            .and(path("/tags"))
            .and(query_param("per_page", "100"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                { "id": 5, "name": "rust" }
            ])))
            .mount(&server)
            .await;

        let client = WordPressClient::new(&format!("{}/", server.uri()));
        let comments = client.fetch_comments(7, 1).await.unwrap();
        assert_eq!(comments.len(), 1);
        assert_eq!(comments[0].author_name, "Jane");
        assert!(!comments[0].is_reply());

        let categories = client.fetch_categories().await.unwrap();
        assert_eq!(categories[0].name, "News & Views");

        let tags = client.fetch_tags().await.unwrap();
        assert_eq!(tags[0].id, 5);
        assert_eq!(tags[0].count, 0);
    }

    #[tokio::test]
    async fn test_error_status() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/posts/404"))
            .respond_with(ResponseTemplate::new(404).set_body_string("rest_post_invalid_id"))
            .mount(&server)
            .await;

        let client = WordPressClient::new(&server.uri());
        let err = client.fetch_post(404).await.unwrap_err();
        assert!(err.to_string().contains("404"));
    }
}
