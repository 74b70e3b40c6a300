use serde::Serialize;
use time::OffsetDateTime;

use super::repo_types::Blog;

#[derive(Debug, Serialize)]
pub struct BlogResponse {
    pub id: i64,
    pub title: String,
    pub content: String,
    pub excerpt: String,
    pub category: String,
    pub tags: Vec<String>,
    pub image: Option<String>,
    pub user_id: i64,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339::option")]
    pub updated_at: Option<OffsetDateTime>,
}

impl From<Blog> for BlogResponse {
    fn from(b: Blog) -> Self {
        Self {
            id: b.id,
            title: b.title,
            content: b.content,
            excerpt: b.excerpt,
            category: b.category,
            tags: b.tags.0,
            image: b.image,
            user_id: b.user_id,
            created_at: b.created_at,
            updated_at: b.updated_at,
        }
    }
}
