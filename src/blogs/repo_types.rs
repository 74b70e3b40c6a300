use sqlx::{types::Json, FromRow};
use time::OffsetDateTime;

use crate::auth::guard::Owned;

#[derive(Debug, Clone, FromRow)]
pub struct Blog {
    pub id: i64,
    pub title: String,
    pub content: String,
    pub excerpt: String,
    pub category: String,
    pub tags: Json<Vec<String>>,
    pub image: Option<String>,
    pub user_id: i64,
    pub created_at: OffsetDateTime,
    pub updated_at: Option<OffsetDateTime>,
}

impl Owned for Blog {
    fn owner_id(&self) -> i64 {
        self.user_id
    }
}

#[derive(Debug, Clone)]
pub struct NewBlog {
    pub title: String,
    pub content: String,
    pub excerpt: String,
    pub category: String,
    pub tags: Vec<String>,
    pub image: String,
    pub user_id: i64,
}

/// Fields to overwrite on update; `None` keeps what is stored.
#[derive(Debug, Clone, Default)]
pub struct BlogPatch {
    pub title: Option<String>,
    pub content: Option<String>,
    pub excerpt: Option<String>,
    pub category: Option<String>,
    pub tags: Option<Vec<String>>,
    pub image: Option<String>,
}

impl BlogPatch {
    pub fn apply(self, blog: &mut Blog) {
        if let Some(v) = self.title {
            blog.title = v;
        }
        if let Some(v) = self.content {
            blog.content = v;
        }
        if let Some(v) = self.excerpt {
            blog.excerpt = v;
        }
        if let Some(v) = self.category {
            blog.category = v;
        }
        if let Some(v) = self.tags {
            blog.tags = Json(v);
        }
        if let Some(v) = self.image {
            blog.image = Some(v);
        }
    }
}
