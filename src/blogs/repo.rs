use std::sync::Mutex;

use async_trait::async_trait;
use sqlx::{types::Json, PgPool};
use time::OffsetDateTime;

use super::repo_types::{Blog, BlogPatch, NewBlog};
use crate::error::AppResult;

const BLOG_COLUMNS: &str =
    "id, title, content, excerpt, category, tags, image, user_id, created_at, updated_at";

#[async_trait]
pub trait BlogRepo: Send + Sync {
    async fn insert(&self, new: NewBlog) -> AppResult<Blog>;
    async fn find(&self, id: i64) -> AppResult<Option<Blog>>;
    async fn update(&self, id: i64, patch: BlogPatch) -> AppResult<Option<Blog>>;
    /// `false` when there was nothing to delete.
    async fn delete(&self, id: i64) -> AppResult<bool>;
    /// Newest first, by id.
    async fn list_all(&self) -> AppResult<Vec<Blog>>;
    /// Newest first, by id.
    async fn list_by_user(&self, user_id: i64) -> AppResult<Vec<Blog>>;
}

pub struct PgBlogRepo {
    db: PgPool,
}

impl PgBlogRepo {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl BlogRepo for PgBlogRepo {
    async fn insert(&self, new: NewBlog) -> AppResult<Blog> {
        let blog = sqlx::query_as::<_, Blog>(&format!(
            r#"
            INSERT INTO blogs (title, content, excerpt, category, tags, image, user_id)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING {BLOG_COLUMNS}
            "#
        ))
        .bind(new.title)
        .bind(new.content)
        .bind(new.excerpt)
        .bind(new.category)
        .bind(Json(new.tags))
        .bind(new.image)
        .bind(new.user_id)
        .fetch_one(&self.db)
        .await?;
        Ok(blog)
    }

    async fn find(&self, id: i64) -> AppResult<Option<Blog>> {
        let blog = sqlx::query_as::<_, Blog>(&format!(
            "SELECT {BLOG_COLUMNS} FROM blogs WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.db)
        .await?;
        Ok(blog)
    }

    async fn update(&self, id: i64, patch: BlogPatch) -> AppResult<Option<Blog>> {
        let blog = sqlx::query_as::<_, Blog>(&format!(
            r#"
            UPDATE blogs
               SET title = COALESCE($2, title),
                   content = COALESCE($3, content),
                   excerpt = COALESCE($4, excerpt),
                   category = COALESCE($5, category),
                   tags = COALESCE($6, tags),
                   image = COALESCE($7, image),
                   updated_at = now()
             WHERE id = $1
            RETURNING {BLOG_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(patch.title)
        .bind(patch.content)
        .bind(patch.excerpt)
        .bind(patch.category)
        .bind(patch.tags.map(Json))
        .bind(patch.image)
        .fetch_optional(&self.db)
        .await?;
        Ok(blog)
    }

    async fn delete(&self, id: i64) -> AppResult<bool> {
        let res = sqlx::query("DELETE FROM blogs WHERE id = $1")
            .bind(id)
            .execute(&self.db)
            .await?;
        Ok(res.rows_affected() > 0)
    }

    async fn list_all(&self) -> AppResult<Vec<Blog>> {
        let rows = sqlx::query_as::<_, Blog>(&format!(
            "SELECT {BLOG_COLUMNS} FROM blogs ORDER BY id DESC"
        ))
        .fetch_all(&self.db)
        .await?;
        Ok(rows)
    }

    async fn list_by_user(&self, user_id: i64) -> AppResult<Vec<Blog>> {
        let rows = sqlx::query_as::<_, Blog>(&format!(
            "SELECT {BLOG_COLUMNS} FROM blogs WHERE user_id = $1 ORDER BY id DESC"
        ))
        .bind(user_id)
        .fetch_all(&self.db)
        .await?;
        Ok(rows)
    }
}

/// In-memory implementation of `BlogRepo` for development and testing.
#[derive(Default)]
pub struct InMemoryBlogRepo {
    inner: Mutex<MemBlogs>,
}

#[derive(Default)]
struct MemBlogs {
    next_id: i64,
    rows: Vec<Blog>,
}

impl InMemoryBlogRepo {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn blog_count(&self) -> usize {
        self.inner.lock().unwrap().rows.len()
    }

    fn newest_first(mut rows: Vec<Blog>) -> Vec<Blog> {
        rows.sort_by(|a, b| b.id.cmp(&a.id));
        rows
    }
}

#[async_trait]
impl BlogRepo for InMemoryBlogRepo {
    async fn insert(&self, new: NewBlog) -> AppResult<Blog> {
        let mut inner = self.inner.lock().unwrap();
        inner.next_id += 1;
        let blog = Blog {
            id: inner.next_id,
            title: new.title,
            content: new.content,
            excerpt: new.excerpt,
            category: new.category,
            tags: Json(new.tags),
            image: Some(new.image),
            user_id: new.user_id,
            created_at: OffsetDateTime::now_utc(),
            updated_at: None,
        };
        inner.rows.push(blog.clone());
        Ok(blog)
    }

    async fn find(&self, id: i64) -> AppResult<Option<Blog>> {
        let inner = self.inner.lock().unwrap();
        Ok(inner.rows.iter().find(|b| b.id == id).cloned())
    }

    async fn update(&self, id: i64, patch: BlogPatch) -> AppResult<Option<Blog>> {
        let mut inner = self.inner.lock().unwrap();
        let Some(blog) = inner.rows.iter_mut().find(|b| b.id == id) else {
            return Ok(None);
        };
        patch.apply(blog);
        blog.updated_at = Some(OffsetDateTime::now_utc());
        Ok(Some(blog.clone()))
    }

    async fn delete(&self, id: i64) -> AppResult<bool> {
        let mut inner = self.inner.lock().unwrap();
        let before = inner.rows.len();
        inner.rows.retain(|b| b.id != id);
        Ok(inner.rows.len() < before)
    }

    async fn list_all(&self) -> AppResult<Vec<Blog>> {
        let rows = self.inner.lock().unwrap().rows.clone();
        Ok(Self::newest_first(rows))
    }

    async fn list_by_user(&self, user_id: i64) -> AppResult<Vec<Blog>> {
        let rows = self
            .inner
            .lock()
            .unwrap()
            .rows
            .iter()
            .filter(|b| b.user_id == user_id)
            .cloned()
            .collect();
        Ok(Self::newest_first(rows))
    }
}
