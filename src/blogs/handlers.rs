use axum::{
    extract::{DefaultBodyLimit, Multipart, Path, State},
    http::StatusCode,
    routing::{get, post, put},
    Json, Router,
};
use axum_extra::extract::WithRejection;
use tracing::{info, instrument};

use super::{
    dto::BlogResponse,
    repo_types::{BlogPatch, NewBlog},
};
use crate::{
    auth::{dto::MessageResponse, extractors::AuthUser, guard::authorize_owner},
    error::{AppError, AppResult},
    images::{self, FormData},
    state::AppState,
};

const MAX_TITLE_LEN: usize = 200;
const MAX_EXCERPT_LEN: usize = 500;
const IMAGE_PREFIX: &str = "blogs";

pub fn read_routes() -> Router<AppState> {
    Router::new()
        .route("/blog/all", get(list_blogs))
        .route("/blog/my-blogs", get(list_my_blogs))
        .route("/blog/:id", get(get_blog))
}

pub fn write_routes() -> Router<AppState> {
    Router::new()
        .route("/blog", post(create_blog))
        .route("/blog/:id", put(update_blog).delete(delete_blog))
        .layer(DefaultBodyLimit::max(20 * 1024 * 1024)) // 20MB
}

fn blog_not_found() -> AppError {
    AppError::NotFound("Blog not found".into())
}

fn check_len(field: &str, value: &str, max: usize) -> AppResult<()> {
    if value.chars().count() > max {
        return Err(AppError::Validation(format!(
            "field {} must be at most {} characters",
            field, max
        )));
    }
    Ok(())
}

/// Present-but-blank is an error on update; absent means "keep".
fn optional_text(form: &FormData, name: &str) -> AppResult<Option<String>> {
    match form.text(name) {
        None => Ok(None),
        Some(v) if v.trim().is_empty() => Err(AppError::Validation(format!(
            "field {} must not be empty",
            name
        ))),
        Some(v) => Ok(Some(v)),
    }
}

// --- handlers ---

#[instrument(skip(state))]
pub async fn list_blogs(State(state): State<AppState>) -> AppResult<Json<Vec<BlogResponse>>> {
    let blogs = state.blogs.list_all().await?;
    Ok(Json(blogs.into_iter().map(Into::into).collect()))
}

#[instrument(skip(state))]
pub async fn list_my_blogs(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> AppResult<Json<Vec<BlogResponse>>> {
    let blogs = state.blogs.list_by_user(user_id).await?;
    Ok(Json(blogs.into_iter().map(Into::into).collect()))
}

#[instrument(skip(state))]
pub async fn get_blog(
    State(state): State<AppState>,
    WithRejection(Path(id), _): WithRejection<Path<i64>, AppError>,
) -> AppResult<Json<BlogResponse>> {
    let blog = state.blogs.find(id).await?.ok_or_else(blog_not_found)?;
    Ok(Json(blog.into()))
}

/// POST /blog (multipart: title, content, excerpt, category, tags[], image)
#[instrument(skip(state, mp))]
pub async fn create_blog(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    WithRejection(mp, _): WithRejection<Multipart, AppError>,
) -> AppResult<Json<BlogResponse>> {
    let form = FormData::from_multipart(mp).await?;
    create_from_form(&state, user_id, form).await.map(Json)
}

/// PUT /blog/:id (multipart, every field optional)
#[instrument(skip(state, mp))]
pub async fn update_blog(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    WithRejection(Path(id), _): WithRejection<Path<i64>, AppError>,
    WithRejection(mp, _): WithRejection<Multipart, AppError>,
) -> AppResult<Json<BlogResponse>> {
    let form = FormData::from_multipart(mp).await?;
    update_from_form(&state, user_id, id, form).await.map(Json)
}

#[instrument(skip(state))]
pub async fn delete_blog(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    WithRejection(Path(id), _): WithRejection<Path<i64>, AppError>,
) -> AppResult<(StatusCode, Json<MessageResponse>)> {
    let blog = state.blogs.find(id).await?.ok_or_else(blog_not_found)?;
    authorize_owner(&blog, user_id)?;

    if !state.blogs.delete(id).await? {
        return Err(blog_not_found());
    }
    info!(blog_id = id, user_id, "blog deleted");
    Ok((
        StatusCode::OK,
        Json(MessageResponse::new("Blog deleted successfully")),
    ))
}

// --- form processing ---

pub(crate) async fn create_from_form(
    state: &AppState,
    user_id: i64,
    mut form: FormData,
) -> AppResult<BlogResponse> {
    let title = form.required("title")?;
    let content = form.required("content")?;
    let excerpt = form.required("excerpt")?;
    let category = form.required("category")?;
    let tags = form
        .list("tags")
        .ok_or_else(|| AppError::Validation("field tags is required".into()))?;
    check_len("title", &title, MAX_TITLE_LEN)?;
    check_len("excerpt", &excerpt, MAX_EXCERPT_LEN)?;

    let image = form
        .take_file("image")
        .ok_or_else(|| AppError::Validation("field image is required".into()))?;
    images::check_media_type(&image.content_type)?;
    let image_url = images::upload_image(state.storage.as_ref(), IMAGE_PREFIX, image).await?;

    let inserted = state
        .blogs
        .insert(NewBlog {
            title,
            content,
            excerpt,
            category,
            tags,
            image: image_url.clone(),
            user_id,
        })
        .await;

    match inserted {
        Ok(blog) => {
            info!(blog_id = blog.id, user_id, "blog created");
            Ok(blog.into())
        }
        Err(e) => {
            images::discard_image(state.storage.as_ref(), &image_url).await;
            Err(e)
        }
    }
}

pub(crate) async fn update_from_form(
    state: &AppState,
    user_id: i64,
    id: i64,
    mut form: FormData,
) -> AppResult<BlogResponse> {
    let blog = state.blogs.find(id).await?.ok_or_else(blog_not_found)?;
    authorize_owner(&blog, user_id)?;

    let mut patch = BlogPatch {
        title: optional_text(&form, "title")?,
        content: optional_text(&form, "content")?,
        excerpt: optional_text(&form, "excerpt")?,
        category: optional_text(&form, "category")?,
        tags: form.list("tags"),
        image: None,
    };
    if let Some(title) = &patch.title {
        check_len("title", title, MAX_TITLE_LEN)?;
    }
    if let Some(excerpt) = &patch.excerpt {
        check_len("excerpt", excerpt, MAX_EXCERPT_LEN)?;
    }

    if let Some(image) = form.take_file("image") {
        images::check_media_type(&image.content_type)?;
        patch.image =
            Some(images::upload_image(state.storage.as_ref(), IMAGE_PREFIX, image).await?);
    }
    let new_image = patch.image.clone();

    let updated = match state.blogs.update(id, patch).await {
        Ok(Some(blog)) => Ok(blog),
        Ok(None) => Err(blog_not_found()),
        Err(e) => Err(e),
    };
    if updated.is_err() {
        if let Some(url) = &new_image {
            images::discard_image(state.storage.as_ref(), url).await;
        }
    }

    let blog = updated?;
    info!(blog_id = blog.id, user_id, "blog updated");
    Ok(blog.into())
}
