use axum::{
    extract::{DefaultBodyLimit, Multipart, State},
    routing::{get, put},
    Json, Router,
};
use axum_extra::extract::WithRejection;
use tracing::{info, instrument};

use super::{dto::PublicUser, repo_types::ProfilePatch};
use crate::{
    auth::extractors::AuthUser,
    error::{AppError, AppResult},
    images::{self, FormData},
    state::AppState,
};

pub fn me_routes() -> Router<AppState> {
    Router::new()
        .route("/me", get(get_me))
        .route("/me/update", put(update_me))
        .layer(DefaultBodyLimit::max(20 * 1024 * 1024))
}

fn user_not_found() -> AppError {
    AppError::NotFound("User not found".into())
}

#[instrument(skip(state))]
pub async fn get_me(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> AppResult<Json<PublicUser>> {
    let user = state
        .users
        .find_by_id(user_id)
        .await?
        .ok_or_else(user_not_found)?;
    Ok(Json(user.into()))
}

#[instrument(skip(state, mp))]
pub async fn update_me(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    WithRejection(mp, _): WithRejection<Multipart, AppError>,
) -> AppResult<Json<PublicUser>> {
    let form = FormData::from_multipart(mp).await?;
    apply_profile_form(&state, user_id, form).await.map(Json)
}

pub(crate) async fn apply_profile_form(
    state: &AppState,
    user_id: i64,
    mut form: FormData,
) -> AppResult<PublicUser> {
    if state.users.find_by_id(user_id).await?.is_none() {
        return Err(user_not_found());
    }

    let image = form.take_file("profile_image");
    if let Some(img) = &image {
        images::check_media_type(&img.content_type)?;
    }

    let mut patch = ProfilePatch {
        bio: form.text("bio"),
        website: form.text("website"),
        twitter: form.text("twitter"),
        github: form.text("github"),
        linkedin: form.text("linkedin"),
        profile_image: None,
    };
    if let Some(img) = image {
        patch.profile_image = Some(images::upload_image(state.storage.as_ref(), "avatars", img).await?);
    }
    let new_avatar = patch.profile_image.clone();

    let updated = match state.users.update_profile(user_id, patch).await {
        Ok(Some(user)) => Ok(user),
        Ok(None) => Err(user_not_found()),
        Err(e) => Err(e),
    };
    if let (Err(_), Some(url)) = (&updated, &new_avatar) {
        images::discard_image(state.storage.as_ref(), url).await;
    }

    let user = updated?;
    info!(user_id, "profile updated");
    Ok(user.into())
}

#[cfg(test)]
mod me_tests {
    use super::*;
    use crate::images::UploadItem;
    use crate::state::test_support::{fake_state, test_config};
    use crate::storage::fake::FakeStorage;
    use crate::users::repo::{InMemoryUserRepo, UserRepo};
    use crate::users::repo_types::{NewUser, User};
    use async_trait::async_trait;
    use bytes::Bytes;
    use std::sync::Arc;

    async fn seeded() -> (AppState, Arc<FakeStorage>, i64) {
        let (state, storage) = fake_state();
        let user = state
            .users
            .create(NewUser {
                email: "a@x.com".into(),
                name: "A".into(),
                password_hash: "hash".into(),
            })
            .await
            .unwrap();
        (state, storage, user.id)
    }

    #[test]
    fn public_user_has_no_password_field() {
        let response = PublicUser {
            id: 1,
            email: "test@example.com".to_string(),
            name: "T".into(),
            bio: None,
            website: None,
            twitter: None,
            github: None,
            linkedin: None,
            profile_image: None,
            created_at: time::macros::datetime!(2024-05-01 12:00 UTC),
        };
        let json = serde_json::to_string(&response).unwrap();
        assert!(json.contains("test@example.com"));
        assert!(json.contains("\"created_at\":\"2024-05-01T12:00:00Z\""));
        assert!(!json.contains("password"));
    }

    #[tokio::test]
    async fn get_me_returns_caller() {
        let (state, _, id) = seeded().await;
        let Json(me) = get_me(State(state), AuthUser(id)).await.unwrap();
        assert_eq!(me.email, "a@x.com");
    }

    #[tokio::test]
    async fn get_me_for_vanished_user_is_not_found() {
        let (state, _) = fake_state();
        let err = get_me(State(state), AuthUser(99)).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn profile_update_uploads_avatar_and_keeps_other_fields() {
        let (state, storage, id) = seeded().await;
        let mut form = FormData::default();
        form.push_text("bio", "writer");
        apply_profile_form(&state, id, form).await.unwrap();

        let mut form = FormData::default();
        form.put_file(
            "profile_image",
            UploadItem {
                body: Bytes::from_static(b"img"),
                content_type: "image/webp".into(),
            },
        );
        let user = apply_profile_form(&state, id, form).await.unwrap();
        assert_eq!(user.bio.as_deref(), Some("writer"));
        assert!(user
            .profile_image
            .as_deref()
            .unwrap()
            .starts_with("https://fake.local/avatars/"));
        assert_eq!(storage.put_count(), 1);
    }

    #[tokio::test]
    async fn profile_update_rejects_gif_before_upload() {
        let (state, storage, id) = seeded().await;
        let mut form = FormData::default();
        form.push_text("bio", "ignored");
        form.put_file(
            "profile_image",
            UploadItem {
                body: Bytes::from_static(b"GIF89a"),
                content_type: "image/gif".into(),
            },
        );
        let err = apply_profile_form(&state, id, form).await.unwrap_err();
        assert!(matches!(err, AppError::UnsupportedMedia));
        assert_eq!(storage.put_count(), 0);
        let user = state.users.find_by_id(id).await.unwrap().unwrap();
        assert_eq!(user.bio, None);
    }

    /// Profile writes fail; everything else is served from memory.
    struct ProfileWriteFails(InMemoryUserRepo);

    #[async_trait]
    impl UserRepo for ProfileWriteFails {
        async fn find_by_email(&self, email: &str) -> AppResult<Option<User>> {
            self.0.find_by_email(email).await
        }
        async fn find_by_id(&self, id: i64) -> AppResult<Option<User>> {
            self.0.find_by_id(id).await
        }
        async fn create(&self, new: NewUser) -> AppResult<User> {
            self.0.create(new).await
        }
        async fn update_profile(&self, _id: i64, _patch: ProfilePatch) -> AppResult<Option<User>> {
            Err(anyhow::anyhow!("connection reset").into())
        }
    }

    #[tokio::test]
    async fn failed_profile_write_discards_new_avatar() {
        let repo = ProfileWriteFails(InMemoryUserRepo::new());
        let user = repo
            .create(NewUser {
                email: "a@x.com".into(),
                name: "A".into(),
                password_hash: "hash".into(),
            })
            .await
            .unwrap();
        let storage = Arc::new(FakeStorage::default());
        let state = AppState::from_parts(
            test_config(),
            Arc::new(repo),
            Arc::new(crate::blogs::repo::InMemoryBlogRepo::new()),
            storage.clone(),
        );

        let mut form = FormData::default();
        form.put_file(
            "profile_image",
            UploadItem {
                body: Bytes::from_static(b"img"),
                content_type: "image/png".into(),
            },
        );
        let err = apply_profile_form(&state, user.id, form).await.unwrap_err();
        assert!(matches!(err, AppError::Unhandled(_)));

        let uploaded: Vec<String> = storage
            .objects
            .lock()
            .unwrap()
            .iter()
            .map(|(key, _)| key.clone())
            .collect();
        assert_eq!(uploaded.len(), 1);
        assert!(uploaded[0].starts_with("avatars/"));
        assert_eq!(*storage.deleted.lock().unwrap(), uploaded);
    }
}
