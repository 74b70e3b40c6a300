use std::sync::Mutex;

use async_trait::async_trait;
use sqlx::PgPool;
use time::OffsetDateTime;
use tracing::{debug, instrument};

use super::repo_types::{NewUser, ProfilePatch, User};
use crate::error::{AppError, AppResult};

const USER_COLUMNS: &str = "id, email, password_hash, name, bio, website, twitter, github, \
                            linkedin, profile_image, created_at";

#[async_trait]
pub trait UserRepo: Send + Sync {
    async fn find_by_email(&self, email: &str) -> AppResult<Option<User>>;
    async fn find_by_id(&self, id: i64) -> AppResult<Option<User>>;
    /// Fails with `Conflict` when the email is already taken.
    async fn create(&self, new: NewUser) -> AppResult<User>;
    async fn update_profile(&self, id: i64, patch: ProfilePatch) -> AppResult<Option<User>>;
}

fn email_taken() -> AppError {
    AppError::Conflict("Email already registered".into())
}

pub struct PgUserRepo {
    db: PgPool,
}

impl PgUserRepo {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl UserRepo for PgUserRepo {
    async fn find_by_email(&self, email: &str) -> AppResult<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE email = $1"
        ))
        .bind(email)
        .fetch_optional(&self.db)
        .await?;
        Ok(user)
    }

    async fn find_by_id(&self, id: i64) -> AppResult<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.db)
        .await?;
        Ok(user)
    }

    #[instrument(skip(self, new), fields(email = %new.email))]
    async fn create(&self, new: NewUser) -> AppResult<User> {
        let res = sqlx::query_as::<_, User>(&format!(
            r#"
            INSERT INTO users (email, name, password_hash)
            VALUES ($1, $2, $3)
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(&new.email)
        .bind(&new.name)
        .bind(&new.password_hash)
        .fetch_one(&self.db)
        .await;

        match res {
            Ok(user) => Ok(user),
            Err(sqlx::Error::Database(e)) if e.is_unique_violation() => Err(email_taken()),
            Err(e) => Err(e.into()),
        }
    }

    async fn update_profile(&self, id: i64, patch: ProfilePatch) -> AppResult<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!(
            r#"
            UPDATE users
               SET bio = COALESCE($2, bio),
                   website = COALESCE($3, website),
                   twitter = COALESCE($4, twitter),
                   github = COALESCE($5, github),
                   linkedin = COALESCE($6, linkedin),
                   profile_image = COALESCE($7, profile_image)
             WHERE id = $1
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(patch.bio)
        .bind(patch.website)
        .bind(patch.twitter)
        .bind(patch.github)
        .bind(patch.linkedin)
        .bind(patch.profile_image)
        .fetch_optional(&self.db)
        .await?;
        Ok(user)
    }
}

/// In-memory implementation of `UserRepo` for development and testing.
#[derive(Default)]
pub struct InMemoryUserRepo {
    users: Mutex<Vec<User>>,
}

impl InMemoryUserRepo {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn user_count(&self) -> usize {
        self.users.lock().unwrap().len()
    }
}

#[async_trait]
impl UserRepo for InMemoryUserRepo {
    async fn find_by_email(&self, email: &str) -> AppResult<Option<User>> {
        let users = self.users.lock().unwrap();
        Ok(users.iter().find(|u| u.email == email).cloned())
    }

    async fn find_by_id(&self, id: i64) -> AppResult<Option<User>> {
        let users = self.users.lock().unwrap();
        Ok(users.iter().find(|u| u.id == id).cloned())
    }

    async fn create(&self, new: NewUser) -> AppResult<User> {
        let mut users = self.users.lock().unwrap();
        if users.iter().any(|u| u.email == new.email) {
            return Err(email_taken());
        }
        let user = User {
            id: users.iter().map(|u| u.id).max().unwrap_or(0) + 1,
            email: new.email,
            password_hash: new.password_hash,
            name: new.name,
            bio: None,
            website: None,
            twitter: None,
            github: None,
            linkedin: None,
            profile_image: None,
            created_at: OffsetDateTime::now_utc(),
        };
        debug!(user_id = user.id, "user stored in memory");
        users.push(user.clone());
        Ok(user)
    }

    async fn update_profile(&self, id: i64, patch: ProfilePatch) -> AppResult<Option<User>> {
        let mut users = self.users.lock().unwrap();
        let Some(user) = users.iter_mut().find(|u| u.id == id) else {
            return Ok(None);
        };
        patch.apply(user);
        Ok(Some(user.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_user(email: &str) -> NewUser {
        NewUser {
            email: email.into(),
            name: "A".into(),
            password_hash: "hash".into(),
        }
    }

    #[tokio::test]
    async fn duplicate_email_is_a_conflict_and_stores_nothing() {
        let repo = InMemoryUserRepo::new();
        repo.create(new_user("a@x.com")).await.unwrap();
        let err = repo.create(new_user("a@x.com")).await.unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));
        assert_eq!(repo.user_count(), 1);
    }

    #[tokio::test]
    async fn profile_patch_only_touches_given_fields() {
        let repo = InMemoryUserRepo::new();
        let user = repo.create(new_user("a@x.com")).await.unwrap();
        repo.update_profile(
            user.id,
            ProfilePatch {
                bio: Some("hello".into()),
                github: Some("octo".into()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
        let updated = repo
            .update_profile(
                user.id,
                ProfilePatch {
                    website: Some("https://a.dev".into()),
                    ..Default::default()
                },
            )
            .await
            .unwrap()
            .unwrap();
        assert_eq!(updated.bio.as_deref(), Some("hello"));
        assert_eq!(updated.github.as_deref(), Some("octo"));
        assert_eq!(updated.website.as_deref(), Some("https://a.dev"));
        assert_eq!(updated.twitter, None);
    }

    #[tokio::test]
    async fn update_of_missing_user_is_none() {
        let repo = InMemoryUserRepo::new();
        let res = repo.update_profile(42, ProfilePatch::default()).await.unwrap();
        assert!(res.is_none());
    }
}
