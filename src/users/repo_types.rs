use sqlx::FromRow;
use time::OffsetDateTime;

/// User record in the database.
#[derive(Debug, Clone, FromRow)]
pub struct User {
    pub id: i64,
    pub email: String,
    pub password_hash: String, // argon2 PHC string
    pub name: String,
    pub bio: Option<String>,
    pub website: Option<String>,
    pub twitter: Option<String>,
    pub github: Option<String>,
    pub linkedin: Option<String>,
    pub profile_image: Option<String>,
    pub created_at: OffsetDateTime,
}

#[derive(Debug, Clone)]
pub struct NewUser {
    pub email: String,
    pub name: String,
    pub password_hash: String,
}

/// Profile fields to overwrite; `None` leaves the stored value alone.
#[derive(Debug, Clone, Default)]
pub struct ProfilePatch {
    pub bio: Option<String>,
    pub website: Option<String>,
    pub twitter: Option<String>,
    pub github: Option<String>,
    pub linkedin: Option<String>,
    pub profile_image: Option<String>,
}

impl ProfilePatch {
    pub fn apply(self, user: &mut User) {
        if let Some(v) = self.bio {
            user.bio = Some(v);
        }
        if let Some(v) = self.website {
            user.website = Some(v);
        }
        if let Some(v) = self.twitter {
            user.twitter = Some(v);
        }
        if let Some(v) = self.github {
            user.github = Some(v);
        }
        if let Some(v) = self.linkedin {
            user.linkedin = Some(v);
        }
        if let Some(v) = self.profile_image {
            user.profile_image = Some(v);
        }
    }
}
