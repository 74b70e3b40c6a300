use axum::{extract::State, routing::post, Json, Router};
use axum_extra::extract::{CookieJar, WithRejection};
use lazy_static::lazy_static;
use regex::Regex;
use tracing::{info, instrument, warn};

use super::{
    cookie::{removal_cookie, session_cookie},
    dto::{LoginRequest, MessageResponse, SignupRequest},
    password::{hash_password, verify_password},
};
use crate::{
    error::{AppError, AppResult},
    state::AppState,
    users::{dto::PublicUser, repo_types::NewUser},
};

pub(crate) fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/signup", post(signup))
        .route("/login", post(login))
        .route("/logout", post(logout))
}

#[instrument(skip(state, payload))]
pub async fn signup(
    State(state): State<AppState>,
    WithRejection(Json(payload), _): WithRejection<Json<SignupRequest>, AppError>,
) -> AppResult<Json<PublicUser>> {
    let email = normalize_email(&payload.email);
    if !is_valid_email(&email) {
        warn!(%email, "invalid email");
        return Err(AppError::Validation("Invalid email".into()));
    }
    let name = payload.name.trim();
    if name.is_empty() {
        return Err(AppError::Validation("Name is required".into()));
    }
    if payload.password.is_empty() {
        return Err(AppError::Validation("Password is required".into()));
    }

    if state.users.find_by_email(&email).await?.is_some() {
        warn!(%email, "email already registered");
        return Err(AppError::Conflict("Email already registered".into()));
    }

    let user = state
        .users
        .create(NewUser {
            email,
            name: name.to_string(),
            password_hash: hash_password(&payload.password)?,
        })
        .await?;

    info!(user_id = user.id, email = %user.email, "user registered");
    Ok(Json(user.into()))
}

#[instrument(skip(state, jar, payload))]
pub async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    WithRejection(Json(payload), _): WithRejection<Json<LoginRequest>, AppError>,
) -> AppResult<(CookieJar, Json<MessageResponse>)> {
    let email = normalize_email(&payload.email);

    let Some(user) = state.users.find_by_email(&email).await? else {
        warn!(%email, "login unknown email");
        return Err(AppError::InvalidCredentials);
    };

    if !verify_password(&payload.password, &user.password_hash)? {
        warn!(%email, user_id = user.id, "login invalid password");
        return Err(AppError::InvalidCredentials);
    }

    let token = state.jwt.sign(user.id)?;
    let cookie = session_cookie(token, state.jwt.ttl(), state.config.cookie_secure);

    info!(user_id = user.id, "user logged in");
    Ok((jar.add(cookie), Json(MessageResponse::new("Login successful"))))
}

#[instrument(skip(state, jar))]
pub async fn logout(
    State(state): State<AppState>,
    jar: CookieJar,
) -> (CookieJar, Json<MessageResponse>) {
    // the token stays valid until exp; only the client copy is dropped
    (
        jar.add(removal_cookie(state.config.cookie_secure)),
        Json(MessageResponse::new("Logged out")),
    )
}
