//! Registration and login endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::State;
use axum::extract::rejection::JsonRejection;
use chrono::{DateTime, Utc};
use common::UserId;
use serde::{Deserialize, Serialize};
use store::{Store, User};

use crate::AppState;
use crate::error::ApiError;
use crate::response::Success;

// -- Request types --

#[derive(Deserialize)]
pub struct CredentialsRequest {
    pub email: String,
    pub password: String,
}

// -- Response types --

#[derive(Serialize)]
pub struct UserResponse {
    pub id: UserId,
    pub email: String,
    pub is_admin: bool,
    pub created_at: DateTime<Utc>,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            email: user.email,
            is_admin: user.is_admin,
            created_at: user.created_at,
        }
    }
}

#[derive(Serialize)]
pub struct LoginResponse {
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

// -- Handlers --

/// POST /register: create an account.
#[tracing::instrument(skip_all)]
pub async fn register<S: Store + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    body: Result<Json<CredentialsRequest>, JsonRejection>,
) -> Result<Success<UserResponse>, ApiError> {
    let Json(req) = body?;
    let user = state.identity.register(&req.email, &req.password).await?;

    Ok(Success::ok("User registered successfully", user.into()))
}

/// POST /login: exchange credentials for a session token.
#[tracing::instrument(skip_all)]
pub async fn login<S: Store + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    body: Result<Json<CredentialsRequest>, JsonRejection>,
) -> Result<Success<LoginResponse>, ApiError> {
    let Json(req) = body?;
    let issued = state.identity.login(&req.email, &req.password).await?;

    Ok(Success::ok(
        "Login successful",
        LoginResponse {
            token: issued.token,
            expires_at: issued.expires_at,
        },
    ))
}
