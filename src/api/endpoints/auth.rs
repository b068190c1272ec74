//! `POST /api/auth/register` and `POST /api/auth/login` — account creation
//! and bearer-token issuance. The plaintext token is returned exactly once.

use std::str::FromStr;

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::api::error::ApiError;
use crate::api::types::{generate_token, hash_password, hash_token, verify_password, ApiContext};
use crate::db::repository::{get_user_by_username, insert_auth_token, insert_user};
use crate::models::enums::Role;
use crate::models::User;

#[derive(Deserialize)]
pub struct RegisterRequest {
    pub username: String,
    pub password: String,
    /// patient (default), doctor, lab, or admin.
    pub role: Option<String>,
}

#[derive(Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Serialize)]
pub struct UserView {
    pub id: Uuid,
    pub username: String,
    pub role: String,
}

#[derive(Serialize)]
pub struct AuthResponse {
    pub user: UserView,
    pub token: String,
}

pub async fn register(
    State(ctx): State<ApiContext>,
    Json(req): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<AuthResponse>), ApiError> {
    let username = req.username.trim().to_string();
    if username.is_empty() {
        return Err(ApiError::BadRequest("Username is required.".into()));
    }
    if req.password.len() < 8 {
        return Err(ApiError::BadRequest(
            "Password must be at least 8 characters.".into(),
        ));
    }
    let role = match req.role.as_deref() {
        None => Role::Patient,
        Some(raw) => Role::from_str(raw)
            .map_err(|_| ApiError::BadRequest(format!("Unknown role: {raw}")))?,
    };

    let response = tokio::task::spawn_blocking(move || -> Result<AuthResponse, ApiError> {
        let conn = ctx.open_db()?;
        if get_user_by_username(&conn, &username)?.is_some() {
            return Err(ApiError::BadRequest("Username already taken.".into()));
        }

        let user = User {
            id: Uuid::new_v4(),
            username,
            password_hash: hash_password(&req.password),
            role,
            created_at: Utc::now(),
        };
        insert_user(&conn, &user)?;

        let token = generate_token();
        insert_auth_token(&conn, &hash_token(&token), &user.id)?;
        Ok(AuthResponse {
            user: user_view(&user),
            token,
        })
    })
    .await
    .map_err(|e| ApiError::Internal(e.to_string()))??;

    Ok((StatusCode::CREATED, Json(response)))
}

pub async fn login(
    State(ctx): State<ApiContext>,
    Json(req): Json<LoginRequest>,
) -> Result<Json<AuthResponse>, ApiError> {
    let response = tokio::task::spawn_blocking(move || -> Result<AuthResponse, ApiError> {
        let conn = ctx.open_db()?;
        let user = get_user_by_username(&conn, req.username.trim())?
            .ok_or(ApiError::Unauthorized)?;
        if !verify_password(&req.password, &user.password_hash) {
            return Err(ApiError::Unauthorized);
        }

        let token = generate_token();
        insert_auth_token(&conn, &hash_token(&token), &user.id)?;
        Ok(AuthResponse {
            user: user_view(&user),
            token,
        })
    })
    .await
    .map_err(|e| ApiError::Internal(e.to_string()))??;

    Ok(Json(response))
}

fn user_view(user: &User) -> UserView {
    UserView {
        id: user.id,
        username: user.username.clone(),
        role: user.role.as_str().to_string(),
    }
}
