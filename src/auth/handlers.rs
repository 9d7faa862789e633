use axum::{extract::State, Json};
use tracing::{info, instrument, warn};

use crate::{
    error::AppError,
    scope::{Scope, UserScope},
    state::{Accounts, AppState},
};

use super::{
    dto::{AuthResponse, LoginRequest, PublicUser, RefreshRequest, RegisterRequest},
    password::{hash_password, is_valid_email, verify_password},
    repo::User,
};

/// Account routes are only mounted with the Postgres backend, so a missing
/// context here is a wiring bug, not a client error.
fn accounts(state: &AppState) -> Result<&Accounts, AppError> {
    state
        .accounts
        .as_ref()
        .ok_or_else(|| AppError::Internal(anyhow::anyhow!("accounts requested without backend")))
}

fn token_pair(accounts: &Accounts, user: User) -> Result<AuthResponse, AppError> {
    let access_token = accounts.keys.sign_access(user.id)?;
    let refresh_token = accounts.keys.sign_refresh(user.id)?;
    Ok(AuthResponse {
        access_token,
        refresh_token,
        user: PublicUser {
            id: user.id,
            email: user.email,
        },
    })
}

#[instrument(skip(state, payload))]
pub async fn register(
    State(state): State<AppState>,
    Json(mut payload): Json<RegisterRequest>,
) -> Result<Json<AuthResponse>, AppError> {
    let accounts = accounts(&state)?;
    payload.email = payload.email.trim().to_lowercase();

    if !is_valid_email(&payload.email) {
        warn!(email = %payload.email, "invalid email");
        return Err(AppError::invalid("Invalid email"));
    }
    if payload.password.len() < 8 {
        warn!("password too short");
        return Err(AppError::invalid("Password too short"));
    }

    if User::find_by_email(&accounts.db, &payload.email).await?.is_some() {
        warn!(email = %payload.email, "email already registered");
        return Err(AppError::conflict("Email already registered"));
    }

    let hash = hash_password(&payload.password)?;
    let user = User::create(&accounts.db, &payload.email, &hash).await?;

    info!(user_id = %user.id, email = %user.email, "user registered");
    Ok(Json(token_pair(accounts, user)?))
}

#[instrument(skip(state, payload))]
pub async fn login(
    State(state): State<AppState>,
    Json(mut payload): Json<LoginRequest>,
) -> Result<Json<AuthResponse>, AppError> {
    let accounts = accounts(&state)?;
    payload.email = payload.email.trim().to_lowercase();

    if !is_valid_email(&payload.email) {
        warn!(email = %payload.email, "invalid email");
        return Err(AppError::invalid("Invalid email"));
    }

    let Some(user) = User::find_by_email(&accounts.db, &payload.email).await? else {
        warn!(email = %payload.email, "login unknown email");
        return Err(AppError::unauthorized("Invalid credentials"));
    };

    if !verify_password(&payload.password, &user.password_hash)? {
        warn!(email = %payload.email, user_id = %user.id, "login invalid password");
        return Err(AppError::unauthorized("Invalid credentials"));
    }

    info!(user_id = %user.id, email = %user.email, "user logged in");
    Ok(Json(token_pair(accounts, user)?))
}

#[instrument(skip(state, payload))]
pub async fn refresh(
    State(state): State<AppState>,
    Json(payload): Json<RefreshRequest>,
) -> Result<Json<AuthResponse>, AppError> {
    let accounts = accounts(&state)?;

    let claims = accounts
        .keys
        .verify_refresh(&payload.refresh_token)
        .map_err(|e| AppError::unauthorized(e.to_string()))?;

    let Some(user) = User::find_by_id(&accounts.db, claims.sub).await? else {
        return Err(AppError::unauthorized("User not found"));
    };

    Ok(Json(token_pair(accounts, user)?))
}

#[instrument(skip(state))]
pub async fn me(
    State(state): State<AppState>,
    Scope(scope): Scope,
) -> Result<Json<PublicUser>, AppError> {
    let accounts = accounts(&state)?;
    let UserScope::User(user_id) = scope else {
        return Err(AppError::unauthorized("Access token required"));
    };

    let Some(user) = User::find_by_id(&accounts.db, user_id).await? else {
        return Err(AppError::unauthorized("User not found"));
    };

    Ok(Json(PublicUser {
        id: user.id,
        email: user.email,
    }))
}
