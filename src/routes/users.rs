use axum::extract::State;
use axum::Json;
use chrono::Utc;
use diesel::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::auth::CurrentUser;
use crate::error::{AppError, AppResult};
use crate::models::{User, ROLE_EMPLOYER, ROLE_WORKER};
use crate::schema::{restaurants, users};
use crate::state::AppState;

const DASHBOARD_PATH: &str = "/employer/dashboard";

#[derive(Serialize)]
pub struct UserResponse {
    pub id: Uuid,
    pub email: String,
    pub name: Option<String>,
    pub role: Option<String>,
    pub restaurant_id: Option<Uuid>,
    pub job_title: Option<String>,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            email: user.email,
            name: user.name,
            role: user.role,
            restaurant_id: user.restaurant_id,
            job_title: user.job_title,
        }
    }
}

#[derive(Deserialize)]
pub struct UpdateRoleRequest {
    pub role: String,
}

#[derive(Deserialize)]
pub struct OnboardingRequest {
    pub restaurant_id: Uuid,
    pub job_title: String,
}

#[derive(Serialize)]
pub struct DestinationResponse {
    pub destination: &'static str,
}

pub async fn me(CurrentUser(user): CurrentUser) -> Json<UserResponse> {
    Json(UserResponse::from(user))
}

pub async fn update_role(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Json(payload): Json<UpdateRoleRequest>,
) -> AppResult<Json<UserResponse>> {
    if payload.role != ROLE_WORKER && payload.role != ROLE_EMPLOYER {
        return Err(AppError::bad_request("role must be worker or employer"));
    }

    let mut conn = state.db()?;
    diesel::update(users::table.find(user.id))
        .set((
            users::role.eq(&payload.role),
            users::updated_at.eq(Utc::now().naive_utc()),
        ))
        .execute(&mut conn)?;

    let updated: User = users::table.find(user.id).first(&mut conn)?;
    Ok(Json(UserResponse::from(updated)))
}

/// Final employer onboarding step: ties the account to a restaurant and
/// records the caller's job title there.
pub async fn complete_onboarding(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Json(payload): Json<OnboardingRequest>,
) -> AppResult<Json<UserResponse>> {
    let job_title = payload.job_title.trim();
    if job_title.is_empty() {
        return Err(AppError::bad_request("job title is required"));
    }

    let mut conn = state.db()?;
    let restaurant_exists = restaurants::table
        .find(payload.restaurant_id)
        .select(restaurants::id)
        .first::<Uuid>(&mut conn)
        .optional()?;
    if restaurant_exists.is_none() {
        return Err(AppError::bad_request("unknown restaurant"));
    }

    diesel::update(users::table.find(user.id))
        .set((
            users::restaurant_id.eq(payload.restaurant_id),
            users::job_title.eq(job_title),
            users::updated_at.eq(Utc::now().naive_utc()),
        ))
        .execute(&mut conn)?;

    let updated: User = users::table.find(user.id).first(&mut conn)?;
    state.revalidator.revalidate_path(DASHBOARD_PATH);

    Ok(Json(UserResponse::from(updated)))
}

pub async fn destination(CurrentUser(user): CurrentUser) -> Json<DestinationResponse> {
    Json(DestinationResponse {
        destination: resolve_destination(&user),
    })
}

/// The single source of truth for post-sign-in routing. Every role state maps
/// to exactly one route.
pub fn resolve_destination(user: &User) -> &'static str {
    match user.role.as_deref() {
        None => "/onboarding",
        Some(ROLE_EMPLOYER) if user.restaurant_id.is_none() => "/employer/onboarding",
        Some(ROLE_EMPLOYER) => "/employer/dashboard",
        Some(_) => "/browse",
    }
}
