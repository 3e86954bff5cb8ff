use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::Utc;
use diesel::{prelude::*, PgConnection};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::auth::CurrentUser;
use crate::error::{AppError, AppResult};
use crate::models::{
    Job, NewJob, APPLICATION_TYPE_EXTERNAL, APPLICATION_TYPE_INTERNAL, JOB_STATUSES,
    JOB_STATUS_ACTIVE, JOB_STATUS_FILLED,
};
use crate::pay::{build_pay_details, PayStructure};
use crate::schema::{jobs, restaurants};
use crate::state::AppState;

const DESCRIPTION_MIN_CHARS: usize = 50;
const DESCRIPTION_MAX_CHARS: usize = 2000;
const REQUIREMENTS_MAX_CHARS: usize = 1000;
const SCHEDULE_MAX_CHARS: usize = 500;

const JOBS_DASHBOARD_PATH: &str = "/employer/dashboard/jobs";

#[derive(Deserialize)]
pub struct CreateJobRequest {
    pub title: String,
    pub employment_type: String,
    pub description: String,
    pub requirements: Option<String>,
    pub pay_structure: PayStructure,
    pub pay_min: Option<f64>,
    pub pay_max: Option<f64>,
    pub base_hourly: Option<f64>,
    pub estimated_tips: Option<f64>,
    pub schedule_details: Option<String>,
    #[serde(default)]
    pub benefits: Vec<String>,
    pub application_type: String,
    pub source_url: Option<String>,
}

#[derive(Deserialize)]
pub struct EmployerJobsQuery {
    pub status: Option<String>,
}

#[derive(Deserialize)]
pub struct UpdateStatusRequest {
    pub status: String,
}

#[derive(Serialize)]
pub struct EmployerJobResponse {
    pub id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub pay_range: Option<String>,
    pub status: String,
    pub employment_type: Option<String>,
    pub application_type: String,
    pub source_url: Option<String>,
    pub posted_date: Option<chrono::NaiveDateTime>,
    pub created_at: chrono::NaiveDateTime,
}

impl From<Job> for EmployerJobResponse {
    fn from(job: Job) -> Self {
        Self {
            id: job.id,
            title: job.title,
            description: job.description,
            pay_range: job.pay_range,
            status: job.status,
            employment_type: job.employment_type,
            application_type: job.application_type,
            source_url: job.source_url,
            posted_date: job.posted_date,
            created_at: job.created_at,
        }
    }
}

#[derive(Serialize)]
pub struct DashboardResponse {
    pub user: DashboardUser,
    pub restaurant: Option<DashboardRestaurant>,
    pub stats: Option<DashboardStats>,
}

#[derive(Serialize)]
pub struct DashboardUser {
    pub name: Option<String>,
    pub role: Option<String>,
    pub restaurant_id: Option<Uuid>,
    pub job_title: Option<String>,
}

#[derive(Serialize)]
pub struct DashboardRestaurant {
    pub id: Uuid,
    pub name: String,
}

#[derive(Serialize)]
pub struct DashboardStats {
    pub active_jobs: i64,
    pub jobs_filled: i64,
}

/// Dashboard summary. Callers who have not finished onboarding get their
/// user snapshot with no restaurant or stats attached.
pub async fn dashboard(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> AppResult<Json<DashboardResponse>> {
    let dashboard_user = DashboardUser {
        name: user.name.clone(),
        role: user.role.clone(),
        restaurant_id: user.restaurant_id,
        job_title: user.job_title.clone(),
    };

    let Some(restaurant_id) = user.restaurant_id else {
        return Ok(Json(DashboardResponse {
            user: dashboard_user,
            restaurant: None,
            stats: None,
        }));
    };

    let mut conn = state.db()?;
    let restaurant = restaurants::table
        .find(restaurant_id)
        .select((restaurants::id, restaurants::name))
        .first::<(Uuid, String)>(&mut conn)
        .optional()?
        .map(|(id, name)| DashboardRestaurant { id, name });

    let active_jobs: i64 = jobs::table
        .filter(jobs::restaurant_id.eq(restaurant_id))
        .filter(jobs::status.eq(JOB_STATUS_ACTIVE))
        .count()
        .get_result(&mut conn)?;
    let jobs_filled: i64 = jobs::table
        .filter(jobs::restaurant_id.eq(restaurant_id))
        .filter(jobs::status.eq(JOB_STATUS_FILLED))
        .count()
        .get_result(&mut conn)?;

    Ok(Json(DashboardResponse {
        user: dashboard_user,
        restaurant,
        stats: Some(DashboardStats {
            active_jobs,
            jobs_filled,
        }),
    }))
}

pub async fn list_employer_jobs(
    State(state): State<AppState>,
    Query(params): Query<EmployerJobsQuery>,
    CurrentUser(user): CurrentUser,
) -> AppResult<Json<Vec<EmployerJobResponse>>> {
    let Some(restaurant_id) = user.restaurant_id else {
        return Ok(Json(Vec::new()));
    };

    let mut conn = state.db()?;
    let mut query = jobs::table
        .filter(jobs::restaurant_id.eq(restaurant_id))
        .into_boxed();

    if let Some(status) = params.status.as_deref() {
        if !JOB_STATUSES.contains(&status) {
            return Err(AppError::bad_request("unknown job status"));
        }
        query = query.filter(jobs::status.eq(status.to_owned()));
    }

    let rows: Vec<Job> = query.order(jobs::created_at.desc()).load(&mut conn)?;
    Ok(Json(rows.into_iter().map(EmployerJobResponse::from).collect()))
}

pub async fn create_job(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Json(payload): Json<CreateJobRequest>,
) -> AppResult<(StatusCode, Json<EmployerJobResponse>)> {
    let Some(restaurant_id) = user.restaurant_id else {
        return Err(AppError::bad_request(
            "complete employer onboarding before posting jobs",
        ));
    };

    let title = payload.title.trim();
    if title.is_empty() {
        return Err(AppError::bad_request("job title is required"));
    }
    if payload.employment_type.trim().is_empty() {
        return Err(AppError::bad_request("employment type is required"));
    }

    let description = payload.description.trim();
    if description.chars().count() < DESCRIPTION_MIN_CHARS {
        return Err(AppError::bad_request(
            "description must be at least 50 characters",
        ));
    }
    if description.chars().count() > DESCRIPTION_MAX_CHARS {
        return Err(AppError::bad_request(
            "description must not exceed 2000 characters",
        ));
    }
    if let Some(requirements) = payload.requirements.as_deref() {
        if requirements.chars().count() > REQUIREMENTS_MAX_CHARS {
            return Err(AppError::bad_request(
                "requirements must not exceed 1000 characters",
            ));
        }
    }
    if let Some(schedule) = payload.schedule_details.as_deref() {
        if schedule.chars().count() > SCHEDULE_MAX_CHARS {
            return Err(AppError::bad_request(
                "schedule details must not exceed 500 characters",
            ));
        }
    }

    let pay = build_pay_details(
        payload.pay_structure,
        payload.pay_min,
        payload.pay_max,
        payload.base_hourly,
        payload.estimated_tips,
    )
    .map_err(|err| AppError::bad_request(err.to_string()))?;

    let source_url = match payload.application_type.as_str() {
        APPLICATION_TYPE_INTERNAL => None,
        APPLICATION_TYPE_EXTERNAL => {
            let raw = payload
                .source_url
                .as_deref()
                .map(str::trim)
                .filter(|value| !value.is_empty())
                .ok_or_else(|| {
                    AppError::bad_request("external applications require an application URL")
                })?;
            let parsed = url::Url::parse(raw)
                .map_err(|_| AppError::bad_request("application URL must be a valid URL"))?;
            if parsed.scheme() != "http" && parsed.scheme() != "https" {
                return Err(AppError::bad_request("application URL must be a valid URL"));
            }
            Some(raw.to_owned())
        }
        _ => return Err(AppError::bad_request("unknown application type")),
    };

    let benefits: Vec<String> = payload
        .benefits
        .iter()
        .map(|benefit| benefit.trim().to_owned())
        .filter(|benefit| !benefit.is_empty())
        .collect();

    let new_job = NewJob {
        id: Uuid::new_v4(),
        restaurant_id,
        title: title.to_owned(),
        description: Some(description.to_owned()),
        requirements: payload
            .requirements
            .as_deref()
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .map(str::to_owned),
        pay_range: Some(pay.pay_range),
        pay_min: pay.pay_min,
        pay_max: pay.pay_max,
        pay_type: Some(payload.pay_structure.as_str().to_owned()),
        source: "direct".to_owned(),
        source_url,
        status: JOB_STATUS_ACTIVE.to_owned(),
        posted_date: Some(Utc::now().naive_utc()),
        employment_type: Some(payload.employment_type.trim().to_owned()),
        benefits: if benefits.is_empty() {
            None
        } else {
            Some(benefits)
        },
        schedule_details: payload
            .schedule_details
            .as_deref()
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .map(str::to_owned),
        application_type: payload.application_type,
        posted_by: Some(user.id),
    };

    let mut conn = state.db()?;
    diesel::insert_into(jobs::table)
        .values(&new_job)
        .execute(&mut conn)?;

    let job: Job = jobs::table.find(new_job.id).first(&mut conn)?;
    state.revalidator.revalidate_path(JOBS_DASHBOARD_PATH);

    Ok((StatusCode::CREATED, Json(EmployerJobResponse::from(job))))
}

pub async fn update_job_status(
    State(state): State<AppState>,
    Path(job_id): Path<Uuid>,
    CurrentUser(user): CurrentUser,
    Json(payload): Json<UpdateStatusRequest>,
) -> AppResult<Json<EmployerJobResponse>> {
    if !JOB_STATUSES.contains(&payload.status.as_str()) {
        return Err(AppError::bad_request("unknown job status"));
    }

    let mut conn = state.db()?;
    let job = owned_job(&mut conn, job_id, user.restaurant_id)?;

    diesel::update(jobs::table.find(job.id))
        .set((
            jobs::status.eq(&payload.status),
            jobs::updated_at.eq(Utc::now().naive_utc()),
        ))
        .execute(&mut conn)?;

    let updated: Job = jobs::table.find(job.id).first(&mut conn)?;
    state.revalidator.revalidate_path(JOBS_DASHBOARD_PATH);

    Ok(Json(EmployerJobResponse::from(updated)))
}

/// Hard delete; the posting is unrecoverable afterwards.
pub async fn delete_job(
    State(state): State<AppState>,
    Path(job_id): Path<Uuid>,
    CurrentUser(user): CurrentUser,
) -> AppResult<StatusCode> {
    let mut conn = state.db()?;
    let job = owned_job(&mut conn, job_id, user.restaurant_id)?;

    diesel::delete(jobs::table.find(job.id)).execute(&mut conn)?;
    state.revalidator.revalidate_path(JOBS_DASHBOARD_PATH);

    Ok(StatusCode::NO_CONTENT)
}

/// Editing rights are gated solely on the caller's restaurant matching the
/// job's; anything else is a generic rejection.
fn owned_job(
    conn: &mut PgConnection,
    job_id: Uuid,
    restaurant_id: Option<Uuid>,
) -> AppResult<Job> {
    let job: Job = jobs::table
        .find(job_id)
        .first(conn)
        .optional()?
        .ok_or_else(AppError::not_found)?;

    match restaurant_id {
        Some(restaurant_id) if restaurant_id == job.restaurant_id => Ok(job),
        _ => Err(AppError::unauthorized()),
    }
}
