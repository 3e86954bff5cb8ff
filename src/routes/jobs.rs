use std::collections::{HashMap, HashSet};

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::NaiveDateTime;
use diesel::dsl::count_star;
use diesel::pg::Pg;
use diesel::result::DatabaseErrorKind;
use diesel::sql_types::Bool;
use diesel::{prelude::*, BoxableExpression, PgConnection};
use serde::{Deserialize, Serialize};
use tracing::error;
use uuid::Uuid;

use crate::auth::{CurrentUser, OptionalUser};
use crate::error::{AppError, AppResult};
use crate::filters::{
    escape_like, matches_free_text, title_matches_any_position, FilterState, POSITION_OPTIONS,
    SEARCH_DEBOUNCE_MS,
};
use crate::models::{Job, NewSavedJob, Restaurant, JOB_STATUS_ACTIVE};
use crate::schema::{jobs, restaurants, saved_jobs};
use crate::state::AppState;

pub const TAB_ALL: &str = "all";
pub const TAB_SAVED: &str = "saved";

#[derive(Deserialize)]
pub struct BrowseQuery {
    pub search: Option<String>,
    pub position: Option<String>,
    pub neighborhood: Option<String>,
    pub restaurant: Option<String>,
    pub tab: Option<String>,
}

#[derive(Serialize)]
pub struct RestaurantSummary {
    pub id: Uuid,
    pub name: String,
    pub neighborhood: Option<String>,
    pub cuisine_type: Option<String>,
    pub rating_pay: Option<f64>,
    pub rating_culture: Option<f64>,
    pub rating_management: Option<f64>,
    pub rating_worklife: Option<f64>,
    pub review_count: i32,
}

impl From<Restaurant> for RestaurantSummary {
    fn from(restaurant: Restaurant) -> Self {
        Self {
            id: restaurant.id,
            name: restaurant.name,
            neighborhood: restaurant.neighborhood,
            cuisine_type: restaurant.cuisine_type,
            rating_pay: restaurant.rating_pay,
            rating_culture: restaurant.rating_culture,
            rating_management: restaurant.rating_management,
            rating_worklife: restaurant.rating_worklife,
            review_count: restaurant.review_count,
        }
    }
}

#[derive(Serialize)]
pub struct JobCardResponse {
    pub id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub pay_range: Option<String>,
    pub employment_type: Option<String>,
    pub benefits: Option<Vec<String>>,
    pub status: String,
    pub posted_date: Option<NaiveDateTime>,
    pub application_type: String,
    pub source_url: Option<String>,
    pub restaurant: RestaurantSummary,
    /// Active postings at the same restaurant, counted from the store rather
    /// than the (possibly filtered) result page.
    pub restaurant_job_count: i64,
    pub is_saved: bool,
}

#[derive(Serialize)]
pub struct JobDetailResponse {
    pub job: JobCardResponse,
    pub requirements: Option<String>,
    pub schedule_details: Option<String>,
}

#[derive(Serialize)]
pub struct FilterOptionsResponse {
    pub neighborhoods: Vec<String>,
    pub positions: Vec<&'static str>,
    pub search_debounce_ms: u64,
}

/// Browse listing. Filtering never surfaces a hard error: any store failure
/// is logged and the caller sees an empty list.
pub async fn list_jobs(
    State(state): State<AppState>,
    Query(params): Query<BrowseQuery>,
    OptionalUser(user): OptionalUser,
) -> AppResult<Json<Vec<JobCardResponse>>> {
    let tab = params.tab.as_deref().unwrap_or(TAB_ALL);

    if tab == TAB_SAVED {
        let user = user.ok_or_else(AppError::sign_up_required)?;
        let mut conn = state.db()?;
        let rows = match fetch_saved_jobs(&mut conn, user.id) {
            Ok(rows) => rows,
            Err(err) => {
                error!(error = ?err, "failed to load saved jobs");
                Vec::new()
            }
        };
        let cards = build_job_cards(&mut conn, rows, None)
            .into_iter()
            // Everything on the saved tab is saved by definition.
            .map(|mut card| {
                card.is_saved = true;
                card
            })
            .collect();
        return Ok(Json(cards));
    }

    let filter = FilterState::from_params(
        params.search.as_deref(),
        params.position.as_deref(),
        params.neighborhood.as_deref(),
        params.restaurant.as_deref(),
    );

    let mut conn = state.db()?;
    let rows = match fetch_filtered_jobs(&mut conn, &filter) {
        Ok(rows) => rows,
        Err(err) => {
            error!(error = ?err, "job filter query failed");
            Vec::new()
        }
    };

    let saved_ids = match user {
        Some(user) => match saved_job_ids(&mut conn, user.id) {
            Ok(ids) => ids,
            Err(err) => {
                error!(error = ?err, "saved-job lookup failed, rendering unbookmarked");
                HashSet::new()
            }
        },
        None => HashSet::new(),
    };

    let cards = build_job_cards(&mut conn, rows, Some(&saved_ids));
    Ok(Json(cards))
}

pub async fn get_job(
    State(state): State<AppState>,
    Path(job_id): Path<Uuid>,
    OptionalUser(user): OptionalUser,
) -> AppResult<Json<JobDetailResponse>> {
    let mut conn = state.db()?;

    let job: Job = jobs::table.find(job_id).first(&mut conn)?;
    let restaurant: Restaurant = restaurants::table
        .find(job.restaurant_id)
        .first(&mut conn)?;

    let counts = active_job_counts(&mut conn, &[restaurant.id]);
    let is_saved = match user {
        Some(user) => match saved_job_ids(&mut conn, user.id) {
            Ok(ids) => ids.contains(&job.id),
            Err(err) => {
                error!(error = ?err, "saved-job lookup failed, rendering unbookmarked");
                false
            }
        },
        None => false,
    };

    let requirements = job.requirements.clone();
    let schedule_details = job.schedule_details.clone();
    let count = counts.get(&restaurant.id).copied().unwrap_or(0);

    Ok(Json(JobDetailResponse {
        job: job_card(job, restaurant, count, is_saved),
        requirements,
        schedule_details,
    }))
}

/// Options driving the browse filter UI, including the debounce interval the
/// client applies to the free-text input.
pub async fn filter_options(
    State(state): State<AppState>,
) -> AppResult<Json<FilterOptionsResponse>> {
    let mut conn = state.db()?;

    let rows: Vec<Option<String>> = restaurants::table
        .filter(restaurants::neighborhood.is_not_null())
        .select(restaurants::neighborhood)
        .distinct()
        .load(&mut conn)
        .unwrap_or_else(|err| {
            error!(error = %err, "neighborhood listing failed");
            Vec::new()
        });

    let mut neighborhoods: Vec<String> = rows.into_iter().flatten().collect();
    neighborhoods.sort();

    Ok(Json(FilterOptionsResponse {
        neighborhoods,
        positions: POSITION_OPTIONS.to_vec(),
        search_debounce_ms: SEARCH_DEBOUNCE_MS,
    }))
}

/// Bookmarks a job for the caller. Saving an already-saved job is success:
/// the intended postcondition already holds.
pub async fn save_job(
    State(state): State<AppState>,
    Path(job_id): Path<Uuid>,
    CurrentUser(user): CurrentUser,
) -> AppResult<StatusCode> {
    let mut conn = state.db()?;

    let exists: i64 = jobs::table
        .filter(jobs::id.eq(job_id))
        .select(count_star())
        .first(&mut conn)?;
    if exists == 0 {
        return Err(AppError::not_found());
    }

    let relation = NewSavedJob {
        user_id: user.id,
        job_id,
    };

    match diesel::insert_into(saved_jobs::table)
        .values(&relation)
        .execute(&mut conn)
    {
        Ok(_) => {}
        Err(diesel::result::Error::DatabaseError(DatabaseErrorKind::UniqueViolation, _)) => {}
        Err(err) => return Err(AppError::from(err)),
    }

    Ok(StatusCode::NO_CONTENT)
}

/// Removes the bookmark; removing a bookmark that does not exist is a no-op
/// success.
pub async fn unsave_job(
    State(state): State<AppState>,
    Path(job_id): Path<Uuid>,
    CurrentUser(user): CurrentUser,
) -> AppResult<StatusCode> {
    let mut conn = state.db()?;

    diesel::delete(
        saved_jobs::table
            .filter(saved_jobs::user_id.eq(user.id))
            .filter(saved_jobs::job_id.eq(job_id)),
    )
    .execute(&mut conn)?;

    Ok(StatusCode::NO_CONTENT)
}

/// Resolves a filter request to the final ordered job list: restaurant scope
/// first, then the store-level job query, then the in-process refinements the
/// store query cannot express.
fn fetch_filtered_jobs(
    conn: &mut PgConnection,
    filter: &FilterState,
) -> AppResult<Vec<(Job, Restaurant)>> {
    let restaurant_scope = resolve_restaurant_scope(conn, filter)?;
    let scope_ids = match restaurant_scope {
        RestaurantScope::Unscoped => None,
        RestaurantScope::Ids(ids) if ids.is_empty() => return Ok(Vec::new()),
        RestaurantScope::Ids(ids) => Some(ids),
    };

    let mut query = jobs::table
        .filter(jobs::status.eq(JOB_STATUS_ACTIVE))
        .into_boxed();

    if let Some(ids) = scope_ids {
        query = query.filter(jobs::restaurant_id.eq_any(ids));
    }

    // OR across the selected positions, matched as escaped substrings of the
    // title.
    let mut position_predicate: Option<Box<dyn BoxableExpression<jobs::table, Pg, SqlType = Bool>>> =
        None;
    for position in &filter.positions {
        let pattern = format!("%{}%", escape_like(position));
        let clause = jobs::title.ilike(pattern);
        position_predicate = Some(match position_predicate {
            Some(existing) => Box::new(existing.or(clause)),
            None => Box::new(clause),
        });
    }
    if let Some(predicate) = position_predicate {
        query = query.filter(predicate);
    }

    let matched: Vec<Job> = query
        .order(jobs::posted_date.desc().nulls_last())
        .load(conn)?;

    let restaurant_ids: Vec<Uuid> = matched.iter().map(|job| job.restaurant_id).collect();
    let restaurant_map: HashMap<Uuid, Restaurant> = restaurants::table
        .filter(restaurants::id.eq_any(restaurant_ids))
        .load::<Restaurant>(conn)?
        .into_iter()
        .map(|restaurant| (restaurant.id, restaurant))
        .collect();

    let mut rows: Vec<(Job, Restaurant)> = matched
        .into_iter()
        .filter_map(|job| {
            restaurant_map
                .get(&job.restaurant_id)
                .cloned()
                .map(|restaurant| (job, restaurant))
        })
        .collect();

    // The free-text scan has to reach the joined restaurant name, which the
    // store-level OR cannot combine with the position filter under AND
    // semantics, so it runs here.
    if let Some(search) = &filter.search {
        rows.retain(|(job, restaurant)| {
            let text_match = matches_free_text(
                search,
                &job.title,
                job.description.as_deref(),
                &restaurant.name,
            );
            if filter.positions.is_empty() {
                text_match
            } else {
                text_match && title_matches_any_position(&job.title, &filter.positions)
            }
        });
    } else if !filter.positions.is_empty() {
        // Safety net in case the store-level OR over-matched.
        rows.retain(|(job, _)| title_matches_any_position(&job.title, &filter.positions));
    }

    if let Some(name) = &filter.restaurant {
        let needle = name.to_lowercase();
        rows.retain(|(_, restaurant)| restaurant.name.to_lowercase().contains(&needle));
    }

    // The OR-based store query can return a row once per matching branch.
    let mut seen = HashSet::new();
    rows.retain(|(job, _)| seen.insert(job.id));

    Ok(rows)
}

enum RestaurantScope {
    Unscoped,
    Ids(Vec<Uuid>),
}

fn resolve_restaurant_scope(
    conn: &mut PgConnection,
    filter: &FilterState,
) -> AppResult<RestaurantScope> {
    if filter.neighborhood.is_none() && filter.restaurant.is_none() {
        return Ok(RestaurantScope::Unscoped);
    }

    let mut query = restaurants::table.into_boxed();
    if let Some(neighborhood) = &filter.neighborhood {
        query = query.filter(restaurants::neighborhood.eq(neighborhood.clone()));
    }
    if let Some(name) = &filter.restaurant {
        let pattern = format!("%{}%", escape_like(name));
        query = query.filter(
            restaurants::name
                .ilike(pattern)
                .or(restaurants::name.eq(name.clone())),
        );
    }

    let ids: Vec<Uuid> = query.select(restaurants::id).load(conn)?;
    Ok(RestaurantScope::Ids(ids))
}

fn fetch_saved_jobs(conn: &mut PgConnection, user_id: Uuid) -> AppResult<Vec<(Job, Restaurant)>> {
    let job_ids: Vec<Uuid> = saved_jobs::table
        .filter(saved_jobs::user_id.eq(user_id))
        .select(saved_jobs::job_id)
        .load(conn)?;

    if job_ids.is_empty() {
        return Ok(Vec::new());
    }

    let rows: Vec<(Job, Restaurant)> = jobs::table
        .inner_join(restaurants::table)
        .filter(jobs::id.eq_any(job_ids))
        .filter(jobs::status.eq(JOB_STATUS_ACTIVE))
        .order(jobs::posted_date.desc().nulls_last())
        .load(conn)?;

    Ok(rows)
}

fn saved_job_ids(conn: &mut PgConnection, user_id: Uuid) -> AppResult<HashSet<Uuid>> {
    let ids: Vec<Uuid> = saved_jobs::table
        .filter(saved_jobs::user_id.eq(user_id))
        .select(saved_jobs::job_id)
        .load(conn)?;
    Ok(ids.into_iter().collect())
}

/// Per-restaurant count of currently-active postings, straight from the
/// store so a filtered page never undercounts. A failed count degrades to
/// zero rather than failing the page.
pub fn active_job_counts(
    conn: &mut PgConnection,
    restaurant_ids: &[Uuid],
) -> HashMap<Uuid, i64> {
    if restaurant_ids.is_empty() {
        return HashMap::new();
    }

    let result: Result<Vec<(Uuid, i64)>, _> = jobs::table
        .filter(jobs::restaurant_id.eq_any(restaurant_ids.to_vec()))
        .filter(jobs::status.eq(JOB_STATUS_ACTIVE))
        .group_by(jobs::restaurant_id)
        .select((jobs::restaurant_id, count_star()))
        .load(conn);

    match result {
        Ok(rows) => rows.into_iter().collect(),
        Err(err) => {
            error!(error = %err, "active job count failed");
            HashMap::new()
        }
    }
}

fn build_job_cards(
    conn: &mut PgConnection,
    rows: Vec<(Job, Restaurant)>,
    saved_ids: Option<&HashSet<Uuid>>,
) -> Vec<JobCardResponse> {
    let restaurant_ids: Vec<Uuid> = rows
        .iter()
        .map(|(_, restaurant)| restaurant.id)
        .collect::<HashSet<_>>()
        .into_iter()
        .collect();
    let counts = active_job_counts(conn, &restaurant_ids);

    rows.into_iter()
        .map(|(job, restaurant)| {
            let count = counts.get(&restaurant.id).copied().unwrap_or(0);
            let is_saved = saved_ids.map(|set| set.contains(&job.id)).unwrap_or(false);
            job_card(job, restaurant, count, is_saved)
        })
        .collect()
}

fn job_card(job: Job, restaurant: Restaurant, count: i64, is_saved: bool) -> JobCardResponse {
    JobCardResponse {
        id: job.id,
        title: job.title,
        description: job.description,
        pay_range: job.pay_range,
        employment_type: job.employment_type,
        benefits: job.benefits,
        status: job.status,
        posted_date: job.posted_date,
        application_type: job.application_type,
        source_url: job.source_url,
        restaurant: RestaurantSummary::from(restaurant),
        restaurant_job_count: count,
        is_saved,
    }
}
