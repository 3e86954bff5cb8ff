use std::collections::HashMap;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use diesel::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::error;
use uuid::Uuid;

use crate::auth::CurrentUser;
use crate::error::{AppError, AppResult};
use crate::filters::escape_like;
use crate::models::{NewRestaurant, Restaurant, Review};
use crate::schema::{restaurants, reviews, users};
use crate::state::AppState;

const SEARCH_MIN_CHARS: usize = 2;
const SEARCH_LIMIT: i64 = 10;

const DEFAULT_CITY: &str = "Los Angeles";

#[derive(Deserialize)]
pub struct SearchQuery {
    pub q: Option<String>,
}

#[derive(Serialize)]
pub struct RestaurantSearchResult {
    pub id: Uuid,
    pub name: String,
    pub neighborhood: Option<String>,
}

#[derive(Deserialize)]
pub struct CreateRestaurantRequest {
    pub name: String,
    pub address: String,
    pub neighborhood: Option<String>,
    pub cuisine_type: Option<String>,
}

#[derive(Serialize)]
pub struct RestaurantResponse {
    pub id: Uuid,
    pub name: String,
    pub address: Option<String>,
    pub city: String,
    pub neighborhood: Option<String>,
    pub cuisine_type: Option<String>,
    pub rating_pay: Option<f64>,
    pub rating_culture: Option<f64>,
    pub rating_management: Option<f64>,
    pub rating_worklife: Option<f64>,
    pub review_count: i32,
}

impl From<Restaurant> for RestaurantResponse {
    fn from(restaurant: Restaurant) -> Self {
        Self {
            id: restaurant.id,
            name: restaurant.name,
            address: restaurant.address,
            city: restaurant.city,
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
pub struct ReviewResponse {
    pub id: Uuid,
    pub position: String,
    pub rating_pay: i32,
    pub rating_culture: i32,
    pub rating_management: i32,
    pub rating_worklife: i32,
    pub pros: Option<String>,
    pub cons: Option<String>,
    /// None for anonymous reviews; the author is never sent to the client.
    pub author: Option<String>,
    pub created_at: chrono::NaiveDateTime,
}

#[derive(Serialize)]
pub struct RestaurantDetailResponse {
    #[serde(flatten)]
    pub restaurant: RestaurantResponse,
    pub reviews: Vec<ReviewResponse>,
}

/// Typeahead lookup for the onboarding flow. Short or missing queries return
/// an empty list rather than an error.
pub async fn search_restaurants(
    State(state): State<AppState>,
    Query(params): Query<SearchQuery>,
) -> AppResult<Json<Vec<RestaurantSearchResult>>> {
    let query = params.q.as_deref().map(str::trim).unwrap_or_default();
    if query.chars().count() < SEARCH_MIN_CHARS {
        return Ok(Json(Vec::new()));
    }

    let mut conn = state.db()?;
    let pattern = format!("%{}%", escape_like(query));
    let result = restaurants::table
        .filter(restaurants::name.ilike(pattern))
        .order(restaurants::name.asc())
        .limit(SEARCH_LIMIT)
        .select((restaurants::id, restaurants::name, restaurants::neighborhood))
        .load::<(Uuid, String, Option<String>)>(&mut conn);

    let rows = match result {
        Ok(rows) => rows,
        Err(err) => {
            error!(error = %err, "restaurant search failed");
            Vec::new()
        }
    };

    Ok(Json(
        rows.into_iter()
            .map(|(id, name, neighborhood)| RestaurantSearchResult {
                id,
                name,
                neighborhood,
            })
            .collect(),
    ))
}

pub async fn create_restaurant(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Json(payload): Json<CreateRestaurantRequest>,
) -> AppResult<(StatusCode, Json<RestaurantResponse>)> {
    let name = payload.name.trim();
    if name.is_empty() {
        return Err(AppError::bad_request("restaurant name is required"));
    }
    let address = payload.address.trim();
    if address.is_empty() {
        return Err(AppError::bad_request("address is required"));
    }

    let new_restaurant = NewRestaurant {
        id: Uuid::new_v4(),
        name: name.to_owned(),
        address: Some(address.to_owned()),
        city: city_from_address(address),
        neighborhood: clean_optional(payload.neighborhood.as_deref()),
        cuisine_type: clean_optional(payload.cuisine_type.as_deref()),
        created_by: Some(user.id),
    };

    let mut conn = state.db()?;
    diesel::insert_into(restaurants::table)
        .values(&new_restaurant)
        .execute(&mut conn)?;

    let restaurant: Restaurant = restaurants::table.find(new_restaurant.id).first(&mut conn)?;
    Ok((StatusCode::CREATED, Json(RestaurantResponse::from(restaurant))))
}

pub async fn get_restaurant(
    State(state): State<AppState>,
    Path(restaurant_id): Path<Uuid>,
) -> AppResult<Json<RestaurantDetailResponse>> {
    let mut conn = state.db()?;

    let restaurant: Restaurant = restaurants::table
        .find(restaurant_id)
        .first(&mut conn)
        .optional()?
        .ok_or_else(AppError::not_found)?;

    let rows: Vec<Review> = reviews::table
        .filter(reviews::restaurant_id.eq(restaurant_id))
        .order(reviews::created_at.desc())
        .load(&mut conn)?;

    // Author names only for reviews that need them; anonymous authors are
    // never looked up.
    let author_ids: Vec<Uuid> = rows
        .iter()
        .filter(|review| !review.is_anonymous)
        .map(|review| review.user_id)
        .collect();
    let authors: HashMap<Uuid, Option<String>> = if author_ids.is_empty() {
        HashMap::new()
    } else {
        users::table
            .filter(users::id.eq_any(&author_ids))
            .select((users::id, users::name))
            .load::<(Uuid, Option<String>)>(&mut conn)?
            .into_iter()
            .collect()
    };

    let reviews = rows
        .into_iter()
        .map(|review| {
            let author = if review.is_anonymous {
                None
            } else {
                authors.get(&review.user_id).cloned().flatten()
            };
            ReviewResponse {
                id: review.id,
                position: review.position,
                rating_pay: review.rating_pay,
                rating_culture: review.rating_culture,
                rating_management: review.rating_management,
                rating_worklife: review.rating_worklife,
                pros: review.pros,
                cons: review.cons,
                author,
                created_at: review.created_at,
            }
        })
        .collect();

    Ok(Json(RestaurantDetailResponse {
        restaurant: RestaurantResponse::from(restaurant),
        reviews,
    }))
}

/// Assumes "123 Main St, Los Angeles, CA 90001"; the second comma-separated
/// segment is the city, with a fallback when the address has no commas.
fn city_from_address(address: &str) -> String {
    address
        .split(',')
        .nth(1)
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .unwrap_or(DEFAULT_CITY)
        .to_owned()
}

fn clean_optional(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|text| !text.is_empty())
        .map(str::to_owned)
}
