use axum::extract::State;
use axum::Json;
use chrono::Utc;
use diesel::{prelude::*, PgConnection};
use serde::{Deserialize, Serialize};
use tracing::error;
use uuid::Uuid;

use crate::auth::CurrentUser;
use crate::error::{AppError, AppResult};
use crate::models::{NewReview, Review};
use crate::schema::{restaurants, reviews};
use crate::state::AppState;

const RATING_MIN: i32 = 1;
const RATING_MAX: i32 = 5;

#[derive(Deserialize)]
pub struct SubmitReviewRequest {
    pub restaurant_id: Uuid,
    pub position: String,
    pub rating_pay: i32,
    pub rating_culture: i32,
    pub rating_management: i32,
    pub rating_worklife: i32,
    pub pros: Option<String>,
    pub cons: Option<String>,
    #[serde(default)]
    pub is_anonymous: bool,
}

/// Structured result the review form renders inline; submission never
/// surfaces a transport-level error for expected failures.
#[derive(Serialize)]
pub struct SubmitReviewResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl SubmitReviewResponse {
    fn ok() -> Self {
        Self {
            success: true,
            message: None,
        }
    }

    fn failed(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: Some(message.into()),
        }
    }
}

/// One review per (user, restaurant): a second submission updates the
/// existing row in place. The restaurant's aggregate ratings and review
/// count are recomputed inside the same transaction as the review write so a
/// torn aggregate is impossible.
pub async fn submit_review(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Json(payload): Json<SubmitReviewRequest>,
) -> AppResult<Json<SubmitReviewResponse>> {
    if payload.position.trim().is_empty() {
        return Ok(Json(SubmitReviewResponse::failed("position is required")));
    }

    let ratings = [
        payload.rating_pay,
        payload.rating_culture,
        payload.rating_management,
        payload.rating_worklife,
    ];
    if ratings
        .iter()
        .any(|rating| *rating < RATING_MIN || *rating > RATING_MAX)
    {
        return Ok(Json(SubmitReviewResponse::failed(
            "ratings must be between 1 and 5",
        )));
    }

    let mut conn = state.db()?;

    let restaurant_exists = restaurants::table
        .find(payload.restaurant_id)
        .select(restaurants::id)
        .first::<Uuid>(&mut conn)
        .optional()?;
    if restaurant_exists.is_none() {
        return Err(AppError::not_found());
    }

    let outcome = conn.transaction::<_, diesel::result::Error, _>(|conn| {
        let existing: Option<Review> = reviews::table
            .filter(reviews::user_id.eq(user.id))
            .filter(reviews::restaurant_id.eq(payload.restaurant_id))
            .first(conn)
            .optional()?;

        let now = Utc::now().naive_utc();
        let pros = clean_optional_text(payload.pros.as_deref());
        let cons = clean_optional_text(payload.cons.as_deref());

        match existing {
            Some(review) => {
                diesel::update(reviews::table.find(review.id))
                    .set((
                        reviews::position.eq(payload.position.trim()),
                        reviews::rating_pay.eq(payload.rating_pay),
                        reviews::rating_culture.eq(payload.rating_culture),
                        reviews::rating_management.eq(payload.rating_management),
                        reviews::rating_worklife.eq(payload.rating_worklife),
                        reviews::pros.eq(pros),
                        reviews::cons.eq(cons),
                        reviews::is_anonymous.eq(payload.is_anonymous),
                        reviews::updated_at.eq(now),
                    ))
                    .execute(conn)?;
            }
            None => {
                let new_review = NewReview {
                    id: Uuid::new_v4(),
                    user_id: user.id,
                    restaurant_id: payload.restaurant_id,
                    position: payload.position.trim().to_owned(),
                    rating_pay: payload.rating_pay,
                    rating_culture: payload.rating_culture,
                    rating_management: payload.rating_management,
                    rating_worklife: payload.rating_worklife,
                    pros,
                    cons,
                    is_anonymous: payload.is_anonymous,
                };
                diesel::insert_into(reviews::table)
                    .values(&new_review)
                    .execute(conn)?;
            }
        }

        recompute_restaurant_ratings(conn, payload.restaurant_id)?;
        Ok(())
    });

    match outcome {
        Ok(()) => Ok(Json(SubmitReviewResponse::ok())),
        Err(err) => {
            error!(error = %err, restaurant_id = %payload.restaurant_id, "review write failed");
            Ok(Json(SubmitReviewResponse::failed(
                "could not save your review, please try again",
            )))
        }
    }
}

/// Rebuilds the four aggregate averages and the review count from the raw
/// review rows. Must run in the same transaction as the review write.
pub fn recompute_restaurant_ratings(
    conn: &mut PgConnection,
    restaurant_id: Uuid,
) -> Result<(), diesel::result::Error> {
    let rows: Vec<(i32, i32, i32, i32)> = reviews::table
        .filter(reviews::restaurant_id.eq(restaurant_id))
        .select((
            reviews::rating_pay,
            reviews::rating_culture,
            reviews::rating_management,
            reviews::rating_worklife,
        ))
        .load(conn)?;

    let count = rows.len() as i32;
    let average = |pick: fn(&(i32, i32, i32, i32)) -> i32| -> Option<f64> {
        if rows.is_empty() {
            return None;
        }
        let sum: i64 = rows.iter().map(|row| pick(row) as i64).sum();
        Some(round2(sum as f64 / rows.len() as f64))
    };

    diesel::update(restaurants::table.find(restaurant_id))
        .set((
            restaurants::rating_pay.eq(average(|row| row.0)),
            restaurants::rating_culture.eq(average(|row| row.1)),
            restaurants::rating_management.eq(average(|row| row.2)),
            restaurants::rating_worklife.eq(average(|row| row.3)),
            restaurants::review_count.eq(count),
            restaurants::updated_at.eq(Utc::now().naive_utc()),
        ))
        .execute(conn)?;

    Ok(())
}

fn clean_optional_text(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|text| !text.is_empty())
        .map(str::to_owned)
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
