use axum::extract::State;
use axum::Json;
use chrono::{Duration, Utc};
use diesel::prelude::*;
use diesel::result::DatabaseErrorKind;
use diesel::result::Error as DieselError;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::error;
use uuid::Uuid;

use crate::error::AppResult;
use crate::models::NewWaitlistEntry;
use crate::schema::waitlist;
use crate::state::AppState;

const EMAIL_MAX_LEN: usize = 254;
const MAX_DOMAIN_SEGMENTS: usize = 4;

/// Throwaway email providers that get rejected up front.
const BLOCKED_DOMAINS: &[&str] = &[
    "10minutemail.com",
    "tempmail.com",
    "guerrillamail.com",
    "mailinator.com",
    "throwaway.email",
    "fakemail.com",
    "trashmail.com",
    "mohmal.com",
    "yopmail.com",
    "getnada.com",
];

static EMAIL_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"^[a-zA-Z0-9.!#$%&'*+/=?^_`{|}~-]+@[a-zA-Z0-9](?:[a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?(?:\.[a-zA-Z0-9](?:[a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?)*$",
    )
    .expect("email regex is valid")
});

#[derive(Deserialize)]
pub struct JoinWaitlistRequest {
    pub email: String,
    pub user_type: Option<String>,
    pub role: Option<String>,
}

#[derive(Serialize)]
pub struct WaitlistResponse {
    pub success: bool,
    pub message: String,
}

impl WaitlistResponse {
    fn ok(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
        }
    }

    fn failed(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
        }
    }
}

pub async fn join_waitlist(
    State(state): State<AppState>,
    Json(payload): Json<JoinWaitlistRequest>,
) -> AppResult<Json<WaitlistResponse>> {
    let email = payload.email.trim().to_lowercase();
    if email.is_empty() {
        return Ok(Json(WaitlistResponse::failed("Please enter your email.")));
    }
    if let Err(message) = validate_email(&email) {
        return Ok(Json(WaitlistResponse::failed(message)));
    }

    let mut conn = state.db()?;

    // One submission per email per hour. A failed check never blocks the
    // signup, it only logs.
    let one_hour_ago = Utc::now().naive_utc() - Duration::hours(1);
    let recent = waitlist::table
        .filter(waitlist::email.eq(&email))
        .filter(waitlist::created_at.ge(one_hour_ago))
        .count()
        .get_result::<i64>(&mut conn);
    match recent {
        Ok(count) if count > 0 => {
            return Ok(Json(WaitlistResponse::failed(
                "You've already signed up recently. Please try again later.",
            )));
        }
        Ok(_) => {}
        Err(err) => {
            error!(error = %err, "waitlist rate limit check failed");
        }
    }

    let entry = NewWaitlistEntry {
        id: Uuid::new_v4(),
        email,
        user_type: clean_optional(payload.user_type.as_deref()),
        role: clean_optional(payload.role.as_deref()),
    };

    let insert = diesel::insert_into(waitlist::table)
        .values(&entry)
        .execute(&mut conn);

    match insert {
        Ok(_) => Ok(Json(WaitlistResponse::ok(
            "You're on the list. We'll reach out when we launch.",
        ))),
        // Already signed up; the intended outcome holds.
        Err(DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, _)) => Ok(Json(
            WaitlistResponse::ok("You're already on the list. We'll be in touch."),
        )),
        Err(err) => {
            error!(error = %err, "waitlist insert failed");
            Ok(Json(WaitlistResponse::failed(
                "Something went wrong. Please try again later.",
            )))
        }
    }
}

fn validate_email(email: &str) -> Result<(), &'static str> {
    if email.len() > EMAIL_MAX_LEN {
        return Err("Email address is too long.");
    }
    if !EMAIL_REGEX.is_match(email) {
        return Err("Please enter a valid email address.");
    }

    let domain = email
        .split('@')
        .nth(1)
        .ok_or("Please enter a valid email address.")?;
    if BLOCKED_DOMAINS.contains(&domain) {
        return Err("Please use a valid email address.");
    }
    if domain.split('.').count() > MAX_DOMAIN_SEGMENTS {
        return Err("Please enter a valid email address.");
    }

    Ok(())
}

fn clean_optional(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|text| !text.is_empty())
        .map(str::to_owned)
}
