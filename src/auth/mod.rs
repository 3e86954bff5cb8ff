pub mod jwt;

use axum::{async_trait, extract::FromRequestParts, http::request::Parts};
use axum_extra::headers::{authorization::Bearer, Authorization};
use axum_extra::TypedHeader;
use diesel::result::DatabaseErrorKind;
use diesel::{prelude::*, PgConnection};
use uuid::Uuid;

use crate::{
    auth::jwt::IdentityClaims,
    error::{AppError, AppResult},
    models::{NewUser, User},
    schema::users,
    state::AppState,
};

/// The internal user row for the verified caller. Rejects with 401 when no
/// valid bearer token is present.
#[derive(Debug, Clone)]
pub struct CurrentUser(pub User);

/// Like [`CurrentUser`] but never rejects; public pages use it to tailor the
/// response for signed-in callers.
#[derive(Debug, Clone)]
pub struct OptionalUser(pub Option<User>);

#[async_trait]
impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let TypedHeader(Authorization(bearer)) =
            TypedHeader::<Authorization<Bearer>>::from_request_parts(parts, state)
                .await
                .map_err(|_| AppError::sign_up_required())?;

        let claims = state
            .jwt
            .verify_identity_token(bearer.token())
            .map_err(|_| AppError::unauthorized())?;

        let mut conn = state.db()?;
        let user = ensure_user(&mut conn, &claims)?;
        Ok(CurrentUser(user))
    }
}

#[async_trait]
impl FromRequestParts<AppState> for OptionalUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        match CurrentUser::from_request_parts(parts, state).await {
            Ok(CurrentUser(user)) => Ok(OptionalUser(Some(user))),
            Err(_) => Ok(OptionalUser(None)),
        }
    }
}

/// Maps a provider identity to an internal `users` row, creating the row on
/// first sight with no role (the onboarding flow assigns one later).
pub fn ensure_user(conn: &mut PgConnection, claims: &IdentityClaims) -> AppResult<User> {
    let existing = users::table
        .filter(users::external_id.eq(&claims.sub))
        .first::<User>(conn)
        .optional()?;

    if let Some(user) = existing {
        return Ok(user);
    }

    let new_user = NewUser {
        id: Uuid::new_v4(),
        external_id: claims.sub.clone(),
        email: claims.email.clone(),
        name: claims.name.clone(),
        role: None,
    };

    match diesel::insert_into(users::table)
        .values(&new_user)
        .execute(conn)
    {
        Ok(_) => {}
        // Two requests can race on first sight; the loser reads the winner's row.
        Err(diesel::result::Error::DatabaseError(DatabaseErrorKind::UniqueViolation, _)) => {}
        Err(err) => return Err(AppError::from(err)),
    }

    let user = users::table
        .filter(users::external_id.eq(&claims.sub))
        .first::<User>(conn)?;
    Ok(user)
}
