use axum::http::HeaderValue;
use axum::{
    routing::{delete, get, patch, post},
    Router,
};
use tower_http::cors::{AllowOrigin, CorsLayer};

use crate::state::AppState;

pub mod employer;
pub mod health;
pub mod jobs;
pub mod restaurants;
pub mod reviews;
pub mod users;
pub mod waitlist;

pub fn create_router(state: AppState) -> Router<()> {
    let cors = if let Some(origins) = state.config.cors_allowed_origin.as_ref() {
        let headers: Vec<HeaderValue> = origins
            .split(',')
            .filter_map(|value| {
                let trimmed = value.trim();
                (!trimmed.is_empty()).then(|| {
                    trimmed
                        .parse::<HeaderValue>()
                        .expect("invalid CORS allowed origin")
                })
            })
            .collect();

        let allow_origin = AllowOrigin::list(headers);

        CorsLayer::new()
            .allow_origin(allow_origin)
            .allow_methods(tower_http::cors::AllowMethods::mirror_request())
            .allow_headers(tower_http::cors::AllowHeaders::mirror_request())
            .allow_credentials(true)
    } else {
        CorsLayer::new()
            .allow_origin(AllowOrigin::mirror_request())
            .allow_methods(tower_http::cors::AllowMethods::mirror_request())
            .allow_headers(tower_http::cors::AllowHeaders::mirror_request())
            .allow_credentials(true)
    };

    let jobs_routes = Router::new()
        .route("/", get(jobs::list_jobs))
        .route("/filter-options", get(jobs::filter_options))
        .route("/:id", get(jobs::get_job))
        .route(
            "/:id/save",
            post(jobs::save_job).delete(jobs::unsave_job),
        );

    let employer_jobs_routes = Router::new()
        .route(
            "/",
            get(employer::list_employer_jobs).post(employer::create_job),
        )
        .route("/:id", delete(employer::delete_job))
        .route("/:id/status", patch(employer::update_job_status));

    let restaurants_routes = Router::new()
        .route("/", post(restaurants::create_restaurant))
        .route("/search", get(restaurants::search_restaurants))
        .route("/:id", get(restaurants::get_restaurant));

    let users_routes = Router::new()
        .route("/me", get(users::me))
        .route("/role", patch(users::update_role))
        .route("/onboarding", post(users::complete_onboarding))
        .route("/destination", get(users::destination));

    Router::new()
        .nest("/api/jobs", jobs_routes)
        .nest("/api/employer/jobs", employer_jobs_routes)
        .route("/api/employer/dashboard", get(employer::dashboard))
        .nest("/api/restaurants", restaurants_routes)
        .route("/api/reviews", post(reviews::submit_review))
        .nest("/api/users", users_routes)
        .route("/api/waitlist", post(waitlist::join_waitlist))
        .route("/api/health", get(health::health_check))
        .with_state(state)
        .layer(cors)
}
