mod common;

use anyhow::Result;
use axum::http::StatusCode;
use common::{acquire_db_lock, body_to_vec, TestApp};
use serde::Deserialize;
use serde_json::json;
use uuid::Uuid;

#[derive(Deserialize)]
struct UserInfo {
    role: Option<String>,
    restaurant_id: Option<Uuid>,
}

#[derive(Deserialize)]
struct Destination {
    destination: String,
}

#[derive(Deserialize)]
struct RestaurantInfo {
    id: Uuid,
    city: String,
}

#[derive(Deserialize)]
struct EmployerJob {
    id: Uuid,
    title: String,
    pay_range: Option<String>,
    status: String,
}

fn job_payload(title: &str) -> serde_json::Value {
    json!({
        "title": title,
        "employment_type": "full-time",
        "description": "Run the floor during dinner service and keep the section moving all night.",
        "pay_structure": "hourly",
        "pay_min": 18.0,
        "pay_max": 25.0,
        "application_type": "internal",
    })
}

async fn onboard_employer(app: &TestApp, external_id: &str, email: &str) -> Result<(String, Uuid)> {
    let (_, token) = app.insert_user(external_id, email, None).await?;

    let role = app
        .patch_json("/api/users/role", &json!({ "role": "employer" }), Some(&token))
        .await?;
    assert_eq!(role.status(), StatusCode::OK);

    let create = app
        .post_json(
            "/api/restaurants",
            &json!({
                "name": "Venice Bistro",
                "address": "456 Ocean Ave, Venice, CA 90291",
                "neighborhood": "Venice",
                "cuisine_type": "Californian",
            }),
            Some(&token),
        )
        .await?;
    assert_eq!(create.status(), StatusCode::CREATED);
    let restaurant: RestaurantInfo = serde_json::from_slice(&body_to_vec(create.into_body()).await?)?;
    assert_eq!(restaurant.city, "Venice");

    let onboarding = app
        .post_json(
            "/api/users/onboarding",
            &json!({ "restaurant_id": restaurant.id, "job_title": "General Manager" }),
            Some(&token),
        )
        .await?;
    assert_eq!(onboarding.status(), StatusCode::OK);
    let user: UserInfo = serde_json::from_slice(&body_to_vec(onboarding.into_body()).await?)?;
    assert_eq!(user.role.as_deref(), Some("employer"));
    assert_eq!(user.restaurant_id, Some(restaurant.id));

    Ok((token, restaurant.id))
}

#[tokio::test]
async fn onboarding_moves_the_destination_forward() -> Result<()> {
    let _lock = acquire_db_lock().await;
    let app = TestApp::new().await?;

    let (_, token) = app.insert_user("ext_fresh", "fresh@example.com", None).await?;
    let response = app.get("/api/users/destination", Some(&token)).await?;
    let parsed: Destination = serde_json::from_slice(&body_to_vec(response.into_body()).await?)?;
    assert_eq!(parsed.destination, "/onboarding");

    let (token, _) = onboard_employer(&app, "ext_owner", "owner@example.com").await?;
    let response = app.get("/api/users/destination", Some(&token)).await?;
    let parsed: Destination = serde_json::from_slice(&body_to_vec(response.into_body()).await?)?;
    assert_eq!(parsed.destination, "/employer/dashboard");

    app.cleanup().await?;
    Ok(())
}

#[tokio::test]
async fn posting_a_job_renders_the_pay_range() -> Result<()> {
    let _lock = acquire_db_lock().await;
    let app = TestApp::new().await?;
    let (token, _) = onboard_employer(&app, "ext_poster", "poster@example.com").await?;

    let response = app
        .post_json("/api/employer/jobs", &job_payload("Server"), Some(&token))
        .await?;
    assert_eq!(response.status(), StatusCode::CREATED);
    let job: EmployerJob = serde_json::from_slice(&body_to_vec(response.into_body()).await?)?;
    assert_eq!(job.title, "Server");
    assert_eq!(job.pay_range.as_deref(), Some("$18-25/hr"));
    assert_eq!(job.status, "active");

    let listing = app.get("/api/employer/jobs", Some(&token)).await?;
    assert_eq!(listing.status(), StatusCode::OK);
    let jobs: Vec<EmployerJob> = serde_json::from_slice(&body_to_vec(listing.into_body()).await?)?;
    assert_eq!(jobs.len(), 1);
    assert_eq!(jobs[0].id, job.id);

    app.cleanup().await?;
    Ok(())
}

#[tokio::test]
async fn tip_based_pay_omits_the_estimate_when_absent() -> Result<()> {
    let _lock = acquire_db_lock().await;
    let app = TestApp::new().await?;
    let (token, _) = onboard_employer(&app, "ext_tips", "tips@example.com").await?;

    let mut payload = job_payload("Bartender");
    payload["pay_structure"] = json!("hourly_tips");
    payload["pay_min"] = json!(null);
    payload["pay_max"] = json!(null);
    payload["base_hourly"] = json!(15.0);

    let response = app
        .post_json("/api/employer/jobs", &payload, Some(&token))
        .await?;
    assert_eq!(response.status(), StatusCode::CREATED);
    let job: EmployerJob = serde_json::from_slice(&body_to_vec(response.into_body()).await?)?;
    assert_eq!(job.pay_range.as_deref(), Some("$15/hr + tips"));

    app.cleanup().await?;
    Ok(())
}

#[tokio::test]
async fn short_descriptions_are_rejected() -> Result<()> {
    let _lock = acquire_db_lock().await;
    let app = TestApp::new().await?;
    let (token, _) = onboard_employer(&app, "ext_short", "short@example.com").await?;

    let mut payload = job_payload("Server");
    payload["description"] = json!("Too short");

    let response = app
        .post_json("/api/employer/jobs", &payload, Some(&token))
        .await?;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    app.cleanup().await?;
    Ok(())
}

#[tokio::test]
async fn posting_without_a_restaurant_is_rejected() -> Result<()> {
    let _lock = acquire_db_lock().await;
    let app = TestApp::new().await?;

    let (_, token) = app
        .insert_user("ext_unattached", "unattached@example.com", Some("employer"))
        .await?;
    let response = app
        .post_json("/api/employer/jobs", &job_payload("Server"), Some(&token))
        .await?;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    app.cleanup().await?;
    Ok(())
}

#[tokio::test]
async fn status_transitions_stay_within_the_closed_set() -> Result<()> {
    let _lock = acquire_db_lock().await;
    let app = TestApp::new().await?;
    let (token, _) = onboard_employer(&app, "ext_status", "status@example.com").await?;

    let created = app
        .post_json("/api/employer/jobs", &job_payload("Server"), Some(&token))
        .await?;
    let job: EmployerJob = serde_json::from_slice(&body_to_vec(created.into_body()).await?)?;

    let paused = app
        .patch_json(
            &format!("/api/employer/jobs/{}/status", job.id),
            &json!({ "status": "paused" }),
            Some(&token),
        )
        .await?;
    assert_eq!(paused.status(), StatusCode::OK);
    let updated: EmployerJob = serde_json::from_slice(&body_to_vec(paused.into_body()).await?)?;
    assert_eq!(updated.status, "paused");

    let bogus = app
        .patch_json(
            &format!("/api/employer/jobs/{}/status", job.id),
            &json!({ "status": "archived" }),
            Some(&token),
        )
        .await?;
    assert_eq!(bogus.status(), StatusCode::BAD_REQUEST);

    app.cleanup().await?;
    Ok(())
}

#[tokio::test]
async fn other_employers_cannot_touch_the_posting() -> Result<()> {
    let _lock = acquire_db_lock().await;
    let app = TestApp::new().await?;
    let (owner_token, _) = onboard_employer(&app, "ext_owner2", "owner2@example.com").await?;

    let created = app
        .post_json("/api/employer/jobs", &job_payload("Server"), Some(&owner_token))
        .await?;
    let job: EmployerJob = serde_json::from_slice(&body_to_vec(created.into_body()).await?)?;

    let (rival_id, rival_token) = app
        .insert_user("ext_rival", "rival@example.com", Some("employer"))
        .await?;
    let rival_restaurant = app.insert_restaurant("Rival House", Some("Downtown")).await?;
    app.set_user_restaurant(rival_id, rival_restaurant).await?;

    let update = app
        .patch_json(
            &format!("/api/employer/jobs/{}/status", job.id),
            &json!({ "status": "filled" }),
            Some(&rival_token),
        )
        .await?;
    assert_eq!(update.status(), StatusCode::UNAUTHORIZED);

    let delete = app
        .delete(&format!("/api/employer/jobs/{}", job.id), Some(&rival_token))
        .await?;
    assert_eq!(delete.status(), StatusCode::UNAUTHORIZED);

    app.cleanup().await?;
    Ok(())
}

#[derive(Deserialize)]
struct Dashboard {
    restaurant: Option<DashboardRestaurant>,
    stats: Option<DashboardStats>,
}

#[derive(Deserialize)]
struct DashboardRestaurant {
    name: String,
}

#[derive(Deserialize)]
struct DashboardStats {
    active_jobs: i64,
    jobs_filled: i64,
}

#[tokio::test]
async fn dashboard_reports_job_counts_by_status() -> Result<()> {
    let _lock = acquire_db_lock().await;
    let app = TestApp::new().await?;
    let (token, _) = onboard_employer(&app, "ext_stats", "stats@example.com").await?;

    let first = app
        .post_json("/api/employer/jobs", &job_payload("Server"), Some(&token))
        .await?;
    let filled: EmployerJob = serde_json::from_slice(&body_to_vec(first.into_body()).await?)?;
    app.post_json("/api/employer/jobs", &job_payload("Bartender"), Some(&token))
        .await?;
    app.patch_json(
        &format!("/api/employer/jobs/{}/status", filled.id),
        &json!({ "status": "filled" }),
        Some(&token),
    )
    .await?;

    let response = app.get("/api/employer/dashboard", Some(&token)).await?;
    assert_eq!(response.status(), StatusCode::OK);
    let dashboard: Dashboard = serde_json::from_slice(&body_to_vec(response.into_body()).await?)?;

    let restaurant = dashboard.restaurant.expect("restaurant attached");
    assert_eq!(restaurant.name, "Venice Bistro");
    let stats = dashboard.stats.expect("stats attached");
    assert_eq!(stats.active_jobs, 1);
    assert_eq!(stats.jobs_filled, 1);

    app.cleanup().await?;
    Ok(())
}

#[tokio::test]
async fn dashboard_before_onboarding_has_no_restaurant() -> Result<()> {
    let _lock = acquire_db_lock().await;
    let app = TestApp::new().await?;

    let (_, token) = app
        .insert_user("ext_nodash", "nodash@example.com", Some("employer"))
        .await?;
    let response = app.get("/api/employer/dashboard", Some(&token)).await?;
    assert_eq!(response.status(), StatusCode::OK);
    let dashboard: Dashboard = serde_json::from_slice(&body_to_vec(response.into_body()).await?)?;
    assert!(dashboard.restaurant.is_none());
    assert!(dashboard.stats.is_none());

    app.cleanup().await?;
    Ok(())
}

#[tokio::test]
async fn deleting_a_posting_removes_it_from_browse() -> Result<()> {
    let _lock = acquire_db_lock().await;
    let app = TestApp::new().await?;
    let (token, _) = onboard_employer(&app, "ext_deleter", "deleter@example.com").await?;

    let created = app
        .post_json("/api/employer/jobs", &job_payload("Server"), Some(&token))
        .await?;
    let job: EmployerJob = serde_json::from_slice(&body_to_vec(created.into_body()).await?)?;

    let delete = app
        .delete(&format!("/api/employer/jobs/{}", job.id), Some(&token))
        .await?;
    assert_eq!(delete.status(), StatusCode::NO_CONTENT);

    let browse = app.get("/api/jobs", None).await?;
    let body = body_to_vec(browse.into_body()).await?;
    let cards: Vec<serde_json::Value> = serde_json::from_slice(&body)?;
    assert!(cards.is_empty());

    app.cleanup().await?;
    Ok(())
}
