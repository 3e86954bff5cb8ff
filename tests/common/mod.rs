use std::env;

use anyhow::{anyhow, Context, Result};
use axum::body::Body;
use axum::http::{Method, Request};
use axum::Router;
use diesel::connection::SimpleConnection;
use diesel::prelude::*;
use diesel::PgConnection;
use diesel_migrations::{embed_migrations, EmbeddedMigrations, MigrationHarness};
use http_body_util::BodyExt;
use once_cell::sync::Lazy;
use serde::Serialize;
use shiftcrew::auth::jwt::JwtService;
use shiftcrew::config::AppConfig;
use shiftcrew::db::{self, PgPool};
use shiftcrew::models::{NewJob, NewRestaurant, NewUser, JOB_STATUS_ACTIVE};
use shiftcrew::routes;
use shiftcrew::state::AppState;
use tokio::sync::Mutex;
use tower::util::ServiceExt;
use uuid::Uuid;

const MIGRATIONS: EmbeddedMigrations = embed_migrations!("migrations");

static DB_LOCK: Lazy<Mutex<()>> = Lazy::new(|| Mutex::new(()));

pub struct TestApp {
    pub state: AppState,
    router: Router,
}

impl TestApp {
    pub async fn new() -> Result<Self> {
        let database_url = env::var("TEST_DATABASE_URL")
            .context("TEST_DATABASE_URL must be set for integration tests")?;

        let config = AppConfig {
            database_url: database_url.clone(),
            database_max_pool_size: db::DEFAULT_MAX_POOL_SIZE,
            server_host: "127.0.0.1".to_string(),
            server_port: 0,
            jwt_secret: "test-secret".to_string(),
            jwt_issuer: "test-issuer".to_string(),
            jwt_audience: "test-audience".to_string(),
            cors_allowed_origin: None,
            revalidate_endpoint: None,
        };

        let pool = db::init_pool_with_size(&config.database_url, config.database_max_pool_size)?;
        prepare_database(&pool).await?;

        let jwt = JwtService::from_config(&config)?;
        let state = AppState::new(pool.clone(), config, jwt);
        let router = routes::create_router(state.clone());

        Ok(Self { state, router })
    }

    pub async fn cleanup(&self) -> Result<()> {
        self.with_conn(|conn| {
            truncate_all(conn)?;
            Ok(())
        })
        .await
    }

    /// Inserts a user row the way the identity-provider mapping would and
    /// returns its id together with a bearer token for it.
    pub async fn insert_user(
        &self,
        external_id: &str,
        email: &str,
        role: Option<&str>,
    ) -> Result<(Uuid, String)> {
        let external_id = external_id.to_string();
        let email = email.to_string();
        let role = role.map(str::to_owned);

        let id = {
            let external_id = external_id.clone();
            let email = email.clone();
            self.with_conn(move |conn| {
                let user = NewUser {
                    id: Uuid::new_v4(),
                    external_id,
                    email,
                    name: Some("Test User".to_string()),
                    role,
                };
                diesel::insert_into(shiftcrew::schema::users::table)
                    .values(&user)
                    .execute(conn)
                    .context("failed to insert user")?;
                Ok(user.id)
            })
            .await?
        };

        let token = self
            .state
            .jwt
            .mint_identity_token(&external_id, &email, Some("Test User"))?;
        Ok((id, token))
    }

    pub async fn set_user_restaurant(&self, user_id: Uuid, restaurant_id: Uuid) -> Result<()> {
        self.with_conn(move |conn| {
            use shiftcrew::schema::users;
            diesel::update(users::table.find(user_id))
                .set(users::restaurant_id.eq(restaurant_id))
                .execute(conn)
                .context("failed to set user restaurant")?;
            Ok(())
        })
        .await
    }

    pub async fn insert_restaurant(
        &self,
        name: &str,
        neighborhood: Option<&str>,
    ) -> Result<Uuid> {
        let name = name.to_string();
        let neighborhood = neighborhood.map(str::to_owned);
        self.with_conn(move |conn| {
            let restaurant = NewRestaurant {
                id: Uuid::new_v4(),
                name,
                address: Some("123 Main St, Los Angeles, CA 90001".to_string()),
                city: "Los Angeles".to_string(),
                neighborhood,
                cuisine_type: None,
                created_by: None,
            };
            diesel::insert_into(shiftcrew::schema::restaurants::table)
                .values(&restaurant)
                .execute(conn)
                .context("failed to insert restaurant")?;
            Ok(restaurant.id)
        })
        .await
    }

    pub async fn insert_job(&self, restaurant_id: Uuid, title: &str, status: &str) -> Result<Uuid> {
        let title = title.to_string();
        let status = status.to_string();
        self.with_conn(move |conn| {
            let posted_date = (status == JOB_STATUS_ACTIVE)
                .then(|| chrono::Utc::now().naive_utc());
            let job = NewJob {
                id: Uuid::new_v4(),
                restaurant_id,
                title,
                description: Some("Busy kitchen, strong team, growth path.".to_string()),
                requirements: None,
                pay_range: Some("$18-25/hr".to_string()),
                pay_min: Some(18.0),
                pay_max: Some(25.0),
                pay_type: Some("hourly".to_string()),
                source: "direct".to_string(),
                source_url: None,
                status,
                posted_date,
                employment_type: Some("full-time".to_string()),
                benefits: None,
                schedule_details: None,
                application_type: "internal".to_string(),
                posted_by: None,
            };
            diesel::insert_into(shiftcrew::schema::jobs::table)
                .values(&job)
                .execute(conn)
                .context("failed to insert job")?;
            Ok(job.id)
        })
        .await
    }

    pub async fn post_json<T: Serialize + ?Sized>(
        &self,
        path: &str,
        payload: &T,
        token: Option<&str>,
    ) -> Result<hyper::Response<Body>> {
        self.send_json(Method::POST, path, payload, token).await
    }

    pub async fn patch_json<T: Serialize + ?Sized>(
        &self,
        path: &str,
        payload: &T,
        token: Option<&str>,
    ) -> Result<hyper::Response<Body>> {
        self.send_json(Method::PATCH, path, payload, token).await
    }

    async fn send_json<T: Serialize + ?Sized>(
        &self,
        method: Method,
        path: &str,
        payload: &T,
        token: Option<&str>,
    ) -> Result<hyper::Response<Body>> {
        let body = serde_json::to_vec(payload)?;
        let mut builder = Request::builder()
            .method(method)
            .uri(path)
            .header("content-type", "application/json");
        if let Some(token) = token {
            builder = builder.header("authorization", format!("Bearer {token}"));
        }
        let request = builder.body(Body::from(body))?;
        Ok(self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("infallible response"))
    }

    pub async fn get(&self, path: &str, token: Option<&str>) -> Result<hyper::Response<Body>> {
        let mut builder = Request::builder().method(Method::GET).uri(path);
        if let Some(token) = token {
            builder = builder.header("authorization", format!("Bearer {token}"));
        }
        let request = builder.body(Body::empty())?;
        Ok(self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("infallible response"))
    }

    #[allow(dead_code)]
    pub async fn delete(&self, path: &str, token: Option<&str>) -> Result<hyper::Response<Body>> {
        let builder = Request::builder().method(Method::DELETE).uri(path);
        let builder = if let Some(token) = token {
            builder.header("authorization", format!("Bearer {token}"))
        } else {
            builder
        };
        let request = builder.body(Body::empty())?;
        Ok(self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("infallible response"))
    }

    pub async fn with_conn<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&mut PgConnection) -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let pool = self.state.pool.clone();
        tokio::task::spawn_blocking(move || {
            let mut conn = pool
                .get()
                .map_err(|err| anyhow!("failed to get database connection: {err}"))?;
            f(&mut conn)
        })
        .await
        .context("connection task panicked")?
    }
}

pub async fn acquire_db_lock() -> tokio::sync::MutexGuard<'static, ()> {
    DB_LOCK.lock().await
}

pub async fn body_to_vec(body: Body) -> Result<Vec<u8>> {
    let collected = body
        .collect()
        .await
        .map_err(|err| anyhow!("failed to read response body: {err}"))?;
    Ok(collected.to_bytes().to_vec())
}

async fn prepare_database(pool: &PgPool) -> Result<()> {
    let pool = pool.clone();
    tokio::task::spawn_blocking(move || -> Result<()> {
        let mut conn = pool
            .get()
            .map_err(|err| anyhow!("failed to acquire connection: {err}"))?;
        conn.run_pending_migrations(MIGRATIONS)
            .map_err(|err| anyhow!("failed to run migrations: {err}"))?;
        truncate_all(&mut conn)?;
        Ok(())
    })
    .await
    .context("migration task panicked")?
}

fn truncate_all(conn: &mut PgConnection) -> Result<()> {
    conn.batch_execute(
        "TRUNCATE TABLE reviews, saved_jobs, jobs, waitlist, users, restaurants RESTART IDENTITY CASCADE;",
    )
    .context("failed to truncate tables")?;
    Ok(())
}
