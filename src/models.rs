use chrono::NaiveDateTime;
use diesel::prelude::*;
use uuid::Uuid;

use crate::schema::*;

pub const JOB_STATUS_ACTIVE: &str = "active";
pub const JOB_STATUS_PAUSED: &str = "paused";
pub const JOB_STATUS_FILLED: &str = "filled";
pub const JOB_STATUS_EXPIRED: &str = "expired";

pub const JOB_STATUSES: &[&str] = &[
    JOB_STATUS_ACTIVE,
    JOB_STATUS_PAUSED,
    JOB_STATUS_FILLED,
    JOB_STATUS_EXPIRED,
];

pub const APPLICATION_TYPE_INTERNAL: &str = "internal";
pub const APPLICATION_TYPE_EXTERNAL: &str = "external";

pub const ROLE_WORKER: &str = "worker";
pub const ROLE_EMPLOYER: &str = "employer";

#[derive(Debug, Clone, Queryable, Identifiable)]
#[diesel(table_name = users)]
pub struct User {
    pub id: Uuid,
    pub external_id: String,
    pub email: String,
    pub name: Option<String>,
    pub role: Option<String>,
    pub restaurant_id: Option<Uuid>,
    pub job_title: Option<String>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = users)]
pub struct NewUser {
    pub id: Uuid,
    pub external_id: String,
    pub email: String,
    pub name: Option<String>,
    pub role: Option<String>,
}

#[derive(Debug, Clone, Queryable, Identifiable)]
#[diesel(table_name = restaurants)]
pub struct Restaurant {
    pub id: Uuid,
    pub name: String,
    pub address: Option<String>,
    pub city: String,
    pub neighborhood: Option<String>,
    pub cuisine_type: Option<String>,
    pub phone: Option<String>,
    pub website: Option<String>,
    pub description: Option<String>,
    pub created_by: Option<Uuid>,
    pub rating_pay: Option<f64>,
    pub rating_culture: Option<f64>,
    pub rating_management: Option<f64>,
    pub rating_worklife: Option<f64>,
    pub review_count: i32,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = restaurants)]
pub struct NewRestaurant {
    pub id: Uuid,
    pub name: String,
    pub address: Option<String>,
    pub city: String,
    pub neighborhood: Option<String>,
    pub cuisine_type: Option<String>,
    pub created_by: Option<Uuid>,
}

#[derive(Debug, Clone, Queryable, Identifiable, Associations)]
#[diesel(table_name = jobs)]
#[diesel(belongs_to(Restaurant, foreign_key = restaurant_id))]
pub struct Job {
    pub id: Uuid,
    pub restaurant_id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub requirements: Option<String>,
    pub pay_range: Option<String>,
    pub pay_min: Option<f64>,
    pub pay_max: Option<f64>,
    pub pay_type: Option<String>,
    pub source: String,
    pub source_url: Option<String>,
    pub status: String,
    pub posted_date: Option<NaiveDateTime>,
    pub employment_type: Option<String>,
    pub benefits: Option<Vec<String>>,
    pub schedule_details: Option<String>,
    pub application_type: String,
    pub posted_by: Option<Uuid>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = jobs)]
pub struct NewJob {
    pub id: Uuid,
    pub restaurant_id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub requirements: Option<String>,
    pub pay_range: Option<String>,
    pub pay_min: Option<f64>,
    pub pay_max: Option<f64>,
    pub pay_type: Option<String>,
    pub source: String,
    pub source_url: Option<String>,
    pub status: String,
    pub posted_date: Option<NaiveDateTime>,
    pub employment_type: Option<String>,
    pub benefits: Option<Vec<String>>,
    pub schedule_details: Option<String>,
    pub application_type: String,
    pub posted_by: Option<Uuid>,
}

#[derive(Debug, Clone, Queryable, Identifiable, Associations)]
#[diesel(table_name = reviews)]
#[diesel(belongs_to(User))]
#[diesel(belongs_to(Restaurant, foreign_key = restaurant_id))]
pub struct Review {
    pub id: Uuid,
    pub user_id: Uuid,
    pub restaurant_id: Uuid,
    pub position: String,
    pub rating_pay: i32,
    pub rating_culture: i32,
    pub rating_management: i32,
    pub rating_worklife: i32,
    pub pros: Option<String>,
    pub cons: Option<String>,
    pub verified: bool,
    pub is_anonymous: bool,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = reviews)]
pub struct NewReview {
    pub id: Uuid,
    pub user_id: Uuid,
    pub restaurant_id: Uuid,
    pub position: String,
    pub rating_pay: i32,
    pub rating_culture: i32,
    pub rating_management: i32,
    pub rating_worklife: i32,
    pub pros: Option<String>,
    pub cons: Option<String>,
    pub is_anonymous: bool,
}

#[allow(dead_code)]
#[derive(Debug, Clone, Queryable, Associations)]
#[diesel(table_name = saved_jobs)]
#[diesel(belongs_to(User))]
#[diesel(belongs_to(Job))]
#[diesel(primary_key(user_id, job_id))]
pub struct SavedJob {
    pub user_id: Uuid,
    pub job_id: Uuid,
    pub created_at: NaiveDateTime,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = saved_jobs)]
pub struct NewSavedJob {
    pub user_id: Uuid,
    pub job_id: Uuid,
}

#[allow(dead_code)]
#[derive(Debug, Clone, Queryable, Identifiable)]
#[diesel(table_name = waitlist)]
pub struct WaitlistEntry {
    pub id: Uuid,
    pub email: String,
    pub user_type: Option<String>,
    pub role: Option<String>,
    pub created_at: NaiveDateTime,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = waitlist)]
pub struct NewWaitlistEntry {
    pub id: Uuid,
    pub email: String,
    pub user_type: Option<String>,
    pub role: Option<String>,
}
