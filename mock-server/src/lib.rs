//! In-memory fake of a UniFi Access console's developer user API.
//!
//! Every response is a `{code, msg, data}` envelope. Application failures
//! (unknown user, invalid parameters) come back under HTTP 200 the way the
//! real console reports them; only a bad token changes the status to 401.

use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::{header::AUTHORIZATION, HeaderMap, StatusCode},
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tokio::{net::TcpListener, sync::RwLock};
use uuid::Uuid;

pub const DEFAULT_TOKEN: &str = "mock-token";

pub const SUCCESS: &str = "SUCCESS";
pub const CODE_PARAMS_INVALID: &str = "CODE_PARAMS_INVALID";
pub const CODE_RESOURCE_NOT_FOUND: &str = "CODE_RESOURCE_NOT_FOUND";
pub const CODE_UNAUTHORIZED: &str = "CODE_UNAUTHORIZED";

const STATUSES: [&str; 2] = ["ACTIVE", "DEACTIVATED"];

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct User {
    pub id: String,
    pub first_name: String,
    pub last_name: String,
    pub full_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub employee_number: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub onboard_time: Option<i64>,
    pub status: String,
}

#[derive(Deserialize)]
pub struct CreateUser {
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    pub user_email: Option<String>,
    pub employee_number: Option<String>,
    pub onboard_time: Option<i64>,
    pub status: Option<String>,
}

#[derive(Deserialize)]
pub struct UpdateUser {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub user_email: Option<String>,
    pub employee_number: Option<String>,
    pub onboard_time: Option<i64>,
    pub status: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Envelope<T> {
    pub code: String,
    pub msg: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

type Reply<T> = (StatusCode, Json<Envelope<T>>);

fn success<T>(data: Option<T>) -> Reply<T> {
    (
        StatusCode::OK,
        Json(Envelope {
            code: SUCCESS.to_string(),
            msg: "success".to_string(),
            data,
        }),
    )
}

fn failure<T>(status: StatusCode, code: &str, msg: impl Into<String>) -> Reply<T> {
    (
        status,
        Json(Envelope {
            code: code.to_string(),
            msg: msg.into(),
            data: None,
        }),
    )
}

#[derive(Clone)]
pub struct AppState {
    users: Arc<RwLock<Vec<User>>>,
    token: Arc<str>,
}

impl AppState {
    fn authorize<T>(&self, headers: &HeaderMap) -> Result<(), Reply<T>> {
        let expected = format!("Bearer {}", self.token);
        match headers.get(AUTHORIZATION).and_then(|v| v.to_str().ok()) {
            Some(value) if value == expected => Ok(()),
            _ => {
                tracing::info!("rejecting request with missing or bad token");
                Err(failure(StatusCode::UNAUTHORIZED, CODE_UNAUTHORIZED, "Unauthorized."))
            }
        }
    }
}

pub fn app(token: &str) -> Router {
    let state = AppState {
        users: Arc::new(RwLock::new(Vec::new())),
        token: Arc::from(token),
    };
    Router::new()
        .route("/api/v1/developer/users", get(list_users).post(create_user))
        .route("/api/v1/developer/users/{id}", get(get_user).put(update_user))
        .with_state(state)
}

pub async fn run(listener: TcpListener, token: String) -> Result<(), std::io::Error> {
    axum::serve(listener, app(&token)).await
}

fn valid_status(status: &Option<String>) -> bool {
    status.as_deref().map_or(true, |s| STATUSES.contains(&s))
}

async fn list_users(State(state): State<AppState>, headers: HeaderMap) -> Reply<Vec<User>> {
    if let Err(reply) = state.authorize(&headers) {
        return reply;
    }
    let users = state.users.read().await;
    success(Some(users.clone()))
}

async fn create_user(
    State(state): State<AppState>,
    headers: HeaderMap,
    input: Result<Json<CreateUser>, JsonRejection>,
) -> Reply<User> {
    if let Err(reply) = state.authorize(&headers) {
        return reply;
    }
    let Ok(Json(input)) = input else {
        return failure(StatusCode::OK, CODE_PARAMS_INVALID, "Invalid request body.");
    };
    if input.first_name.is_empty() || input.last_name.is_empty() {
        return failure(
            StatusCode::OK,
            CODE_PARAMS_INVALID,
            "first_name and last_name are required.",
        );
    }
    if !valid_status(&input.status) {
        return failure(StatusCode::OK, CODE_PARAMS_INVALID, "Invalid status.");
    }

    let user = User {
        id: Uuid::new_v4().to_string(),
        full_name: format!("{} {}", input.first_name, input.last_name),
        first_name: input.first_name,
        last_name: input.last_name,
        user_email: input.user_email,
        employee_number: input.employee_number,
        onboard_time: input.onboard_time,
        status: input.status.unwrap_or_else(|| "ACTIVE".to_string()),
    };
    tracing::info!(id = %user.id, "user created");
    state.users.write().await.push(user.clone());
    success(Some(user))
}

async fn get_user(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Reply<User> {
    if let Err(reply) = state.authorize(&headers) {
        return reply;
    }
    let users = state.users.read().await;
    match users.iter().find(|u| u.id == id) {
        Some(user) => success(Some(user.clone())),
        None => failure(StatusCode::OK, CODE_RESOURCE_NOT_FOUND, "Resource not found."),
    }
}

async fn update_user(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<String>,
    input: Result<Json<UpdateUser>, JsonRejection>,
) -> Reply<()> {
    if let Err(reply) = state.authorize(&headers) {
        return reply;
    }
    let Ok(Json(input)) = input else {
        return failure(StatusCode::OK, CODE_PARAMS_INVALID, "Invalid request body.");
    };
    if !valid_status(&input.status) {
        return failure(StatusCode::OK, CODE_PARAMS_INVALID, "Invalid status.");
    }

    let mut users = state.users.write().await;
    let Some(user) = users.iter_mut().find(|u| u.id == id) else {
        return failure(StatusCode::OK, CODE_RESOURCE_NOT_FOUND, "Resource not found.");
    };
    if let Some(first_name) = input.first_name {
        user.first_name = first_name;
    }
    if let Some(last_name) = input.last_name {
        user.last_name = last_name;
    }
    if input.user_email.is_some() {
        user.user_email = input.user_email;
    }
    if input.employee_number.is_some() {
        user.employee_number = input.employee_number;
    }
    if input.onboard_time.is_some() {
        user.onboard_time = input.onboard_time;
    }
    if let Some(status) = input.status {
        user.status = status;
    }
    user.full_name = format!("{} {}", user.first_name, user.last_name);
    tracing::info!(%id, "user updated");
    success(None)
}
