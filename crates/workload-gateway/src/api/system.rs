//! User administration routes.

use std::sync::Arc;

use api_types::UserCount;
use api_types::UserRecord;
use poem::handler;
use poem::http::StatusCode;
use poem::web::Data;
use poem::web::Json;
use poem::web::Query;
use poem::IntoResponse;
use poem::Response;
use serde::Deserialize;

use super::errors::into_poem_error;
use crate::users::UserStore;

#[derive(Debug, Deserialize)]
pub struct IdQuery {
    pub id: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UsernameQuery {
    pub username: Option<String>,
}

fn bad_request(message: &'static str) -> poem::Error {
    poem::Error::from_string(message, StatusCode::BAD_REQUEST)
}

fn required(value: Option<String>, message: &'static str) -> poem::Result<String> {
    value
        .filter(|value| !value.is_empty())
        .ok_or_else(|| bad_request(message))
}

#[handler]
pub async fn create_user(
    Json(user): Json<UserRecord>,
    users: Data<&Arc<dyn UserStore>>,
) -> poem::Result<Response> {
    if user.username.is_empty() {
        return Err(bad_request("Missing username"));
    }
    users.create(user).map_err(into_poem_error)?;
    Ok("User created successfully"
        .with_status(StatusCode::CREATED)
        .into_response())
}

#[handler]
pub async fn update_user(
    Json(user): Json<UserRecord>,
    users: Data<&Arc<dyn UserStore>>,
) -> poem::Result<&'static str> {
    if user.id.is_empty() {
        return Err(bad_request("Missing user id"));
    }
    if user.username.is_empty() {
        return Err(bad_request("Missing username"));
    }
    users.update(user).map_err(into_poem_error)?;
    Ok("User updated successfully")
}

#[handler]
pub async fn delete_user(
    Query(query): Query<IdQuery>,
    users: Data<&Arc<dyn UserStore>>,
) -> poem::Result<&'static str> {
    let id = required(query.id, "Missing user id")?;
    users.delete(&id).map_err(into_poem_error)?;
    Ok("User deleted successfully")
}

/// Look up one user by username
#[handler]
pub async fn query_user(
    Query(query): Query<UsernameQuery>,
    users: Data<&Arc<dyn UserStore>>,
) -> poem::Result<Json<UserRecord>> {
    let username = required(query.username, "Missing username")?;
    users
        .find_by_username(&username)
        .map_err(into_poem_error)?
        .map(Json)
        .ok_or_else(|| poem::Error::from_string("User not found", StatusCode::NOT_FOUND))
}

#[handler]
pub async fn list_users(users: Data<&Arc<dyn UserStore>>) -> poem::Result<Json<Vec<UserRecord>>> {
    Ok(Json(users.list().map_err(into_poem_error)?))
}

#[handler]
pub async fn sum_users(users: Data<&Arc<dyn UserStore>>) -> poem::Result<Json<UserCount>> {
    let count = users.count().map_err(into_poem_error)?;
    Ok(Json(UserCount { count }))
}
