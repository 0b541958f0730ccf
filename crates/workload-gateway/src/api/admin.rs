use std::sync::Arc;

use api_types::LoginData;
use api_types::LoginResponse;
use api_types::SessionResponse;
use poem::handler;
use poem::http::StatusCode;
use poem::web::cookie::Cookie;
use poem::web::cookie::CookieJar;
use poem::web::Data;
use poem::web::Form;
use poem::web::Json;

use super::errors::into_poem_error;
use crate::auth::AuthProvider;
use crate::auth::Credentials;

/// Cookie carrying the administrator session token.
pub const SESSION_COOKIE: &str = "session_id";

/// Exchange form-encoded credentials for a session cookie.
#[handler]
pub async fn login(
    Form(credentials): Form<Credentials>,
    cookie_jar: &CookieJar,
    auth: Data<&Arc<dyn AuthProvider>>,
) -> poem::Result<Json<LoginResponse>> {
    let issued = auth.issue_session(&credentials).map_err(into_poem_error)?;

    let mut cookie = Cookie::new_with_str(SESSION_COOKIE, &issued.token);
    cookie.set_path("/");
    cookie.set_http_only(true);
    cookie_jar.add(cookie);

    Ok(Json(LoginResponse {
        status: "OK".to_string(),
        session_id: issued.token,
        data: LoginData {
            username: issued.user.username,
            email: issued.user.email,
        },
    }))
}

/// Report who owns the session cookie.
#[handler]
pub async fn current_session(
    cookie_jar: &CookieJar,
    auth: Data<&Arc<dyn AuthProvider>>,
) -> poem::Result<Json<SessionResponse>> {
    let username = cookie_jar
        .get(SESSION_COOKIE)
        .and_then(|cookie| auth.validate_session(cookie.value_str()));

    match username {
        Some(username) => Ok(Json(SessionResponse {
            status: "OK".to_string(),
            username,
        })),
        None => Err(poem::Error::from_string(
            "Invalid or expired session",
            StatusCode::UNAUTHORIZED,
        )),
    }
}
