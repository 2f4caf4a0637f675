use axum::extract::{Request, State};
use axum::http::{header, HeaderMap, StatusCode};
use axum::middleware::Next;
use axum::response::Response;
use axum::{Extension, Json};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use serde::{Deserialize, Serialize};
use service::auth::{AuthSession, AuthUser, LoginInput, RegisterInput};
use service::{Actor, Store};
use tracing::{info, warn};
use uuid::Uuid;

use crate::errors::JsonApiError;
use crate::state::AppState;

pub const AUTH_COOKIE: &str = "auth_token";

/// Identity attached to a request by [`require_auth`].
#[derive(Clone, Debug)]
pub struct Authenticated {
    pub user: AuthUser,
    pub token: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct LoginOutput {
    pub user_id: Uuid,
    pub email: String,
    pub name: String,
    pub access_token: String,
    pub refresh_token: String,
    pub token_type: String,
    pub expires_in: i64,
}

impl From<AuthSession> for LoginOutput {
    fn from(s: AuthSession) -> Self {
        Self {
            user_id: s.user.id,
            email: s.user.email,
            name: s.user.name,
            access_token: s.access_token,
            refresh_token: s.refresh_token,
            token_type: "Bearer".into(),
            expires_in: s.expires_in,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct RefreshInput {
    pub refresh_token: String,
}

fn session_cookie(token: String) -> Cookie<'static> {
    let mut cookie = Cookie::new(AUTH_COOKIE, token);
    cookie.set_path("/");
    cookie.set_http_only(true);
    cookie.set_secure(false);
    cookie.set_same_site(SameSite::Lax);
    cookie
}

#[utoipa::path(post, path = "/auth/register", tag = "auth", request_body = crate::openapi::RegisterRequest, responses((status = 201, description = "Registered"), (status = 400, description = "Bad Request"), (status = 409, description = "Conflict")))]
pub async fn register<S: Store>(
    State(state): State<AppState<S>>,
    Json(input): Json<RegisterInput>,
) -> Result<(StatusCode, Json<AuthUser>), JsonApiError> {
    let user = state.auth.register(input).await?;
    Ok((StatusCode::CREATED, Json(user)))
}

#[utoipa::path(post, path = "/auth/login", tag = "auth", request_body = crate::openapi::LoginRequest, responses((status = 200, description = "Logged In"), (status = 401, description = "Unauthorized")))]
pub async fn login<S: Store>(
    State(state): State<AppState<S>>,
    jar: CookieJar,
    Json(input): Json<LoginInput>,
) -> Result<(CookieJar, Json<LoginOutput>), JsonApiError> {
    let session = state.auth.login(input).await?;
    let jar = jar.add(session_cookie(session.access_token.clone()));
    Ok((jar, Json(session.into())))
}

#[utoipa::path(post, path = "/auth/refresh", tag = "auth", request_body = crate::openapi::RefreshRequest, responses((status = 200, description = "Refreshed"), (status = 401, description = "Unauthorized")))]
pub async fn refresh<S: Store>(
    State(state): State<AppState<S>>,
    jar: CookieJar,
    Json(input): Json<RefreshInput>,
) -> Result<(CookieJar, Json<LoginOutput>), JsonApiError> {
    let session = state.auth.refresh(&input.refresh_token).await?;
    let jar = jar.add(session_cookie(session.access_token.clone()));
    Ok((jar, Json(session.into())))
}

#[utoipa::path(post, path = "/auth/logout", tag = "auth", responses((status = 204, description = "Logged Out"), (status = 401, description = "Unauthorized")))]
pub async fn logout<S: Store>(
    State(state): State<AppState<S>>,
    Extension(auth): Extension<Authenticated>,
    jar: CookieJar,
) -> Result<(CookieJar, StatusCode), JsonApiError> {
    state.auth.logout(&auth.token).await?;
    let jar = jar.remove(Cookie::from(AUTH_COOKIE));
    Ok((jar, StatusCode::NO_CONTENT))
}

#[utoipa::path(get, path = "/auth/me", tag = "auth", responses((status = 200, description = "Current user"), (status = 401, description = "Unauthorized")))]
pub async fn me(Extension(auth): Extension<Authenticated>) -> Json<AuthUser> {
    Json(auth.user)
}

/// `Authorization: Bearer <token>` wins; the `auth_token` cookie is the fallback.
fn presented_token(headers: &HeaderMap, jar: &CookieJar) -> Result<String, JsonApiError> {
    if let Some(value) = headers.get(header::AUTHORIZATION) {
        let raw = value.to_str().map_err(|_| JsonApiError::unauthorized())?;
        return match raw.strip_prefix("Bearer ") {
            Some(token) if !token.trim().is_empty() => Ok(token.trim().to_string()),
            _ => {
                warn!("invalid Authorization format (expect Bearer)");
                Err(JsonApiError::unauthorized())
            }
        };
    }
    match jar.get(AUTH_COOKIE).map(|c| c.value().to_string()) {
        Some(token) if !token.is_empty() => Ok(token),
        _ => Err(JsonApiError::unauthorized()),
    }
}

/// Validates the access token and injects [`Actor`] and [`Authenticated`]
/// into the request extensions.
pub async fn require_auth<S: Store>(
    State(state): State<AppState<S>>,
    jar: CookieJar,
    mut req: Request,
    next: Next,
) -> Result<Response, JsonApiError> {
    let path = req.uri().path().to_string();
    let token = presented_token(req.headers(), &jar).inspect_err(|_| {
        warn!(path = %path, "missing or malformed credentials");
    })?;
    let (user, claims) = state.auth.authenticate(&token).await.map_err(|e| {
        info!(path = %path, error = %e, "token validation failed");
        JsonApiError::from(e)
    })?;
    req.extensions_mut().insert(Actor::user(claims.uid, claims.sub));
    req.extensions_mut().insert(Authenticated { user, token });
    Ok(next.run(req).await)
}

#[cfg(test)]
mod tests {
    use axum::http::HeaderValue;

    use super::*;

    #[test]
    fn bearer_header_wins_over_cookie() {
        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer abc"));
        let jar = CookieJar::new().add(Cookie::new(AUTH_COOKIE, "from-cookie"));
        assert_eq!(presented_token(&headers, &jar).ok().as_deref(), Some("abc"));
        assert_eq!(presented_token(&HeaderMap::new(), &jar).ok().as_deref(), Some("from-cookie"));
    }

    #[test]
    fn malformed_or_missing_credentials_are_rejected() {
        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Basic abc"));
        assert!(presented_token(&headers, &CookieJar::new()).is_err());
        assert!(presented_token(&HeaderMap::new(), &CookieJar::new()).is_err());
    }
}
