//! Session-cookie authentication for the JSON API and the dashboard.

use axum::http::HeaderMap;
use chrono::Utc;

use wegroup_core::domain::session::{hash_token, Session};
use wegroup_db::repositories::{SessionRepository, SqlSessionRepository};
use wegroup_db::DbPool;

use crate::api::ApiError;

pub const SESSION_COOKIE: &str = "wegroup_session";

/// Resolve the caller's session from the `wegroup_session` cookie. Every
/// failure mode collapses to 401; the response never reveals whether the
/// token was missing, unknown, or expired.
pub async fn authenticate(pool: &DbPool, headers: &HeaderMap) -> Result<Session, ApiError> {
    let token = session_token_from_headers(headers).ok_or_else(ApiError::unauthorized)?;

    let session = SqlSessionRepository::new(pool.clone())
        .find_by_token_hash(&hash_token(&token))
        .await
        .map_err(ApiError::internal)?
        .ok_or_else(ApiError::unauthorized)?;

    if session.is_expired(Utc::now()) {
        return Err(ApiError::unauthorized());
    }

    Ok(session)
}

fn session_token_from_headers(headers: &HeaderMap) -> Option<String> {
    let cookie_header = headers.get(axum::http::header::COOKIE)?.to_str().ok()?;
    cookie_header.split(';').map(str::trim).find_map(|pair| {
        let (name, value) = pair.split_once('=')?;
        (name == SESSION_COOKIE && !value.is_empty()).then(|| value.to_string())
    })
}

#[cfg(test)]
mod tests {
    use axum::http::{header, HeaderMap, HeaderValue};

    use super::session_token_from_headers;

    fn headers_with_cookie(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(header::COOKIE, HeaderValue::from_str(value).expect("header value"));
        headers
    }

    #[test]
    fn extracts_the_session_cookie_among_others() {
        let headers = headers_with_cookie("theme=dark; wegroup_session=tok-123; lang=en");
        assert_eq!(session_token_from_headers(&headers), Some("tok-123".to_string()));
    }

    #[test]
    fn missing_or_empty_cookie_yields_none() {
        assert_eq!(session_token_from_headers(&HeaderMap::new()), None);
        let headers = headers_with_cookie("wegroup_session=");
        assert_eq!(session_token_from_headers(&headers), None);
    }
}
