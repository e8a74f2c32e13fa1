//! Identity resolution middleware.
//!
//! The caller's identity arrives as an `X-User-Id` header (a UUID minted by
//! the auth frontend). When the header is absent and demo mode is enabled,
//! a fixed synthetic user is substituted after upserting its row; otherwise
//! the request is rejected with 401 before any side-effecting work.

use axum::extract::{Request, State};
use axum::http::HeaderMap;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use uuid::Uuid;

use crate::error::ApiError;
use crate::state::AppState;

/// Resolved request identity, inserted into request extensions.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub id: String,
    pub is_demo: bool,
}

/// Middleware that resolves the caller's identity or rejects with 401.
pub async fn require_user(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Response {
    match resolve_user(&state, req.headers()).await {
        Ok(user) => {
            req.extensions_mut().insert(user);
            next.run(req).await
        }
        Err(e) => e.into_response(),
    }
}

async fn resolve_user(state: &AppState, headers: &HeaderMap) -> Result<AuthUser, ApiError> {
    if let Some(value) = headers.get("x-user-id") {
        let raw = value.to_str().map_err(|_| ApiError::Unauthorized)?;
        let id = Uuid::parse_str(raw.trim()).map_err(|_| ApiError::Unauthorized)?;
        return Ok(AuthUser {
            id: id.to_string(),
            is_demo: false,
        });
    }

    if state.config.demo_mode {
        state
            .users
            .ensure(&state.config.demo_user_id, &state.config.demo_user_email)
            .await?;
        return Ok(AuthUser {
            id: state.config.demo_user_id.clone(),
            is_demo: true,
        });
    }

    Err(ApiError::Unauthorized)
}
