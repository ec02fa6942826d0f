//! CurrentUser Extractor
//!
//! Handlers take `CurrentUser` as an argument; the value injected by
//! [`require_auth`](super::require_auth) is reused when present.

use axum::{extract::FromRequestParts, http::request::Parts};

use crate::auth::CurrentUser;
use crate::auth::middleware::authenticate;
use crate::core::ServerState;
use crate::utils::AppError;

impl FromRequestParts<ServerState> for CurrentUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &ServerState,
    ) -> Result<Self, Self::Rejection> {
        // Check if already extracted (from middleware)
        if let Some(user) = parts.extensions.get::<CurrentUser>() {
            return Ok(user.clone());
        }

        let user = authenticate(state, &parts.headers, &parts.uri).await?;
        parts.extensions.insert(user.clone());
        Ok(user)
    }
}
