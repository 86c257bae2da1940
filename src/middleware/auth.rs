use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};

use crate::error::AppError;
use crate::models::{CurrentUser, UserRole};
use crate::services::UserService;
use crate::AppState;

/// Authentication middleware
/// Extracts and validates JWT from Authorization header
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let auth_header = request
        .headers()
        .get("Authorization")
        .and_then(|h| h.to_str().ok());

    let token = match auth_header.and_then(|h| h.strip_prefix("Bearer ")) {
        Some(token) => token,
        None => {
            return Err(AppError::Unauthorized(
                "Missing or invalid Authorization header".to_string(),
            ));
        }
    };

    let claims = state.identity.verify(token)?;

    // Tokens of deleted accounts stop working immediately
    let user = UserService::get_user(state.engine.db().pool(), &claims.sub)
        .await
        .map_err(|_| AppError::Unauthorized("Invalid token".to_string()))?;

    let current_user = CurrentUser {
        id: user.id,
        email: user.email,
        role: UserRole::parse(&user.role),
    };

    request.extensions_mut().insert(current_user);

    Ok(next.run(request).await)
}
