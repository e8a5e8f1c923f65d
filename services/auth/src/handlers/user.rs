use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::domain::types::User;
use crate::error::AuthServiceError;
use crate::handlers::DataResponse;
use crate::handlers::auth::AuthenticatedUser;
use crate::state::AppState;
use crate::usecase::user::{GetUserUseCase, RegisterUserInput, RegisterUserUseCase};

// ── POST /api/v1/users ───────────────────────────────────────────────────────

#[derive(Deserialize)]
pub struct RegisterUserRequest {
    pub full_name: String,
    pub user_name: String,
    pub role: String,
}

pub async fn register_user(
    State(state): State<AppState>,
    Json(body): Json<RegisterUserRequest>,
) -> Result<(StatusCode, Json<DataResponse<User>>), AuthServiceError> {
    let usecase = RegisterUserUseCase {
        repo: state.user_repo(),
    };
    let user = usecase
        .execute(RegisterUserInput {
            full_name: body.full_name,
            username: body.user_name,
            role: body.role,
        })
        .await?;
    Ok((StatusCode::CREATED, Json(DataResponse::new(user))))
}

// ── GET /api/v1/users/{id} ───────────────────────────────────────────────────

pub async fn get_user(
    State(state): State<AppState>,
    _caller: AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> Result<Json<DataResponse<User>>, AuthServiceError> {
    let usecase = GetUserUseCase {
        repo: state.user_repo(),
    };
    let user = usecase.execute(id).await?;
    Ok(Json(DataResponse::new(user)))
}
