use axum::{Json, extract::State};
use serde::Deserialize;

use crate::domain::types::Credential;
use crate::error::AuthServiceError;
use crate::handlers::DataResponse;
use crate::state::AppState;
use crate::usecase::login::{InitLoginInput, InitLoginUseCase, LoginInput, LoginUseCase};

// ── POST /api/v1/users/init/login ────────────────────────────────────────────

#[derive(Deserialize)]
pub struct InitLoginRequest {
    pub username: String,
}

pub async fn init_login(
    State(state): State<AppState>,
    Json(body): Json<InitLoginRequest>,
) -> Result<Json<DataResponse<()>>, AuthServiceError> {
    let usecase = InitLoginUseCase {
        users: state.user_repo(),
        login_codes: state.login_code_repo(),
        sender: state.otp_sender.clone(),
    };
    usecase
        .execute(InitLoginInput {
            username: body.username,
        })
        .await?;
    Ok(Json(DataResponse::new(())))
}

// ── POST /api/v1/users/login ─────────────────────────────────────────────────

#[derive(Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub otp: String,
}

pub async fn login(
    State(state): State<AppState>,
    Json(body): Json<LoginRequest>,
) -> Result<Json<DataResponse<Credential>>, AuthServiceError> {
    let usecase = LoginUseCase {
        users: state.user_repo(),
        login_codes: state.login_code_repo(),
        transactioner: state.transactioner(),
        tokens: state.token_issuer.clone(),
    };
    let credential = usecase
        .execute(LoginInput {
            username: body.username,
            otp: body.otp,
        })
        .await?;
    Ok(Json(DataResponse::new(credential)))
}
