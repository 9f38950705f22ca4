use axum::{
    Json, Router,
    extract::{
        Query, State,
        rejection::{JsonRejection, QueryRejection},
    },
    http::StatusCode,
    response::{Html, IntoResponse},
    routing::{get, post},
};
use minijinja::context;
use serde::{Deserialize, Serialize};
use tracing::info;

use super::user::{AuthSession, Backend, Credentials, UserProfile};
use crate::{
    error::{ApiResponse, AppError, AppResult},
    router::AppState,
};

#[derive(Debug, Deserialize)]
pub struct PopupParams {
    mode: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct Registration {
    name: Option<String>,
    email: String,
    password: String,
}

#[derive(Debug, Serialize)]
pub struct AuthResponse {
    success: bool,
    message: &'static str,
    token: String,
    user: UserProfile,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/login", get(self::get::popup))
        .route("/api/auth/login", post(self::post::login))
        .route("/api/auth/register", post(self::post::register))
        .route("/api/auth/logout", post(self::post::logout))
}

fn session_error(err: axum_login::Error<Backend>) -> AppError {
    match err {
        axum_login::Error::Backend(err) => err.into(),
        other => AppError::Internal(other.to_string()),
    }
}

fn require(value: &str, message: &str) -> AppResult<()> {
    if value.trim().is_empty() {
        return Err(AppError::Validation(message.to_string()));
    }
    Ok(())
}

mod post {
    use super::*;

    pub async fn login(
        mut auth_session: AuthSession,
        payload: Result<Json<Credentials>, JsonRejection>,
    ) -> AppResult<Json<AuthResponse>> {
        let Json(creds) = payload?;
        require(&creds.email, "Email and password are required")?;
        require(&creds.password, "Email and password are required")?;

        let user = auth_session
            .authenticate(creds)
            .await
            .map_err(session_error)?
            .ok_or_else(|| AppError::Authorization("Invalid email or password".to_string()))?;

        auth_session.login(&user).await.map_err(session_error)?;
        let token = auth_session.backend.issue_token(user.clone()).await?;
        info!(user_id = %user.id, "user logged in");

        Ok(Json(AuthResponse {
            success: true,
            message: "Login successful",
            token,
            user: UserProfile::from(&user),
        }))
    }

    pub async fn register(
        mut auth_session: AuthSession,
        payload: Result<Json<Registration>, JsonRejection>,
    ) -> AppResult<impl IntoResponse> {
        let Json(Registration {
            name,
            email,
            password,
        }) = payload?;
        let name = name.unwrap_or_default();
        let message = "Name, email and password are required";
        require(&name, message)?;
        require(&email, message)?;
        require(&password, message)?;

        let user = auth_session
            .backend
            .register(name, email, password)
            .await?
            .ok_or_else(|| AppError::Conflict("User already exists".to_string()))?;

        auth_session.login(&user).await.map_err(session_error)?;
        let token = auth_session.backend.issue_token(user.clone()).await?;
        info!(user_id = %user.id, "user registered");

        Ok((
            StatusCode::CREATED,
            Json(AuthResponse {
                success: true,
                message: "Registration successful",
                token,
                user: UserProfile::from(&user),
            }),
        ))
    }

    pub async fn logout(mut auth_session: AuthSession) -> AppResult<Json<ApiResponse<()>>> {
        auth_session.logout().await.map_err(session_error)?;
        Ok(Json(ApiResponse::message("Logged out")))
    }
}

mod get {
    use super::*;

    /// Login/sign-up popup. `?mode=register` opens on the sign-up form.
    pub async fn popup(
        State(state): State<AppState>,
        params: Result<Query<PopupParams>, QueryRejection>,
    ) -> AppResult<Html<String>> {
        let Query(PopupParams { mode }) = params?;
        let register = mode.as_deref() == Some("register");
        let html = state
            .templates
            .get_template("auth_popup.html")
            .and_then(|tmpl| tmpl.render(context! { register => register }))
            .map_err(|e| AppError::Internal(e.to_string()))?;
        Ok(Html(html))
    }
}
