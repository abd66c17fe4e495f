use crate::domain::user::{ForgotPasswordRequest, ResetPasswordRequest};
use crate::presentation::handlers::{ApiError, AppState};
use actix_web::http::header;
use actix_web::{Either, HttpRequest, HttpResponse, web};
use tracing::{debug, info, instrument};

const LOGIN_PAGE: &str = "/login";

/// Bodies may arrive as JSON or as an urlencoded form.
type Body<T> = Either<web::Json<T>, web::Form<T>>;

fn into_payload<T>(body: Body<T>) -> T {
    match body {
        Either::Left(json) => json.into_inner(),
        Either::Right(form) => form.into_inner(),
    }
}

/// Extractor error handler for JSON and form bodies: a `{"msg"}` 400 without parser detail.
pub fn invalid_body(err: impl std::fmt::Display) -> actix_web::Error {
    debug!(error = %err, "Request body rejected");
    ApiError::Validation("Invalid request body".to_string()).into()
}

fn redirect_to_login() -> HttpResponse {
    HttpResponse::Found()
        .insert_header((header::LOCATION, LOGIN_PAGE))
        .finish()
}

#[instrument(skip(req, state, body))]
pub async fn forgot_password(
    req: HttpRequest,
    state: web::Data<AppState>,
    body: Body<ForgotPasswordRequest>,
) -> Result<HttpResponse, ApiError> {
    let ForgotPasswordRequest { email } = into_payload(body);
    let email = email
        .map(|e| e.trim().to_string())
        .filter(|e| !e.is_empty())
        .ok_or_else(|| ApiError::Validation("Email is required".to_string()))?;
    info!(email = %email, "Password reset requested");

    let base_url = match &state.public_url {
        Some(url) => url.clone(),
        None => {
            let conn = req.connection_info();
            format!("{}://{}", conn.scheme(), conn.host())
        }
    };

    state
        .password_service
        .forgot_password(&email, &base_url)
        .await?;
    Ok(redirect_to_login())
}

#[instrument(skip_all)]
pub async fn reset_password(
    state: web::Data<AppState>,
    path: web::Path<String>,
    body: Body<ResetPasswordRequest>,
) -> Result<HttpResponse, ApiError> {
    let ResetPasswordRequest { password } = into_payload(body);
    state
        .password_service
        .reset_password(&path, password.as_deref().unwrap_or_default())
        .await?;
    Ok(redirect_to_login())
}
