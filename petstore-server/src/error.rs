use axum::{
    extract::rejection::{FormRejection, JsonRejection, PathRejection, QueryRejection},
    http::StatusCode,
    response::{Html, IntoResponse, Response},
    Json,
};
use petstore_types::{ErrorDetail, OAuthErrorResponse};

pub type Result<T> = std::result::Result<T, ApiError>;

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("Pet with this ID already exists")]
    DuplicatePet { id: i64 },

    #[error("Pet not found")]
    PetNotFound { id: i64 },

    /// Request body, path or form data did not match the expected shape.
    #[error("{0}")]
    Validation(String),

    #[error(transparent)]
    Auth(#[from] crate::auth::AuthError),

    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("invalid_grant")]
    InvalidGrant,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::DuplicatePet { .. } => detail(StatusCode::BAD_REQUEST, &self),
            ApiError::PetNotFound { .. } => detail(StatusCode::NOT_FOUND, &self),
            ApiError::Validation(_) => detail(StatusCode::UNPROCESSABLE_ENTITY, &self),
            ApiError::Auth(err) => err.into_response(),
            ApiError::InvalidCredentials => {
                (StatusCode::UNAUTHORIZED, Html(self.to_string())).into_response()
            }
            ApiError::InvalidGrant => (
                StatusCode::BAD_REQUEST,
                Json(OAuthErrorResponse::invalid_grant()),
            )
                .into_response(),
        }
    }
}

fn detail(status: StatusCode, err: &ApiError) -> Response {
    (status, Json(ErrorDetail::new(err.to_string()))).into_response()
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::Validation(rejection.body_text())
    }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        ApiError::Validation(rejection.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        ApiError::Validation(rejection.body_text())
    }
}

impl From<FormRejection> for ApiError {
    fn from(rejection: FormRejection) -> Self {
        ApiError::Validation(rejection.body_text())
    }
}
