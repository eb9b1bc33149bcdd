use thiserror::Error;
use tracing::error;
use uuid::Uuid;

use crate::error::{ErrorMessage, HttpError};
use crate::service::mpesa::GatewayError;

#[derive(Error, Debug)]
pub enum ServiceError {
    #[error("{0}")]
    Authorization(String),

    #[error("User {0} does not own job {1}")]
    UnauthorizedJobAccess(Uuid, Uuid),

    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    NotFound(String),

    #[error("Payment gateway error: {0}")]
    Gateway(#[from] GatewayError),

    #[error("Invalid payment callback: {0}")]
    CallbackIntegrity(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl ServiceError {
    pub fn not_found(entity: &str, id: Uuid) -> Self {
        ServiceError::NotFound(format!("{} {} not found", entity, id))
    }
}

impl From<ServiceError> for HttpError {
    fn from(error: ServiceError) -> Self {
        match error {
            ServiceError::Authorization(_) | ServiceError::UnauthorizedJobAccess(_, _) => {
                HttpError::forbidden(error.to_string())
            }

            ServiceError::Validation(_) | ServiceError::CallbackIntegrity(_) => {
                HttpError::bad_request(error.to_string())
            }

            ServiceError::NotFound(_) => HttpError::not_found(error.to_string()),

            ServiceError::Gateway(_) => HttpError::bad_gateway(error.to_string()),

            ServiceError::Database(e) => {
                error!("Database error: {}", e);
                HttpError::server_error(ErrorMessage::ServerError.to_string())
            }
        }
    }
}
