use actix_web::{body::BoxBody, http::StatusCode, HttpResponse};
use error_stack::Report;
use serde::Serialize;

use super::Error;
use crate::{database, mailer, types::Error as ErrorType};

#[derive(Serialize)]
struct ErrorResponse<'a> {
    success: bool,
    #[serde(flatten)]
    error_type: &'a ErrorType,
    message: &'a str,
}

impl actix_web::ResponseError for Error {
    fn status_code(&self) -> StatusCode {
        match self.error_type {
            ErrorType::Internal => StatusCode::INTERNAL_SERVER_ERROR,
            ErrorType::InvalidOperation
            | ErrorType::InvalidRecipient
            | ErrorType::InvalidRequest => StatusCode::BAD_REQUEST,
            ErrorType::NotFound => StatusCode::NOT_FOUND,
            ErrorType::ReadonlyMode | ErrorType::ServiceUnavailable => {
                StatusCode::SERVICE_UNAVAILABLE
            }
            ErrorType::Unauthorized => StatusCode::UNAUTHORIZED,
            ErrorType::UpstreamFailure => StatusCode::BAD_GATEWAY,
        }
    }

    fn error_response(&self) -> HttpResponse<BoxBody> {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
        } else {
            tracing::debug!(error = %self, "request rejected");
        }

        HttpResponse::build(status).json(ErrorResponse {
            success: false,
            error_type: &self.error_type,
            message: &self.client_message(),
        })
    }
}

impl From<Report<database::Error>> for Error {
    fn from(value: Report<database::Error>) -> Self {
        match value.current_context() {
            database::Error::Readonly => Error::from_report(ErrorType::ReadonlyMode, value),
            _ => Error::from_report(ErrorType::Internal, value),
        }
    }
}

impl From<Report<mailer::Error>> for Error {
    fn from(value: Report<mailer::Error>) -> Self {
        let error_type = match value.current_context() {
            mailer::Error::InvalidRecipient(..) => ErrorType::InvalidRecipient,
            mailer::Error::ServiceUnavailable => ErrorType::ServiceUnavailable,
            mailer::Error::UpstreamFailure => ErrorType::UpstreamFailure,
        };
        let message = value.current_context().to_string();
        Error::from_report(error_type, value).message(message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::{body::MessageBody, ResponseError};
    use serde_json::json;

    #[test]
    fn should_render_json_envelope() {
        let error = Error::new(ErrorType::NotFound).message("User not found.");
        let response = error.error_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let body = response.into_body().try_into_bytes().unwrap();
        let body: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(
            body,
            json!({
                "success": false,
                "type": "not_found",
                "message": "User not found.",
            })
        );
    }

    #[test]
    fn should_map_readonly_database_errors() {
        let error = Error::from(Report::new(database::Error::Readonly));
        assert_eq!(error.as_type(), &ErrorType::ReadonlyMode);
        assert_eq!(error.status_code(), StatusCode::SERVICE_UNAVAILABLE);

        let error = Error::from(Report::new(database::Error::UnhealthyPool));
        assert_eq!(error.as_type(), &ErrorType::Internal);
    }

    #[test]
    fn should_fall_back_to_default_message() {
        let error = Error::new(ErrorType::Unauthorized);
        assert_eq!(error.client_message(), "Authentication required");
        assert_eq!(error.status_code(), StatusCode::UNAUTHORIZED);
    }
}
