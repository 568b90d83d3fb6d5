use actix_web::{
    error::ResponseError,
    http::{header::ContentType, StatusCode},
    HttpResponse,
};
use p2p_market_engine::OfferFlowError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("Could not initialize server. {0}")]
    InitializeError(String),
    #[error("An error occurred on the backend of the server. {0}")]
    BackendError(String),
    #[error("The X-Requester-Id header is missing or is not a user id")]
    MissingRequester,
    #[error("Could not read request body: {0}")]
    InvalidRequestBody(String),
    #[error("An I/O error happened in the server. {0}")]
    IOError(#[from] std::io::Error),
    #[error("Invalid server configuration. {0}")]
    ConfigurationError(String),
    #[error("UnspecifiedError. {0}")]
    Unspecified(String),
    #[error("{0}")]
    OfferError(#[from] OfferFlowError),
}

impl ResponseError for ServerError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::MissingRequester => StatusCode::BAD_REQUEST,
            Self::InvalidRequestBody(_) => StatusCode::BAD_REQUEST,
            Self::InitializeError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::BackendError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::IOError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::ConfigurationError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Unspecified(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::OfferError(e) => match e {
                OfferFlowError::InvalidTerms(_) => StatusCode::BAD_REQUEST,
                OfferFlowError::NotRegistered(_) => StatusCode::FORBIDDEN,
                OfferFlowError::Unauthorized { .. } => StatusCode::FORBIDDEN,
                OfferFlowError::NotFound(_) => StatusCode::NOT_FOUND,
                OfferFlowError::InvalidState { .. } => StatusCode::CONFLICT,
                OfferFlowError::PaymentBackendError(_) => StatusCode::BAD_GATEWAY,
                OfferFlowError::BackendUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
                OfferFlowError::PersistenceError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code())
            .insert_header(ContentType::json())
            .body(serde_json::json!({ "error": self.to_string() }).to_string())
    }
}

#[cfg(test)]
mod test {
    use p2p_market_engine::db_types::{OfferAction, OfferStatusType};

    use super::*;

    #[test]
    fn offer_errors_map_to_statuses() {
        let cases = [
            (OfferFlowError::InvalidTerms("bad".into()), 400),
            (OfferFlowError::NotRegistered(1), 403),
            (
                OfferFlowError::Unauthorized {
                    offer_id: 1,
                    requester: 2,
                    action: OfferAction::Cancel,
                    status: OfferStatusType::Pending,
                },
                403,
            ),
            (OfferFlowError::NotFound(1), 404),
            (
                OfferFlowError::InvalidState {
                    offer_id: 1,
                    status: OfferStatusType::Paid,
                    action: OfferAction::Cancel,
                },
                409,
            ),
            (OfferFlowError::PaymentBackendError("down".into()), 502),
            (OfferFlowError::BackendUnavailable("down".into()), 503),
            (OfferFlowError::PersistenceError("disk".into()), 500),
        ];
        for (e, status) in cases {
            assert_eq!(ServerError::from(e).status_code().as_u16(), status);
        }
        assert_eq!(ServerError::MissingRequester.status_code(), StatusCode::BAD_REQUEST);
    }
}
