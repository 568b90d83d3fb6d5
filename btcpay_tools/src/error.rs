use thiserror::Error;

#[derive(Debug, Error)]
pub enum BtcPayApiError {
    #[error("Could not initialize client: {0}")]
    Initialization(String),
    #[error("Could not reach BTCPay Server: {0}")]
    RestResponseError(String),
    #[error("Could not deserialize JSON: {0}")]
    JsonError(String),
    #[error("Query failed. Error {status}. {message}")]
    QueryError { status: u16, message: String },
    #[error("The response did not include a {0}")]
    MissingField(String),
    #[error("Invalid BTCPay Server URL: {0}")]
    InvalidUrl(String),
}

impl BtcPayApiError {
    /// True if trying again later might succeed: the server could not be reached, or it reported a problem on its
    /// side.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::RestResponseError(_) => true,
            Self::QueryError { status, .. } => *status >= 500 || *status == 429,
            _ => false,
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn transient_errors() {
        assert!(BtcPayApiError::RestResponseError("connection refused".into()).is_transient());
        assert!(BtcPayApiError::QueryError { status: 503, message: String::new() }.is_transient());
        assert!(BtcPayApiError::QueryError { status: 429, message: String::new() }.is_transient());
        assert!(!BtcPayApiError::QueryError { status: 401, message: "bad token".into() }.is_transient());
        assert!(!BtcPayApiError::MissingField("checkoutLink".into()).is_transient());
    }
}
