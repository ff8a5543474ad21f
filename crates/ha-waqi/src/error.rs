//! Error types for the WAQI integration

use thiserror::Error;

use crate::consts::{
    ABORT_ALREADY_CONFIGURED, CONF_API_TOKEN, ERROR_API_OVER_QUOTA, ERROR_API_TOKEN_INVALID,
    ERROR_UNKNOWN,
};
use ha_data_entry_flow::BASE;

/// Errors reported by a [`WaqiClient`](crate::WaqiClient)
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WaqiError {
    #[error("API over quota")]
    OverQuota,

    #[error("invalid API token")]
    InvalidToken,

    #[error("connection error: {0}")]
    Connection(String),

    #[error("{0}")]
    Other(String),
}

/// Why a setup step could not finish
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum SetupFailure {
    #[error("API quota exceeded")]
    QuotaExceeded,

    #[error("API token rejected")]
    InvalidCredential,

    #[error("no result")]
    EmptyResult,

    #[error("station already configured")]
    DuplicateStation,

    #[error("unknown failure")]
    UnknownFailure,
}

impl SetupFailure {
    /// Field and translation key for showing the failure on a form.
    ///
    /// `EmptyResult` is reported against the step's own input field.
    pub fn form_error(
        self,
        empty_field: &'static str,
        empty_key: &'static str,
    ) -> (&'static str, &'static str) {
        match self {
            SetupFailure::QuotaExceeded => (CONF_API_TOKEN, ERROR_API_OVER_QUOTA),
            SetupFailure::InvalidCredential => (CONF_API_TOKEN, ERROR_API_TOKEN_INVALID),
            SetupFailure::EmptyResult => (empty_field, empty_key),
            SetupFailure::DuplicateStation => (BASE, ABORT_ALREADY_CONFIGURED),
            SetupFailure::UnknownFailure => (BASE, ERROR_UNKNOWN),
        }
    }

    /// Reason reported when the failure ends the flow
    pub fn abort_reason(self) -> &'static str {
        match self {
            SetupFailure::DuplicateStation => ABORT_ALREADY_CONFIGURED,
            _ => self.form_error(BASE, ERROR_UNKNOWN).1,
        }
    }
}

impl From<&WaqiError> for SetupFailure {
    fn from(err: &WaqiError) -> Self {
        match err {
            WaqiError::OverQuota => SetupFailure::QuotaExceeded,
            WaqiError::InvalidToken => SetupFailure::InvalidCredential,
            WaqiError::Connection(_) | WaqiError::Other(_) => SetupFailure::UnknownFailure,
        }
    }
}
