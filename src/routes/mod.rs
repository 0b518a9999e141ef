pub mod cards;
pub mod health;
pub mod league;
pub mod players;
pub mod stats;
pub mod teams;

use std::fmt::Display;

use crate::error::ApiError;

/// Reject `value` unless `min <= value <= max`.
pub(crate) fn check_range(name: &str, value: i64, min: i64, max: i64) -> Result<(), ApiError> {
    if (min..=max).contains(&value) {
        Ok(())
    } else {
        Err(ApiError::BadRequest(format!(
            "{} must be between {} and {}",
            name, min, max
        )))
    }
}

pub(crate) fn check_min(name: &str, value: i64, min: i64) -> Result<(), ApiError> {
    if value >= min {
        Ok(())
    } else {
        Err(ApiError::BadRequest(format!("{} must be at least {}", name, min)))
    }
}

/// Log an external-service failure and hide it behind a generic 503 message.
pub(crate) fn upstream<E: Display>(message: &'static str) -> impl FnOnce(E) -> ApiError {
    move |err| {
        tracing::error!("{}: {}", message, err);
        ApiError::Upstream(message.to_string())
    }
}

/// Map a write failure: constraint violations are the client's fault, the rest are ours.
pub(crate) fn write_error(message: &'static str) -> impl FnOnce(sqlx::Error) -> ApiError {
    move |err| {
        if crate::error::is_constraint_violation(&err) {
            tracing::error!("{}: {}", message, err);
            ApiError::BadRequest(message.to_string())
        } else {
            ApiError::DatabaseError(err)
        }
    }
}
