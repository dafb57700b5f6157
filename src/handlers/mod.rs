pub mod general;
pub mod payroll;

use crate::errors::AppError;
use axum::extract::{FromRequest, FromRequestParts};

/// `axum::Json` whose rejections surface as `AppError::Validation`.
#[derive(FromRequest)]
#[from_request(via(axum::Json), rejection(AppError))]
pub struct AppJson<T>(pub T);

/// `axum::extract::Query` whose rejections surface as `AppError::Validation`.
#[derive(FromRequestParts)]
#[from_request(via(axum::extract::Query), rejection(AppError))]
pub struct AppQuery<T>(pub T);
