//! # Yatube Shared
//!
//! Wire types for the HTTP surface: auth and admin DTOs plus the
//! RFC 7807 error body.

pub mod dto;
pub mod response;

pub use response::{ApiResponse, ErrorResponse};
