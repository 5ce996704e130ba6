//! # Yatube Core
//!
//! The domain layer of Yatube.
//! Entities, ports, pagination, form validation and the request semantics of
//! every blog page live here, free of any infrastructure dependency.

pub mod domain;
pub mod error;
pub mod forms;
pub mod pagination;
pub mod ports;
pub mod service;

pub use error::{DomainError, RepoError};
pub use pagination::{Page, PageMeta, Paginator};
pub use service::BlogService;
