//! Auth module: three-layer architecture (domain, repository, service).
//!
//! Registration, login and JWT issuing/decoding live here; the HTTP layer only
//! moves cookies and headers around.

pub mod domain;
pub mod errors;
pub mod repository;
pub mod service;
pub mod repo;

pub use domain::Claims;
pub use service::{decode_token, hash_password, AuthService};
