//! Data models shared across database access and handlers.

pub mod department;
pub mod employee_request;
pub mod request;
