pub mod common;
pub mod department;
pub mod request;
pub mod request_repository;
pub mod transaction;

pub use department::DepartmentRepository;
pub use request::{DecisionGuard, Filter, Grouping, RequestFilters, FILTER_ALL};
pub use request_repository::{RequestRepository, RequestRepositoryTrait};
pub use transaction::*;

#[cfg(test)]
pub use request_repository::MockRequestRepositoryTrait;
