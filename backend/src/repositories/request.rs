//! Filter and grouping types for request queries.

use std::str::FromStr;

use crate::models::request::{RequestStatus, RequestType, UnknownVariant};

/// Query-string sentinel meaning "do not filter on this column".
pub const FILTER_ALL: &str = "all";

/// Either no filter or an exact match on one value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Filter<T> {
    #[default]
    All,
    Only(T),
}

impl<T> Filter<T> {
    pub fn value(&self) -> Option<&T> {
        match self {
            Filter::All => None,
            Filter::Only(value) => Some(value),
        }
    }
}

impl<T> Filter<T>
where
    T: FromStr<Err = UnknownVariant>,
{
    /// Parses an optional query value; absent and `all` both mean no filter.
    pub fn parse(value: Option<&str>) -> Result<Self, UnknownVariant> {
        match value.map(str::trim) {
            None | Some("") => Ok(Filter::All),
            Some(v) if v.eq_ignore_ascii_case(FILTER_ALL) => Ok(Filter::All),
            Some(v) => v.parse().map(Filter::Only),
        }
    }
}

/// Filters for listing requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RequestFilters {
    pub status: Filter<RequestStatus>,
    pub request_type: Filter<RequestType>,
}

impl RequestFilters {
    pub fn pending() -> Self {
        Self {
            status: Filter::Only(RequestStatus::Pending),
            request_type: Filter::All,
        }
    }
}

/// Column a count breakdown is grouped by.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Grouping {
    Status,
    RequestType,
    Department,
}

impl Grouping {
    pub fn column(&self) -> &'static str {
        match self {
            Grouping::Status => "status",
            Grouping::RequestType => "request_type",
            Grouping::Department => "department",
        }
    }
}

/// Precondition applied when stamping a decision onto a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecisionGuard {
    /// Overwrite whatever decision the request carries.
    Any,
    /// Only update a request that is still pending.
    PendingOnly,
}
