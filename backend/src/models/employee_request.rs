use anyhow::anyhow;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

use crate::{
    error::AppError,
    models::request::{Priority, RequestStatus, RequestType},
    types::RequestId,
    validation::{self, rules},
};

/// Column list shared by every query that materialises a [`RequestRow`].
pub const REQUEST_COLUMNS: &str = "id, request_type, employee_name, employee_email, department, \
     submission_date, status, priority, leave_start_date, leave_end_date, leave_days, leave_reason, \
     item_description, quantity, estimated_cost, justification, approver_name, approver_email, \
     approval_date, approver_comments";

/// Inclusive number of calendar days between two dates.
///
/// Total for any pair of dates: when `end` precedes `start` the count is zero
/// or negative. Callers that need a valid window check it separately.
pub fn inclusive_day_count(start: NaiveDate, end: NaiveDate) -> i64 {
    (end - start).num_days() + 1
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LeaveDetails {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub leave_days: i64,
    pub reason: Option<String>,
}

impl LeaveDetails {
    pub fn new(start_date: NaiveDate, end_date: NaiveDate, reason: Option<String>) -> Self {
        Self {
            start_date,
            end_date,
            leave_days: inclusive_day_count(start_date, end_date),
            reason,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PurchaseDetails {
    pub item_description: String,
    pub quantity: i64,
    pub estimated_cost: f64,
    pub justification: Option<String>,
}

/// Variant-specific part of a request. Exactly one variant's fields exist.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "request_type", rename_all = "snake_case")]
pub enum RequestDetails {
    Leave(LeaveDetails),
    Purchase(PurchaseDetails),
}

impl RequestDetails {
    pub fn request_type(&self) -> RequestType {
        match self {
            RequestDetails::Leave(_) => RequestType::Leave,
            RequestDetails::Purchase(_) => RequestType::Purchase,
        }
    }
}

/// Stamp left by the last approve/reject decision.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Approval {
    pub approver_name: String,
    pub approver_email: String,
    pub decided_at: DateTime<Utc>,
    pub comments: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmployeeRequest {
    pub id: RequestId,
    pub employee_name: String,
    pub employee_email: String,
    pub department: Option<String>,
    pub submitted_at: DateTime<Utc>,
    pub status: RequestStatus,
    pub priority: Priority,
    #[serde(flatten)]
    pub details: RequestDetails,
    pub approval: Option<Approval>,
}

impl EmployeeRequest {
    pub fn request_type(&self) -> RequestType {
        self.details.request_type()
    }

    pub fn is_pending(&self) -> bool {
        self.status.is_pending()
    }
}

/// Flat mirror of the `requests` table.
#[derive(Debug, Clone, FromRow)]
pub struct RequestRow {
    pub id: RequestId,
    pub request_type: RequestType,
    pub employee_name: String,
    pub employee_email: String,
    pub department: Option<String>,
    pub submission_date: DateTime<Utc>,
    pub status: RequestStatus,
    pub priority: Priority,
    pub leave_start_date: Option<NaiveDate>,
    pub leave_end_date: Option<NaiveDate>,
    pub leave_days: Option<i64>,
    pub leave_reason: Option<String>,
    pub item_description: Option<String>,
    pub quantity: Option<i64>,
    pub estimated_cost: Option<f64>,
    pub justification: Option<String>,
    pub approver_name: Option<String>,
    pub approver_email: Option<String>,
    pub approval_date: Option<DateTime<Utc>>,
    pub approver_comments: Option<String>,
}

impl RequestRow {
    fn has_leave_fields(&self) -> bool {
        self.leave_start_date.is_some()
            || self.leave_end_date.is_some()
            || self.leave_days.is_some()
            || self.leave_reason.is_some()
    }

    fn has_purchase_fields(&self) -> bool {
        self.item_description.is_some()
            || self.quantity.is_some()
            || self.estimated_cost.is_some()
            || self.justification.is_some()
    }
}

impl TryFrom<RequestRow> for EmployeeRequest {
    type Error = anyhow::Error;

    fn try_from(row: RequestRow) -> Result<Self, Self::Error> {
        let details = match row.request_type {
            RequestType::Leave => {
                if row.has_purchase_fields() {
                    return Err(anyhow!("leave request {} carries purchase fields", row.id));
                }
                let (start_date, end_date) = row
                    .leave_start_date
                    .zip(row.leave_end_date)
                    .ok_or_else(|| anyhow!("leave request {} is missing its dates", row.id))?;
                RequestDetails::Leave(LeaveDetails {
                    start_date,
                    end_date,
                    leave_days: row
                        .leave_days
                        .unwrap_or_else(|| inclusive_day_count(start_date, end_date)),
                    reason: row.leave_reason,
                })
            }
            RequestType::Purchase => {
                if row.has_leave_fields() {
                    return Err(anyhow!("purchase request {} carries leave fields", row.id));
                }
                RequestDetails::Purchase(PurchaseDetails {
                    item_description: row.item_description.unwrap_or_default(),
                    quantity: row.quantity.unwrap_or(1),
                    estimated_cost: row.estimated_cost.unwrap_or(0.0),
                    justification: row.justification,
                })
            }
        };

        let approval = match (row.approver_name, row.approver_email, row.approval_date) {
            (Some(approver_name), Some(approver_email), Some(decided_at)) => Some(Approval {
                approver_name,
                approver_email,
                decided_at,
                comments: row.approver_comments.unwrap_or_default(),
            }),
            (None, None, None) => None,
            _ => return Err(anyhow!("request {} has a partial approval stamp", row.id)),
        };

        Ok(EmployeeRequest {
            id: row.id,
            employee_name: row.employee_name,
            employee_email: row.employee_email,
            department: row.department,
            submitted_at: row.submission_date,
            status: row.status,
            priority: row.priority,
            details,
            approval,
        })
    }
}

/// A validated submission, ready to be persisted.
#[derive(Debug, Clone, PartialEq)]
pub struct NewRequest {
    pub employee_name: String,
    pub employee_email: String,
    pub department: Option<String>,
    pub priority: Priority,
    pub details: RequestDetails,
}

/// Raw `/new-request` form. Every field is text so that malformed numbers can
/// fall back to their defaults instead of rejecting the whole submission.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct NewRequestForm {
    pub request_type: Option<String>,
    #[validate(required, length(min = 1, max = 100))]
    pub employee_name: Option<String>,
    #[validate(required, email, length(max = 100))]
    pub employee_email: Option<String>,
    #[validate(length(max = 50))]
    pub department: Option<String>,
    pub priority: Option<String>,
    pub leave_start_date: Option<String>,
    pub leave_end_date: Option<String>,
    pub leave_reason: Option<String>,
    pub item_description: Option<String>,
    pub quantity: Option<String>,
    pub estimated_cost: Option<String>,
    pub justification: Option<String>,
}

impl NewRequestForm {
    /// Trims every field and drops the ones left empty, as browsers submit
    /// blank inputs as empty strings.
    pub fn normalized(self) -> Self {
        Self {
            request_type: rules::normalize_text(self.request_type),
            employee_name: rules::normalize_text(self.employee_name),
            employee_email: rules::normalize_text(self.employee_email),
            department: rules::normalize_text(self.department),
            priority: rules::normalize_text(self.priority),
            leave_start_date: rules::normalize_text(self.leave_start_date),
            leave_end_date: rules::normalize_text(self.leave_end_date),
            leave_reason: rules::normalize_text(self.leave_reason),
            item_description: rules::normalize_text(self.item_description),
            quantity: rules::normalize_text(self.quantity),
            estimated_cost: rules::normalize_text(self.estimated_cost),
            justification: rules::normalize_text(self.justification),
        }
    }

    fn leave_details(&self, errors: &mut Vec<String>) -> Option<RequestDetails> {
        let start = rules::parse_form_date("leave_start_date", self.leave_start_date.as_deref())
            .map_err(|e| errors.push(e))
            .ok();
        let end = rules::parse_form_date("leave_end_date", self.leave_end_date.as_deref())
            .map_err(|e| errors.push(e))
            .ok();
        let (start, end) = start.zip(end)?;
        if let Err(err) = rules::validate_leave_window(start, end) {
            errors.push(format!("leave_end_date: {}", err.code));
            return None;
        }
        Some(RequestDetails::Leave(LeaveDetails::new(
            start,
            end,
            self.leave_reason.clone(),
        )))
    }

    fn purchase_details(&self, errors: &mut Vec<String>) -> Option<RequestDetails> {
        let Some(item_description) = self.item_description.clone() else {
            errors.push("item_description: required".to_string());
            return None;
        };
        Some(RequestDetails::Purchase(PurchaseDetails {
            item_description,
            quantity: rules::parse_quantity(self.quantity.as_deref()),
            estimated_cost: rules::parse_estimated_cost(self.estimated_cost.as_deref()),
            justification: self.justification.clone(),
        }))
    }
}

impl TryFrom<NewRequestForm> for NewRequest {
    type Error = AppError;

    fn try_from(form: NewRequestForm) -> Result<Self, Self::Error> {
        let form = form.normalized();
        let mut errors = match form.validate() {
            Ok(()) => Vec::new(),
            Err(err) => validation::messages(&err),
        };

        let request_type = match form.request_type.as_deref() {
            None => {
                errors.push("request_type: required".to_string());
                None
            }
            Some(value) => match value.parse::<RequestType>() {
                Ok(request_type) => Some(request_type),
                Err(_) => {
                    errors.push("request_type: invalid".to_string());
                    None
                }
            },
        };

        let priority = match form.priority.as_deref() {
            None => Priority::default(),
            Some(value) => value.parse().unwrap_or_else(|_| {
                errors.push("priority: invalid".to_string());
                Priority::default()
            }),
        };

        let details = match request_type {
            Some(RequestType::Leave) => form.leave_details(&mut errors),
            Some(RequestType::Purchase) => form.purchase_details(&mut errors),
            None => None,
        };

        if !errors.is_empty() {
            errors.sort();
            return Err(AppError::Validation(errors));
        }
        let details = details.ok_or_else(|| AppError::validation("request_type: required"))?;

        Ok(NewRequest {
            employee_name: form.employee_name.unwrap_or_default(),
            employee_email: form.employee_email.unwrap_or_default(),
            department: form.department,
            priority,
            details,
        })
    }
}

/// Outcome of an approve/reject transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DecisionOutcome {
    Approved,
    Rejected,
}

impl DecisionOutcome {
    pub fn status(&self) -> RequestStatus {
        match self {
            DecisionOutcome::Approved => RequestStatus::Approved,
            DecisionOutcome::Rejected => RequestStatus::Rejected,
        }
    }

    pub fn verb(&self) -> &'static str {
        match self {
            DecisionOutcome::Approved => "approved",
            DecisionOutcome::Rejected => "rejected",
        }
    }
}

/// Raw approve/reject form.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DecisionForm {
    pub approver_name: Option<String>,
    pub approver_email: Option<String>,
    pub comments: Option<String>,
}

/// A decision ready to be stamped onto a request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Decision {
    pub outcome: DecisionOutcome,
    pub approver_name: String,
    pub approver_email: String,
    pub comments: String,
    pub decided_at: DateTime<Utc>,
}

impl Decision {
    pub fn from_form(
        outcome: DecisionOutcome,
        form: DecisionForm,
        default_name: &str,
        default_email: &str,
        decided_at: DateTime<Utc>,
    ) -> Self {
        Self {
            outcome,
            approver_name: rules::normalize_text(form.approver_name)
                .unwrap_or_else(|| default_name.to_string()),
            approver_email: rules::normalize_text(form.approver_email)
                .unwrap_or_else(|| default_email.to_string()),
            comments: form.comments.map(|c| c.trim().to_string()).unwrap_or_default(),
            decided_at,
        }
    }
}
