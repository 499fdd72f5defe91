//! Submit, approve and reject.

use std::sync::Arc;

use chrono::Utc;
use sqlx::SqlitePool;

use crate::{
    config::{Config, DecisionPolicy},
    error::AppError,
    models::employee_request::{
        Decision, DecisionForm, DecisionOutcome, EmployeeRequest, NewRequest, NewRequestForm,
    },
    repositories::{DecisionGuard, RequestRepositoryTrait},
    services::notification::{NotificationDispatcher, RequestEvent},
    types::RequestId,
};

#[derive(Clone)]
pub struct RequestLifecycleService {
    pool: SqlitePool,
    repo: Arc<dyn RequestRepositoryTrait>,
    notifier: Option<NotificationDispatcher>,
    default_approver_name: String,
    default_approver_email: String,
    decision_policy: DecisionPolicy,
}

impl RequestLifecycleService {
    pub fn new(
        pool: SqlitePool,
        repo: Arc<dyn RequestRepositoryTrait>,
        notifier: Option<NotificationDispatcher>,
        config: &Config,
    ) -> Self {
        Self {
            pool,
            repo,
            notifier,
            default_approver_name: config.default_approver_name.clone(),
            default_approver_email: config.default_approver_email.clone(),
            decision_policy: config.decision_policy,
        }
    }

    pub async fn submit(&self, form: NewRequestForm) -> Result<EmployeeRequest, AppError> {
        let request = NewRequest::try_from(form)?;
        let created = self.repo.insert(&self.pool, &request, Utc::now()).await?;

        tracing::info!(
            request_id = %created.id,
            request_type = %created.request_type(),
            department = ?created.department,
            "Request submitted"
        );
        self.notify(RequestEvent::Submitted(created.clone()));
        Ok(created)
    }

    pub async fn approve(
        &self,
        id: RequestId,
        form: DecisionForm,
    ) -> Result<EmployeeRequest, AppError> {
        self.decide(id, DecisionOutcome::Approved, form).await
    }

    pub async fn reject(
        &self,
        id: RequestId,
        form: DecisionForm,
    ) -> Result<EmployeeRequest, AppError> {
        self.decide(id, DecisionOutcome::Rejected, form).await
    }

    async fn decide(
        &self,
        id: RequestId,
        outcome: DecisionOutcome,
        form: DecisionForm,
    ) -> Result<EmployeeRequest, AppError> {
        let decision = Decision::from_form(
            outcome,
            form,
            &self.default_approver_name,
            &self.default_approver_email,
            Utc::now(),
        );
        let guard = match self.decision_policy {
            DecisionPolicy::Overwrite => DecisionGuard::Any,
            DecisionPolicy::PendingOnly => DecisionGuard::PendingOnly,
        };

        let Some(updated) = self
            .repo
            .apply_decision(&self.pool, id, &decision, guard)
            .await?
        else {
            // Nothing matched: either the id is unknown or the guard refused it.
            let existing = self.repo.find_by_id(&self.pool, id).await?;
            return Err(AppError::Conflict(format!(
                "Request {} is already {}",
                id, existing.status
            )));
        };

        tracing::info!(
            request_id = %id,
            outcome = outcome.verb(),
            approver = %decision.approver_name,
            "Request decided"
        );
        self.notify(RequestEvent::Decided {
            request: updated.clone(),
            outcome,
        });
        Ok(updated)
    }

    fn notify(&self, event: RequestEvent) {
        if let Some(notifier) = &self.notifier {
            notifier.dispatch(event);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        config::Environment,
        models::{
            employee_request::{Approval, LeaveDetails, RequestDetails},
            request::{Priority, RequestStatus},
        },
        repositories::MockRequestRepositoryTrait,
    };
    use chrono::NaiveDate;
    use mockall::predicate::*;

    fn lazy_pool() -> SqlitePool {
        SqlitePool::connect_lazy("sqlite::memory:").unwrap()
    }

    fn stored_leave(id: i64, status: RequestStatus) -> EmployeeRequest {
        let start = NaiveDate::from_ymd_opt(2025, 8, 4).unwrap();
        let end = NaiveDate::from_ymd_opt(2025, 8, 8).unwrap();
        EmployeeRequest {
            id: RequestId::new(id),
            employee_name: "Jan Kowalski".into(),
            employee_email: "jan.kowalski@company.local".into(),
            department: Some("IT".into()),
            submitted_at: Utc::now(),
            status,
            priority: Priority::Medium,
            details: RequestDetails::Leave(LeaveDetails::new(start, end, None)),
            approval: None,
        }
    }

    fn service(repo: MockRequestRepositoryTrait, policy: DecisionPolicy) -> RequestLifecycleService {
        let mut config = Config::for_environment(Environment::Testing);
        config.decision_policy = policy;
        RequestLifecycleService::new(lazy_pool(), Arc::new(repo), None, &config)
    }

    #[tokio::test]
    async fn submit_rejects_invalid_form_without_touching_storage() {
        let mut repo = MockRequestRepositoryTrait::new();
        repo.expect_insert().never();
        let service = service(repo, DecisionPolicy::Overwrite);

        let err = service.submit(NewRequestForm::default()).await.unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[tokio::test]
    async fn submit_persists_parsed_request() {
        let mut repo = MockRequestRepositoryTrait::new();
        repo.expect_insert()
            .withf(|_, request, _| {
                matches!(&request.details, RequestDetails::Leave(leave) if leave.leave_days == 5)
            })
            .times(1)
            .returning(|_, _, _| Ok(stored_leave(1, RequestStatus::Pending)));
        let service = service(repo, DecisionPolicy::Overwrite);

        let form = NewRequestForm {
            request_type: Some("leave".into()),
            employee_name: Some("Jan Kowalski".into()),
            employee_email: Some("jan.kowalski@company.local".into()),
            department: Some("IT".into()),
            leave_start_date: Some("2025-08-04".into()),
            leave_end_date: Some("2025-08-08".into()),
            ..Default::default()
        };
        let created = service.submit(form).await.unwrap();
        assert_eq!(created.id, RequestId::new(1));
        assert!(created.is_pending());
    }

    #[tokio::test]
    async fn approve_uses_default_approver_and_unguarded_update() {
        let mut repo = MockRequestRepositoryTrait::new();
        repo.expect_apply_decision()
            .withf(|_, id, decision, guard| {
                *id == RequestId::new(3)
                    && decision.approver_name == "Manager"
                    && decision.approver_email == "manager@company.local"
                    && decision.outcome == DecisionOutcome::Approved
                    && *guard == DecisionGuard::Any
            })
            .times(1)
            .returning(|_, _, decision, _| {
                let mut request = stored_leave(3, RequestStatus::Approved);
                request.approval = Some(Approval {
                    approver_name: decision.approver_name.clone(),
                    approver_email: decision.approver_email.clone(),
                    decided_at: decision.decided_at,
                    comments: decision.comments.clone(),
                });
                Ok(Some(request))
            });
        let service = service(repo, DecisionPolicy::Overwrite);

        let updated = service
            .approve(RequestId::new(3), DecisionForm::default())
            .await
            .unwrap();
        assert_eq!(updated.status, RequestStatus::Approved);
    }

    #[tokio::test]
    async fn decision_on_unknown_id_is_not_found() {
        let mut repo = MockRequestRepositoryTrait::new();
        repo.expect_apply_decision()
            .returning(|_, _, _, _| Ok(None));
        repo.expect_find_by_id()
            .with(always(), eq(RequestId::new(99999)))
            .returning(|_, id| Err(AppError::NotFound(format!("Request {} not found", id))));
        let service = service(repo, DecisionPolicy::Overwrite);

        let err = service
            .reject(RequestId::new(99999), DecisionForm::default())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn pending_only_policy_reports_conflict_for_decided_request() {
        let mut repo = MockRequestRepositoryTrait::new();
        repo.expect_apply_decision()
            .withf(|_, _, _, guard| *guard == DecisionGuard::PendingOnly)
            .returning(|_, _, _, _| Ok(None));
        repo.expect_find_by_id()
            .returning(|_, id| Ok(stored_leave(id.get(), RequestStatus::Approved)));
        let service = service(repo, DecisionPolicy::PendingOnly);

        let err = service
            .reject(RequestId::new(4), DecisionForm::default())
            .await
            .unwrap_err();
        match err {
            AppError::Conflict(message) => assert_eq!(message, "Request 4 is already approved"),
            other => panic!("expected conflict, got {other:?}"),
        }
    }
}
