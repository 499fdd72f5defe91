use std::{sync::Arc, time::Duration};

use async_trait::async_trait;
use tokio::sync::mpsc;
use request_tracker_backend::{
    config::DecisionPolicy,
    error::AppError,
    models::{
        employee_request::{DecisionForm, RequestDetails},
        request::{Priority, RequestStatus},
    },
    services::{
        notification::{EmailMessage, MailTransport, NotificationError},
        NotificationDispatcher,
    },
    state::AppState,
    types::RequestId,
};

mod support;

use support::{leave_form, purchase_form, submit, test_config, test_pool, test_state};

struct RecordingTransport {
    sent: mpsc::UnboundedSender<EmailMessage>,
}

impl RecordingTransport {
    fn new() -> (Self, mpsc::UnboundedReceiver<EmailMessage>) {
        let (sent, received) = mpsc::unbounded_channel();
        (Self { sent }, received)
    }
}

#[async_trait]
impl MailTransport for RecordingTransport {
    async fn send(&self, message: &EmailMessage) -> Result<(), NotificationError> {
        self.sent
            .send(message.clone())
            .expect("receiver alive while test runs");
        Ok(())
    }
}

async fn next_message(received: &mut mpsc::UnboundedReceiver<EmailMessage>) -> EmailMessage {
    tokio::time::timeout(Duration::from_secs(5), received.recv())
        .await
        .expect("notification delivered in time")
        .expect("transport still open")
}

struct FailingTransport;

#[async_trait]
impl MailTransport for FailingTransport {
    async fn send(&self, _message: &EmailMessage) -> Result<(), NotificationError> {
        Err(NotificationError::Lookup(AppError::BadRequest(
            "mail server unreachable".into(),
        )))
    }
}

#[tokio::test]
async fn submitted_leave_is_pending_with_inclusive_days() {
    let pool = test_pool().await;

    let created = submit(
        &pool,
        leave_form("Jan Kowalski", Some("IT"), "2025-07-01", "2025-07-05"),
    )
    .await;

    assert_eq!(created.status, RequestStatus::Pending);
    assert_eq!(created.priority, Priority::Medium);
    assert!(created.approval.is_none());
    let RequestDetails::Leave(leave) = &created.details else {
        panic!("expected leave details");
    };
    assert_eq!(leave.leave_days, 5);
}

#[tokio::test]
async fn submitted_purchase_keeps_parsed_numbers() {
    let pool = test_pool().await;

    let created = submit(&pool, purchase_form("Anna Nowak", Some("HR"), "Chair")).await;

    let RequestDetails::Purchase(purchase) = &created.details else {
        panic!("expected purchase details");
    };
    assert_eq!(purchase.item_description, "Chair");
    assert_eq!(purchase.quantity, 2);
    assert!((purchase.estimated_cost - 250.5).abs() < 1e-9);
}

#[tokio::test]
async fn invalid_submission_writes_nothing() {
    let pool = test_pool().await;
    let state = test_state(pool.clone());

    let err = state
        .lifecycle()
        .submit(leave_form("Jan Kowalski", None, "2025-07-01", "not-a-date"))
        .await
        .unwrap_err();

    assert!(matches!(err, AppError::Validation(_)));
    assert_eq!(state.queries().stats().await.unwrap().total, 0);
}

#[tokio::test]
async fn approve_stamps_decision_with_default_approver() {
    let pool = test_pool().await;
    let created = submit(&pool, purchase_form("Anna Nowak", Some("HR"), "Desk")).await;
    let state = test_state(pool);

    let approved = state
        .lifecycle()
        .approve(
            created.id,
            DecisionForm {
                comments: Some("Fine".into()),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    assert_eq!(approved.status, RequestStatus::Approved);
    let approval = approved.approval.expect("approval stamp");
    assert_eq!(approval.approver_name, "Manager");
    assert_eq!(approval.approver_email, "manager@company.local");
    assert_eq!(approval.comments, "Fine");
}

#[tokio::test]
async fn later_decision_overwrites_earlier_one() {
    let pool = test_pool().await;
    let created = submit(&pool, purchase_form("Anna Nowak", None, "Laptop")).await;
    let lifecycle = test_state(pool).lifecycle();

    lifecycle
        .approve(
            created.id,
            DecisionForm {
                approver_name: Some("Alice".into()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    let rejected = lifecycle
        .reject(
            created.id,
            DecisionForm {
                approver_name: Some("Bob".into()),
                comments: Some("Changed my mind".into()),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    assert_eq!(rejected.status, RequestStatus::Rejected);
    let approval = rejected.approval.expect("approval stamp");
    assert_eq!(approval.approver_name, "Bob");
    assert_eq!(approval.comments, "Changed my mind");
}

#[tokio::test]
async fn pending_only_policy_refuses_second_decision() {
    let pool = test_pool().await;
    let created = submit(&pool, purchase_form("Anna Nowak", None, "Laptop")).await;
    let mut config = test_config();
    config.decision_policy = DecisionPolicy::PendingOnly;
    let lifecycle = AppState::new(pool, config, None).lifecycle();

    lifecycle
        .approve(created.id, DecisionForm::default())
        .await
        .unwrap();
    let err = lifecycle
        .reject(created.id, DecisionForm::default())
        .await
        .unwrap_err();

    assert!(matches!(err, AppError::Conflict(_)));
}

#[tokio::test]
async fn deciding_unknown_request_is_not_found() {
    let pool = test_pool().await;
    let existing = submit(&pool, purchase_form("Anna Nowak", Some("HR"), "Desk")).await;
    let state = test_state(pool);

    let err = state
        .lifecycle()
        .approve(RequestId::new(99999), DecisionForm::default())
        .await
        .unwrap_err();

    assert!(matches!(err, AppError::NotFound(_)));
    let all = state.queries().all().await.unwrap();
    assert_eq!(all.len(), 1);
    assert_eq!(all[0].id, existing.id);
    assert_eq!(all[0].status, RequestStatus::Pending);
    assert!(all[0].approval.is_none());
}

#[tokio::test]
async fn lifecycle_notifies_manager_then_employee() {
    let pool = test_pool().await;
    let (transport, mut received) = RecordingTransport::new();
    let dispatcher = NotificationDispatcher::new(pool.clone(), Arc::new(transport));
    let lifecycle = AppState::new(pool, test_config(), Some(dispatcher)).lifecycle();

    let created = lifecycle
        .submit(leave_form("Jan Kowalski", Some("IT"), "2025-07-01", "2025-07-02"))
        .await
        .unwrap();
    let to_manager = next_message(&mut received).await;
    assert_eq!(to_manager.to, "manager.it@company.local");
    assert_eq!(to_manager.subject, "New request: leave - Jan Kowalski");

    lifecycle
        .approve(
            created.id,
            DecisionForm {
                comments: Some("Enjoy".into()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    let to_employee = next_message(&mut received).await;
    assert_eq!(to_employee.to, "jan.kowalski@company.local");
    assert_eq!(to_employee.subject, "Your request has been approved");
    assert!(to_employee.body.contains("Comments: Enjoy"));
}

#[tokio::test]
async fn failed_writes_roll_back_and_leave_state_unchanged() {
    let pool = test_pool().await;
    let existing = submit(&pool, purchase_form("Anna Nowak", Some("HR"), "Desk")).await;
    for trigger in [
        "CREATE TRIGGER reject_request_insert BEFORE INSERT ON requests \
         BEGIN SELECT RAISE(ABORT, 'disk full'); END",
        "CREATE TRIGGER reject_request_update BEFORE UPDATE ON requests \
         BEGIN SELECT RAISE(ABORT, 'disk full'); END",
    ] {
        sqlx::query(trigger).execute(&pool).await.expect("create trigger");
    }
    let state = test_state(pool);

    let submit_err = state
        .lifecycle()
        .submit(purchase_form("Ewa Lis", None, "Mouse"))
        .await
        .unwrap_err();
    assert!(matches!(submit_err, AppError::InternalServerError(_)));

    let approve_err = state
        .lifecycle()
        .approve(existing.id, DecisionForm::default())
        .await
        .unwrap_err();
    assert!(matches!(approve_err, AppError::InternalServerError(_)));

    let stats = state.queries().stats().await.unwrap();
    assert_eq!(stats.total, 1);
    assert_eq!(stats.pending, 1);
    assert_eq!(stats.approved, 0);
    let stored = state.queries().all().await.unwrap();
    assert_eq!(stored[0].status, RequestStatus::Pending);
    assert!(stored[0].approval.is_none());
}

#[tokio::test]
async fn failing_notifications_do_not_undo_the_write() {
    let pool = test_pool().await;
    let dispatcher = NotificationDispatcher::new(pool.clone(), Arc::new(FailingTransport));
    let state = AppState::new(pool, test_config(), Some(dispatcher));

    let created = state
        .lifecycle()
        .submit(purchase_form("Anna Nowak", Some("Finance"), "Printer"))
        .await
        .unwrap();
    let approved = state
        .lifecycle()
        .approve(created.id, DecisionForm::default())
        .await
        .unwrap();

    assert_eq!(approved.status, RequestStatus::Approved);
    let stats = state.queries().stats().await.unwrap();
    assert_eq!(stats.total, 1);
    assert_eq!(stats.approved, 1);
}
