pub mod lifecycle;
pub mod notification;
pub mod queries;

pub use lifecycle::RequestLifecycleService;
pub use notification::{NotificationDispatcher, RequestEvent};
pub use queries::{DashboardBreakdowns, RequestQueryService, RequestStats};
