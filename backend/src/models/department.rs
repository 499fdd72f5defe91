use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::types::DepartmentId;

/// Static reference data: a department and who approves its requests.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Department {
    pub id: DepartmentId,
    pub name: String,
    pub manager_email: Option<String>,
}

/// Department rows inserted when the registry is empty.
pub const DEFAULT_DEPARTMENTS: [(&str, &str); 4] = [
    ("IT", "manager.it@company.local"),
    ("HR", "manager.hr@company.local"),
    ("Finance", "manager.finance@company.local"),
    ("Operations", "manager.ops@company.local"),
];
