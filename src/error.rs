/// Failures that carry a stable machine-readable code in `--json` output.
#[derive(thiserror::Error, Debug)]
pub enum PlanError {
    #[error("{0}")]
    Validation(String),
    #[error("permission denied: {0}")]
    PermissionDenied(String),
    #[error("{0} not found: {1}")]
    NotFound(&'static str, String),
    #[error("not logged in (run `fieldplan login`)")]
    NotLoggedIn,
    #[error("invalid username or password")]
    InvalidCredentials,
}

impl PlanError {
    pub fn code(&self) -> &'static str {
        match self {
            PlanError::Validation(_) => "VALIDATION",
            PlanError::PermissionDenied(_) => "PERMISSION_DENIED",
            PlanError::NotFound(..) => "NOT_FOUND",
            PlanError::NotLoggedIn => "AUTH_REQUIRED",
            PlanError::InvalidCredentials => "AUTH_FAILED",
        }
    }
}

pub fn validation(msg: impl Into<String>) -> anyhow::Error {
    PlanError::Validation(msg.into()).into()
}

pub fn not_found(kind: &'static str, id: &str) -> anyhow::Error {
    PlanError::NotFound(kind, id.to_string()).into()
}

pub fn error_code(err: &anyhow::Error) -> &'static str {
    err.downcast_ref::<PlanError>()
        .map(PlanError::code)
        .unwrap_or("INTERNAL")
}
