use prediction_auth::PrincipalId;

/// Authenticated caller for a request.
///
/// Inserted by the auth middleware; present on every protected route.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrincipalContext {
    principal_id: PrincipalId,
    username: Option<String>,
}

impl PrincipalContext {
    pub fn new(principal_id: PrincipalId, username: Option<String>) -> Self {
        Self { principal_id, username }
    }

    pub fn principal_id(&self) -> PrincipalId {
        self.principal_id
    }

    pub fn username(&self) -> Option<&str> {
        self.username.as_deref()
    }
}
