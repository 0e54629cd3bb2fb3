use std::fmt;

/// Operator session issued by the external identity provider.
///
/// The console never validates the token itself; it forwards it as a bearer
/// credential on every tenant API call made on the operator's behalf.
#[derive(Clone)]
pub struct OperatorSession {
    access_token: String,
}

impl OperatorSession {
    pub fn new(access_token: impl Into<String>) -> Self {
        Self {
            access_token: access_token.into(),
        }
    }

    pub fn access_token(&self) -> &str {
        &self.access_token
    }
}

impl fmt::Debug for OperatorSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OperatorSession")
            .field("access_token", &"<redacted>")
            .finish()
    }
}
