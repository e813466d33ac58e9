#[cfg(test)]
#[path = "auth_test.rs"]
mod tests;

use crate::domain::models::ChatError;
use crate::domain::models::Credentials;
use crate::domain::models::SessionContext;

/// Gate in front of the chat. Plain equality against the configured
/// credentials, with one error for unknown users and wrong passwords alike.
pub struct AuthGate {
    credentials: Credentials,
}

impl AuthGate {
    pub fn new(credentials: Credentials) -> AuthGate {
        return AuthGate { credentials };
    }

    pub fn authenticate(&self, username: &str, password: &str) -> Result<(), ChatError> {
        match self.credentials.password_for(username) {
            Some(expected) if expected == password => return Ok(()),
            _ => return Err(ChatError::Authentication),
        }
    }

    pub fn login(
        &self,
        session: &mut SessionContext,
        username: &str,
        password: &str,
    ) -> Result<(), ChatError> {
        if let Err(err) = self.authenticate(username, password) {
            tracing::debug!(username = username, "Login rejected");
            return Err(err);
        }

        session.logged_in = true;
        session.username = Some(username.to_string());
        tracing::debug!(username = username, "Login accepted");

        return Ok(());
    }
}
