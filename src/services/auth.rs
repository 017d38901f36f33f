use serde::Serialize;

use crate::config::AppConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Superadmin,
}

/// Authentication lives behind this seam so the scheduling core never sees
/// credentials or session storage.
pub trait AuthProvider: Send + Sync {
    fn authenticate(&self, email: &str, password: &str) -> Option<Role>;

    /// Resolves an API bearer token to the session's role, if any.
    fn current_session(&self, token: &str) -> Option<Role>;
}

/// Credential map from configuration, one account per role.
pub struct ConfigAuthProvider {
    accounts: Vec<(String, String, Role)>,
    api_token: String,
}

impl ConfigAuthProvider {
    pub fn from_config(config: &AppConfig) -> Self {
        let mut accounts = Vec::new();
        if !config.admin_email.is_empty() {
            accounts.push((
                config.admin_email.clone(),
                config.admin_password.clone(),
                Role::Admin,
            ));
        }
        if !config.superadmin_email.is_empty() {
            accounts.push((
                config.superadmin_email.clone(),
                config.superadmin_password.clone(),
                Role::Superadmin,
            ));
        }
        Self {
            accounts,
            api_token: config.api_token.clone(),
        }
    }
}

impl AuthProvider for ConfigAuthProvider {
    fn authenticate(&self, email: &str, password: &str) -> Option<Role> {
        self.accounts
            .iter()
            .find(|(e, p, _)| e == email && p == password && !p.is_empty())
            .map(|(_, _, role)| *role)
    }

    fn current_session(&self, token: &str) -> Option<Role> {
        (!self.api_token.is_empty() && token == self.api_token).then_some(Role::Admin)
    }
}
