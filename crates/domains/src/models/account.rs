use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Creator,
    Admin,
}

/// Which client application issued the request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ClientKind {
    /// The consumer game app
    App,
    /// The trail authoring tool
    Creator,
}

/// Caller identity, supplied by the auth layer in front of the engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountContext {
    pub account_id: Option<String>,
    pub account_type: String,
    pub role: Role,
    pub client: ClientKind,
}

impl AccountContext {
    pub fn user(account_id: impl Into<String>) -> Self {
        Self {
            account_id: Some(account_id.into()),
            account_type: "individual".to_string(),
            role: Role::User,
            client: ClientKind::App,
        }
    }

    pub fn with_role(mut self, role: Role) -> Self {
        self.role = role;
        self
    }

    pub fn with_client(mut self, client: ClientKind) -> Self {
        self.client = client;
        self
    }

    /// The account id, or `ACCOUNT_ID_REQUIRED` when the auth layer left it empty.
    pub fn require_account_id(&self) -> Result<&str> {
        match self.account_id.as_deref() {
            Some(id) if !id.is_empty() => Ok(id),
            _ => Err(AppError::AccountIdRequired),
        }
    }

    /// Admins working in the authoring tool see every spot.
    pub fn is_admin_on_creator_client(&self) -> bool {
        self.role == Role::Admin && self.client == ClientKind::Creator
    }
}
