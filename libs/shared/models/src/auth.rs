use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize)]
pub struct JwtClaims {
    pub sub: String,
    pub exp: Option<u64>,
    pub iat: Option<u64>,
    pub email: Option<String>,
    /// "paciente", "nutricionista" or "admin".
    pub tipo: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Paciente,
    Nutricionista,
    Admin,
}

impl Role {
    pub fn from_claim(tipo: Option<&str>) -> Self {
        match tipo {
            Some("admin") => Role::Admin,
            Some("nutricionista") => Role::Nutricionista,
            _ => Role::Paciente,
        }
    }
}

/// Authenticated caller identity, injected into request extensions by the
/// auth middleware and passed explicitly into every service call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthUser {
    pub id: String,
    pub email: Option<String>,
    pub role: Role,
    pub authenticated_at: Option<DateTime<Utc>>,
}

impl AuthUser {
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }

    pub fn is_patient(&self) -> bool {
        self.role == Role::Paciente
    }

    /// Owner-or-admin capability check used by every cell.
    pub fn can_access(&self, owner_id: &str) -> bool {
        self.is_admin() || self.id == owner_id
    }
}
