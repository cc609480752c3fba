//! User model for storage and API.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Portal role carried in session claims.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Student,
    Faculty,
    Admin,
    Verifier,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Role::Student => "student",
            Role::Faculty => "faculty",
            Role::Admin => "admin",
            Role::Verifier => "verifier",
        };
        f.write_str(name)
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "student" => Ok(Role::Student),
            "faculty" => Ok(Role::Faculty),
            "admin" => Ok(Role::Admin),
            "verifier" => Ok(Role::Verifier),
            other => Err(format!("unknown role '{}'", other)),
        }
    }
}

/// User profile stored in the record store.
///
/// Accounts are provisioned by the identity service; this crate reads them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    /// User ID (also used as document ID)
    pub id: String,
    pub name: String,
    pub email: Option<String>,
    pub role: Role,
    /// Salted password hash, owned by the identity service
    #[serde(default)]
    pub password_hash: Option<String>,
    // Role-specific fields
    pub roll_number: Option<String>,
    pub department: Option<String>,
    pub employee_id: Option<String>,
    pub created_at: DateTime<Utc>,
}
