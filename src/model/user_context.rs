use serde::{Deserialize, Serialize};

use crate::model::{Id, Timestamp};

/// Authenticated caller, taken from the bearer token claims.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CurrentUser {
    pub id: Id,
    pub email: String,
}

/// Claims carried by a bearer token: `{ id, email, exp }`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub id: Id,
    pub email: String,
    /// Expiration time (Unix timestamp)
    pub exp: i64,
    #[serde(default)]
    pub iat: Option<i64>,
}

impl From<Claims> for CurrentUser {
    fn from(claims: Claims) -> Self {
        Self {
            id: claims.id,
            email: claims.email,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: Id,
    pub email: String,
    pub name: Option<String>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserUpdate {
    pub name: Option<String>,
}
