use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use super::Sub;

/// Directory record for a participant. Only display enrichment lives here;
/// identity itself is owned by the authentication collaborator.
#[derive(Clone, Debug, Deserialize, Serialize, FromRow)]
pub struct User {
    pub sub: String,
    pub name: String,
    pub avatar: Option<String>,
}

/// Display info attached to outgoing message notifications.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct DisplayInfo {
    pub name: String,
    pub avatar: Option<String>,
}

impl From<User> for DisplayInfo {
    fn from(user: User) -> Self {
        Self {
            name: user.name,
            avatar: user.avatar,
        }
    }
}

impl DisplayInfo {
    /// Fallback when the directory has no record for a sender.
    pub fn raw(sub: &Sub) -> Self {
        Self {
            name: sub.0.clone(),
            avatar: None,
        }
    }
}
