//! Shopper identity.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::id::UserId;

/// A shopper owning at most one cart.
///
/// There is no authentication; a user is just a stable key for cart lookups.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: UserId,
    pub created_at: DateTime<Utc>,
}
