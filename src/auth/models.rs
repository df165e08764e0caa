use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use super::types::UserSummary;

/// Database model for the users table
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct UserModel {
    pub id: String,
    pub email: String,
    /// bcrypt hash, never the plaintext password.
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
}

impl UserModel {
    pub fn new(email: String, password_hash: String) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            email,
            password_hash,
            created_at: Utc::now(),
        }
    }

    pub fn summary(&self) -> UserSummary {
        UserSummary {
            id: self.id.clone(),
            email: self.email.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_user_gets_unique_id() {
        let a = UserModel::new("a@example.com".to_string(), "hash".to_string());
        let b = UserModel::new("b@example.com".to_string(), "hash".to_string());

        assert!(!a.id.is_empty());
        assert_ne!(a.id, b.id);
    }

    #[test]
    fn test_summary_carries_no_password_hash() {
        let user = UserModel::new("a@example.com".to_string(), "secret-hash".to_string());

        let summary = user.summary();
        assert_eq!(summary.id, user.id);
        assert_eq!(summary.email, user.email);

        let value = serde_json::to_value(&summary).unwrap();
        assert!(value.get("password_hash").is_none());
    }

    #[test]
    fn test_model_serialization_skips_password_hash() {
        let user = UserModel::new("a@example.com".to_string(), "secret-hash".to_string());

        let value = serde_json::to_value(&user).unwrap();
        assert!(value.get("password_hash").is_none());
        assert_eq!(value["email"], "a@example.com");
    }
}
