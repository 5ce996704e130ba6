use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// User entity - an author, commenter and follower.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    pub username: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub is_staff: bool,
    pub created_at: DateTime<Utc>,
}

impl User {
    /// Create a new user with generated ID and timestamp.
    pub fn new(username: String, password_hash: String) -> Self {
        Self {
            id: Uuid::new_v4(),
            username,
            password_hash,
            is_staff: false,
            created_at: Utc::now(),
        }
    }

    pub fn staff(mut self) -> Self {
        self.is_staff = true;
        self
    }

    /// Usernames are 1-150 characters of letters, digits and `@.+-_`.
    pub fn validate_username(username: &str) -> Result<(), String> {
        if username.is_empty() {
            return Err("username must not be empty".to_string());
        }
        if username.chars().count() > 150 {
            return Err("username must be at most 150 characters".to_string());
        }
        if !username
            .chars()
            .all(|c| c.is_alphanumeric() || "@.+-_".contains(c))
        {
            return Err("username may contain only letters, digits and @/./+/-/_".to_string());
        }
        Ok(())
    }

    /// Roles carried in access tokens issued for this user.
    pub fn roles(&self) -> Vec<String> {
        let mut roles = vec!["user".to_string()];
        if self.is_staff {
            roles.push("admin".to_string());
        }
        roles
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn staff_users_get_admin_role() {
        let user = User::new("leo".to_string(), "hash".to_string());
        assert_eq!(user.roles(), vec!["user".to_string()]);

        let admin = user.staff();
        assert_eq!(admin.roles(), vec!["user".to_string(), "admin".to_string()]);
    }

    #[test]
    fn username_rules() {
        assert!(User::validate_username("TestUser").is_ok());
        assert!(User::validate_username("a.b+c-d_e@f").is_ok());
        assert!(User::validate_username("").is_err());
        assert!(User::validate_username("with space").is_err());
        assert!(User::validate_username(&"x".repeat(151)).is_err());
    }
}
