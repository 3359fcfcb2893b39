use serde::{Deserialize, Serialize};

use crate::CoreError;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    Passenger,
    Driver,
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Passenger => "PASSENGER",
            Role::Driver => "DRIVER",
            Role::Admin => "ADMIN",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "PASSENGER" => Some(Role::Passenger),
            "DRIVER" => Some(Role::Driver),
            "ADMIN" => Some(Role::Admin),
            _ => None,
        }
    }
}

/// The authenticated caller, as handed over by the identity collaborator.
/// The engine never issues or verifies credentials itself; it only consumes
/// the principal attached to each privileged request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Principal {
    pub id: String,
    pub email: Option<String>,
    pub roles: Vec<Role>,
}

impl Principal {
    pub fn has_role(&self, role: Role) -> bool {
        self.roles.contains(&role)
    }

    pub fn require_role(&self, role: Role) -> Result<(), CoreError> {
        if self.has_role(role) {
            Ok(())
        } else {
            Err(CoreError::Forbidden(format!(
                "{} role required",
                role.as_str()
            )))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_checks() {
        let principal = Principal {
            id: "user-1".to_string(),
            email: None,
            roles: vec![Role::Passenger, Role::Driver],
        };
        assert!(principal.has_role(Role::Driver));
        assert!(principal.require_role(Role::Passenger).is_ok());
        assert!(matches!(
            principal.require_role(Role::Admin),
            Err(CoreError::Forbidden(_))
        ));
    }
}
