/// Shared types used across the codebase

use serde::{Deserialize, Serialize};

/// Roles a user account can hold
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    #[default]
    User,
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Admin => "admin",
        }
    }
}

impl std::str::FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "user" => Ok(Role::User),
            "admin" => Ok(Role::Admin),
            other => Err(format!("'{}' is not a valid role", other)),
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Document collections known to the store
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Collection {
    Products,
    Categories,
    Users,
}

impl Collection {
    pub fn name(&self) -> &'static str {
        match self {
            Collection::Products => "products",
            Collection::Categories => "categories",
            Collection::Users => "users",
        }
    }

    /// Fields whose values must be unique (case-insensitive) within the collection
    pub fn unique_fields(&self) -> &'static [&'static str] {
        match self {
            Collection::Users => &["email"],
            _ => &[],
        }
    }
}

impl std::fmt::Display for Collection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}
