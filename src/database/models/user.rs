use serde::Deserialize;
use serde_json::Value;

use super::{trimmed, ValidationError, Violations};
use crate::database::store::Document;
use crate::types::Role;

pub const PASSWORD_MIN_CHARS: usize = 8;

/// Fields never sent back to clients
const HIDDEN_FIELDS: [&str; 2] = ["password", "__v"];

#[derive(Debug, Default, Deserialize)]
pub struct RegisterInput {
    pub name: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
}

/// A registration that passed validation; the password is still plain text
#[derive(Debug)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub password: String,
}

impl RegisterInput {
    pub fn validate(self) -> Result<NewUser, ValidationError> {
        let mut violations = Violations::default();
        let name = trimmed(self.name);
        let email = trimmed(self.email).map(|e| e.to_lowercase());
        let password = self.password.filter(|p| !p.is_empty());

        violations.check(name.is_some(), "Please tell us your name");
        match &email {
            None => violations.push("Please provide your email"),
            Some(email) => violations.check(is_valid_email(email), "Please provide a valid email"),
        }
        match &password {
            None => violations.push("Please provide a password"),
            Some(password) => violations.check(
                password.chars().count() >= PASSWORD_MIN_CHARS,
                "Password must be at least 8 characters",
            ),
        }

        violations.finish(NewUser {
            name: name.unwrap_or_default(),
            email: email.unwrap_or_default(),
            password: password.unwrap_or_default(),
        })
    }
}

impl NewUser {
    /// Stored form, with the password already hashed
    pub fn into_document(self, password_hash: String) -> Document {
        let mut doc = Document::new();
        doc.insert("name".into(), Value::from(self.name));
        doc.insert("email".into(), Value::from(self.email));
        doc.insert("password".into(), Value::from(password_hash));
        doc.insert("role".into(), Value::from(Role::User.as_str()));
        doc
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct LoginInput {
    pub email: Option<String>,
    pub password: Option<String>,
}

impl LoginInput {
    /// Both credentials, or `None` when either is missing or blank
    pub fn credentials(self) -> Option<(String, String)> {
        let email = trimmed(self.email)?.to_lowercase();
        let password = self.password.filter(|p| !p.is_empty())?;
        Some((email, password))
    }
}

/// Profile changes. `password` is only captured so it can be refused.
#[derive(Debug, Default, Deserialize)]
pub struct UserUpdate {
    pub name: Option<String>,
    pub email: Option<String>,
    pub role: Option<String>,
    pub password: Option<Value>,
}

impl UserUpdate {
    pub fn wants_password_change(&self) -> bool {
        match &self.password {
            None | Some(Value::Null) | Some(Value::Bool(false)) => false,
            Some(Value::String(s)) => !s.is_empty(),
            Some(_) => true,
        }
    }

    /// Validate the supplied fields; `role` is honoured only when `allow_role` is set
    pub fn into_changes(self, allow_role: bool) -> Result<Document, ValidationError> {
        let mut violations = Violations::default();
        let mut doc = Document::new();

        if let Some(name) = self.name {
            let name = name.trim().to_string();
            violations.check(!name.is_empty(), "Please tell us your name");
            doc.insert("name".into(), Value::from(name));
        }
        if let Some(email) = self.email {
            let email = email.trim().to_lowercase();
            violations.check(is_valid_email(&email), "Please provide a valid email");
            doc.insert("email".into(), Value::from(email));
        }
        if allow_role {
            if let Some(role) = self.role {
                match role.parse::<Role>() {
                    Ok(role) => {
                        doc.insert("role".into(), Value::from(role.as_str()));
                    }
                    Err(message) => violations.push(message),
                }
            }
        }
        violations.finish(doc)
    }
}

/// Strip the password hash and version before a user leaves the service
pub fn public_view(mut user: Document) -> Document {
    for field in HIDDEN_FIELDS {
        user.remove(field);
    }
    user
}

pub fn is_valid_email(email: &str) -> bool {
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    !local.is_empty()
        && !domain.contains('@')
        && !email.chars().any(char::is_whitespace)
        && domain
            .split_once('.')
            .map_or(false, |(host, tld)| !host.is_empty() && !tld.is_empty() && !tld.ends_with('.'))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn registration_normalizes_email() {
        let input = RegisterInput {
            name: Some("Ann".into()),
            email: Some(" Ann@Example.COM ".into()),
            password: Some("correct horse".into()),
        };
        let user = input.validate().unwrap();
        assert_eq!(user.email, "ann@example.com");

        let doc = user.into_document("hash".into());
        assert_eq!(doc["role"], json!("user"));
        assert_eq!(public_view(doc).get("password"), None);
    }

    #[test]
    fn registration_rejects_short_password_and_bad_email() {
        let input = RegisterInput {
            name: Some("Ann".into()),
            email: Some("not-an-email".into()),
            password: Some("short".into()),
        };
        let err = input.validate().unwrap_err();
        assert_eq!(
            err.0,
            vec![
                "Please provide a valid email",
                "Password must be at least 8 characters"
            ]
        );
    }

    #[test]
    fn login_requires_both_fields() {
        let missing = LoginInput {
            email: Some("a@b.co".into()),
            password: Some(String::new()),
        };
        assert!(missing.credentials().is_none());
    }

    #[test]
    fn email_shapes() {
        assert!(is_valid_email("a@b.co"));
        assert!(!is_valid_email("a@b"));
        assert!(!is_valid_email("@b.co"));
        assert!(!is_valid_email("a b@c.co"));
        assert!(!is_valid_email("a@@b.co"));
    }

    #[test]
    fn role_changes_are_admin_only() {
        let update: UserUpdate = serde_json::from_value(json!({"role": "admin"})).unwrap();
        assert!(update.into_changes(false).unwrap().is_empty());

        let update: UserUpdate = serde_json::from_value(json!({"role": "root"})).unwrap();
        assert!(update.into_changes(true).is_err());
    }

    #[test]
    fn password_presence_is_detected() {
        let update: UserUpdate = serde_json::from_value(json!({"password": "newsecret"})).unwrap();
        assert!(update.wants_password_change());
        let update: UserUpdate = serde_json::from_value(json!({"name": "Ann"})).unwrap();
        assert!(!update.wants_password_change());
    }
}
