//! Visitor contact fields.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::errors::SessionError;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactInfo {
    pub first_name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
}

/// Partial contact update; `None` leaves a field untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContactUpdate {
    pub first_name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
}

impl ContactUpdate {
    pub fn is_empty(&self) -> bool {
        self.first_name.is_none() && self.email.is_none() && self.phone.is_none()
    }

    /// Reads contact fields out of a contact-info step answer.
    ///
    /// Accepts camelCase or snake_case keys.
    pub fn from_answer(answer: &Value) -> Self {
        let field = |camel: &str, snake: &str| {
            answer
                .get(camel)
                .or_else(|| answer.get(snake))
                .and_then(Value::as_str)
                .map(str::to_string)
        };
        Self {
            first_name: field("firstName", "first_name"),
            email: field("email", "email"),
            phone: field("phone", "phone"),
        }
    }

    /// Trims values and checks the email shape.
    pub fn normalized(self) -> Result<Self, SessionError> {
        let clean = |value: Option<String>| value.map(|v| v.trim().to_string());
        let update = Self {
            first_name: clean(self.first_name),
            email: clean(self.email).map(|e| e.to_lowercase()),
            phone: clean(self.phone),
        };

        if let Some(email) = update.email.as_deref() {
            if !email.is_empty() && !looks_like_email(email) {
                return Err(SessionError::validation("email", "not a valid email address"));
            }
        }
        Ok(update)
    }
}

impl ContactInfo {
    /// Applies `update`, returning true when anything changed.
    ///
    /// Empty strings clear a field.
    pub fn apply(&mut self, update: ContactUpdate) -> bool {
        let mut changed = false;
        for (slot, value) in [
            (&mut self.first_name, update.first_name),
            (&mut self.email, update.email),
            (&mut self.phone, update.phone),
        ] {
            if let Some(value) = value {
                let next = (!value.is_empty()).then_some(value);
                if *slot != next {
                    *slot = next;
                    changed = true;
                }
            }
        }
        changed
    }

    pub fn has_reachable_channel(&self) -> bool {
        self.email.is_some() || self.phone.is_some()
    }
}

fn looks_like_email(email: &str) -> bool {
    match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty() && domain.contains('.') && !domain.starts_with('.') && !domain.ends_with('.')
        }
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn apply_reports_changes() {
        let mut contact = ContactInfo::default();
        let changed = contact.apply(ContactUpdate {
            email: Some("sam@example.com".into()),
            ..Default::default()
        });
        assert!(changed);
        assert_eq!(contact.email.as_deref(), Some("sam@example.com"));

        let again = contact.apply(ContactUpdate {
            email: Some("sam@example.com".into()),
            ..Default::default()
        });
        assert!(!again);
    }

    #[test]
    fn empty_string_clears_field() {
        let mut contact = ContactInfo {
            phone: Some("+15550100".into()),
            ..Default::default()
        };
        assert!(contact.apply(ContactUpdate {
            phone: Some(String::new()),
            ..Default::default()
        }));
        assert_eq!(contact.phone, None);
    }

    #[test]
    fn from_answer_reads_either_case() {
        let update = ContactUpdate::from_answer(&json!({"first_name": "Sam", "email": "s@x.io"}));
        assert_eq!(update.first_name.as_deref(), Some("Sam"));

        let update = ContactUpdate::from_answer(&json!({"firstName": "Ada"}));
        assert_eq!(update.first_name.as_deref(), Some("Ada"));
        assert_eq!(update.email, None);
    }

    #[test]
    fn normalized_lowercases_and_validates_email() {
        let update = ContactUpdate {
            email: Some("  Sam@Example.COM ".into()),
            ..Default::default()
        }
        .normalized()
        .unwrap();
        assert_eq!(update.email.as_deref(), Some("sam@example.com"));

        let bad = ContactUpdate {
            email: Some("not-an-email".into()),
            ..Default::default()
        };
        assert!(bad.normalized().is_err());
    }
}
