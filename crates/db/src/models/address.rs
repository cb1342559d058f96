//! Delivery address domain types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use freshmart_core::{AddressId, UserId};

/// A saved delivery address.
#[derive(Debug, Clone, Serialize)]
pub struct Address {
    pub id: AddressId,
    #[serde(skip)]
    pub user_id: UserId,
    /// Free-form label such as "Home" or "Work".
    pub label: Option<String>,
    pub recipient: String,
    pub line1: String,
    pub line2: Option<String>,
    pub city: String,
    pub region: Option<String>,
    pub postal_code: String,
    pub phone: Option<String>,
    pub is_default: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Fields for creating or replacing an address.
#[derive(Debug, Clone, Deserialize)]
pub struct AddressInput {
    pub label: Option<String>,
    pub recipient: String,
    pub line1: String,
    pub line2: Option<String>,
    pub city: String,
    pub region: Option<String>,
    pub postal_code: String,
    pub phone: Option<String>,
    #[serde(default)]
    pub is_default: bool,
}

/// Longest value accepted for any address field.
const MAX_FIELD_LENGTH: usize = 200;

const MAX_PHONE_LENGTH: usize = 32;

impl AddressInput {
    /// Trim every field and turn blank optional fields into `None`.
    #[must_use]
    pub fn normalized(self) -> Self {
        fn opt(value: Option<String>) -> Option<String> {
            value
                .map(|v| v.trim().to_owned())
                .filter(|v| !v.is_empty())
        }
        Self {
            label: opt(self.label),
            recipient: self.recipient.trim().to_owned(),
            line1: self.line1.trim().to_owned(),
            line2: opt(self.line2),
            city: self.city.trim().to_owned(),
            region: opt(self.region),
            postal_code: self.postal_code.trim().to_uppercase(),
            phone: opt(self.phone),
            is_default: self.is_default,
        }
    }

    /// # Errors
    ///
    /// Returns a message naming the first missing or oversized field.
    pub fn validate(&self) -> Result<(), String> {
        let required = [
            ("recipient", &self.recipient),
            ("line1", &self.line1),
            ("city", &self.city),
            ("postal_code", &self.postal_code),
        ];
        for (field, value) in required {
            if value.trim().is_empty() {
                return Err(format!("{field} is required"));
            }
        }

        let all = [
            ("label", self.label.as_deref()),
            ("recipient", Some(self.recipient.as_str())),
            ("line1", Some(self.line1.as_str())),
            ("line2", self.line2.as_deref()),
            ("city", Some(self.city.as_str())),
            ("region", self.region.as_deref()),
            ("postal_code", Some(self.postal_code.as_str())),
            ("phone", self.phone.as_deref()),
        ];
        for (field, value) in all {
            if value.is_some_and(|v| v.chars().count() > MAX_FIELD_LENGTH) {
                return Err(format!("{field} must be at most {MAX_FIELD_LENGTH} characters"));
            }
        }
        if self
            .phone
            .as_deref()
            .is_some_and(|p| p.chars().count() > MAX_PHONE_LENGTH)
        {
            return Err(format!("phone must be at most {MAX_PHONE_LENGTH} characters"));
        }
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn input() -> AddressInput {
        AddressInput {
            label: Some("  ".to_owned()),
            recipient: " Ada Lovelace ".to_owned(),
            line1: "12 Market St".to_owned(),
            line2: None,
            city: "London".to_owned(),
            region: None,
            postal_code: "ec1a 1bb".to_owned(),
            phone: Some("+44 20 7946 0000".to_owned()),
            is_default: false,
        }
    }

    #[test]
    fn test_normalized_trims_and_clears_blank_fields() {
        let a = input().normalized();
        assert_eq!(a.label, None);
        assert_eq!(a.recipient, "Ada Lovelace");
        assert_eq!(a.postal_code, "EC1A 1BB");
        assert!(a.validate().is_ok());
    }

    #[test]
    fn test_validate_required_fields() {
        let mut a = input();
        a.city = "   ".to_owned();
        assert_eq!(a.validate().unwrap_err(), "city is required");
    }

    #[test]
    fn test_validate_phone_length() {
        let mut a = input();
        a.phone = Some("0".repeat(MAX_PHONE_LENGTH + 1));
        assert_eq!(a.validate().unwrap_err(), "phone must be at most 32 characters");
    }

    #[test]
    fn test_validate_length() {
        let mut a = input();
        a.line2 = Some("x".repeat(MAX_FIELD_LENGTH + 1));
        assert!(a.validate().unwrap_err().starts_with("line2"));
    }
}
