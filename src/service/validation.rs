//! Request validation from the column rules of a table descriptor.

use crate::case::to_pascal_case;
use crate::entity::{to_row, Entity, EntityKey};
use crate::error::AppError;
use crate::table::Column;
use serde_json::Value;

pub struct RequestValidator;

impl RequestValidator {
    /// Check required fields and string lengths. Store-assigned keys are not checked.
    pub fn validate<E: Entity>(entity: &E) -> Result<(), AppError> {
        let table = E::table();
        let row = to_row(entity).map_err(|e| {
            tracing::error!(entity = E::NAME, op = "validate", error = %e, "could not serialize record");
            AppError::Internal(e.to_string())
        })?;
        for col in table.all_columns() {
            if col.name == table.key.name && E::Key::STORE_ASSIGNED {
                continue;
            }
            validate_field(col, row.get(col.name).unwrap_or(&Value::Null))?;
        }
        Ok(())
    }
}

fn validate_field(col: &Column, v: &Value) -> Result<(), AppError> {
    let field = to_pascal_case(col.name);
    let blank = match v {
        Value::Null => true,
        Value::String(s) => s.trim().is_empty(),
        _ => false,
    };
    if col.required && blank {
        return Err(AppError::Validation(format!("{} is required", field)));
    }
    if let (Some(max), Some(s)) = (col.max_length, v.as_str()) {
        if s.chars().count() > max as usize {
            return Err(AppError::Validation(format!(
                "{} must be at most {} characters",
                field, max
            )));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Customer, Shipper, SHIPPERS};
    use crate::table::Table;
    use serde::{Deserialize, Serialize};

    fn customer(id: &str) -> Customer {
        Customer {
            customer_id: id.into(),
            company_name: "Around the Horn".into(),
            contact_name: None,
            contact_title: None,
            address: None,
            city: Some("London".into()),
            region: None,
            postal_code: None,
            country: None,
            phone: None,
            fax: None,
        }
    }

    #[test]
    fn business_key_is_required_and_bounded() {
        assert!(RequestValidator::validate(&customer("AROUT")).is_ok());
        let err = RequestValidator::validate(&customer("  ")).unwrap_err();
        assert_eq!(err.to_string(), "validation: CustomerId is required");
        let err = RequestValidator::validate(&customer("AROUND")).unwrap_err();
        assert_eq!(
            err.to_string(),
            "validation: CustomerId must be at most 5 characters"
        );
    }

    #[test]
    fn surrogate_key_is_not_checked() {
        let shipper = Shipper {
            shipper_id: 0,
            company_name: "Speedy Express".into(),
            phone: Some("(503) 555-9831".into()),
        };
        assert!(RequestValidator::validate(&shipper).is_ok());
    }

    #[test]
    fn over_long_optional_field_is_rejected() {
        let mut c = customer("AROUT");
        c.city = Some("Llanfairpwllgwyngyll".into());
        let err = RequestValidator::validate(&c).unwrap_err();
        assert!(matches!(err, AppError::Validation(ref m) if m.starts_with("City")));
    }

    /// Serializes to a bare number instead of an object.
    #[derive(Clone, Debug, Serialize, Deserialize)]
    struct Scalar(i32);

    impl Entity for Scalar {
        type Key = i32;
        const NAME: &'static str = "scalar";

        fn table() -> &'static Table {
            &SHIPPERS
        }

        fn key(&self) -> i32 {
            self.0
        }

        fn set_key(&mut self, key: i32) {
            self.0 = key;
        }
    }

    #[test]
    fn unserializable_record_is_a_server_error() {
        let err = RequestValidator::validate(&Scalar(1)).unwrap_err();
        assert!(matches!(err, AppError::Internal(_)));
        assert_eq!(err.public_message(), "internal server error");
    }
}
