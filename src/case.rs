//! Field name conversion between the wire (PascalCase, e.g. `CompanyName`) and store columns (snake_case, e.g. `company_name`).

use serde_json::{Map, Value};

/// Convert a single identifier from snake_case to PascalCase.
/// e.g. "supplier_id" -> "SupplierId", "ship_postal_code" -> "ShipPostalCode"
pub fn to_pascal_case(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut capitalize_next = true;
    for c in s.chars() {
        if c == '_' {
            capitalize_next = true;
        } else if capitalize_next {
            out.extend(c.to_uppercase());
            capitalize_next = false;
        } else {
            out.push(c);
        }
    }
    out
}

/// Convert a single identifier from PascalCase (or camelCase) to snake_case.
/// e.g. "SupplierId" -> "supplier_id", "HomePage" -> "home_page"
pub fn to_snake_case(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 4);
    for (i, c) in s.chars().enumerate() {
        if c.is_uppercase() {
            if i > 0 {
                out.push('_');
            }
            out.extend(c.to_lowercase());
        } else {
            out.push(c);
        }
    }
    out
}

/// Rename all keys of a JSON object from wire names to column names.
pub fn keys_to_columns(fields: Map<String, Value>) -> Map<String, Value> {
    fields
        .into_iter()
        .map(|(k, v)| (to_snake_case(&k), v))
        .collect()
}

/// Rename all keys of a JSON object from column names to wire names.
pub fn keys_to_fields(row: Map<String, Value>) -> Map<String, Value> {
    row.into_iter()
        .map(|(k, v)| (to_pascal_case(&k), v))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pascal_case_from_columns() {
        assert_eq!(to_pascal_case("supplier_id"), "SupplierId");
        assert_eq!(to_pascal_case("ship_postal_code"), "ShipPostalCode");
        assert_eq!(to_pascal_case("fax"), "Fax");
    }

    #[test]
    fn snake_case_from_fields() {
        assert_eq!(to_snake_case("SupplierId"), "supplier_id");
        assert_eq!(to_snake_case("HomePage"), "home_page");
        assert_eq!(to_snake_case("shipVia"), "ship_via");
    }

    #[test]
    fn object_keys_survive_both_directions() {
        let mut fields = Map::new();
        fields.insert("OrderDetailId".into(), Value::from(7));
        fields.insert("UnitPrice".into(), Value::from(18.5));

        let row = keys_to_columns(fields.clone());
        assert!(row.contains_key("order_detail_id"));
        assert!(row.contains_key("unit_price"));
        assert_eq!(keys_to_fields(row), fields);
    }
}
