//! Update expression construction.

use std::collections::HashMap;

use aws_sdk_dynamodb::types::AttributeValue;

use super::{Item, StoreError};

/// A `SET` update expression with its name and value placeholder tables.
#[derive(Debug, Clone, Default)]
pub struct UpdateExpression {
    pub expression: String,
    pub names: HashMap<String, String>,
    pub values: HashMap<String, AttributeValue>,
}

/// Builds a `SET` expression assigning every attribute in `updates`.
///
/// Attribute names always go through `#` placeholders so reserved words like
/// `Status` or `Name` stay legal, and values through `:` placeholders. Assignments
/// come out in attribute name order.
#[must_use]
pub fn build_update_expression(updates: &Item) -> UpdateExpression {
    let mut keys: Vec<&String> = updates.keys().collect();
    keys.sort();

    let mut assignments = Vec::with_capacity(keys.len());
    let mut names = HashMap::with_capacity(keys.len());
    let mut values = HashMap::with_capacity(keys.len());

    for key in keys {
        let name_key = format!("#{key}");
        let value_key = format!(":{key}");
        assignments.push(format!("{name_key} = {value_key}"));
        names.insert(name_key, key.clone());
        values.insert(value_key, updates[key].clone());
    }

    UpdateExpression {
        expression: format!("SET {}", assignments.join(", ")),
        names,
        values,
    }
}

impl UpdateExpression {
    /// Applies the `SET` assignments to an item, resolving both placeholder
    /// tables. Used by the in-memory backend.
    pub(crate) fn apply(&self, item: &mut Item) -> Result<(), StoreError> {
        let Some(assignments) = self.expression.strip_prefix("SET ") else {
            return Err(StoreError::Other(format!(
                "unsupported update expression: {}",
                self.expression
            )));
        };

        for assignment in assignments.split(", ") {
            let Some((name_key, value_key)) = assignment.split_once(" = ") else {
                return Err(StoreError::Other(format!(
                    "malformed assignment: {assignment}"
                )));
            };
            let Some(attribute) = self.names.get(name_key) else {
                return Err(StoreError::Other(format!(
                    "undefined name placeholder: {name_key}"
                )));
            };
            let Some(value) = self.values.get(value_key) else {
                return Err(StoreError::Other(format!(
                    "undefined value placeholder: {value_key}"
                )));
            };
            item.insert(attribute.clone(), value.clone());
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn string_attr(value: &str) -> AttributeValue {
        AttributeValue::S(value.to_string())
    }

    #[test]
    fn builds_set_clause_with_placeholder_tables() {
        let mut updates = Item::new();
        updates.insert("Status".to_string(), string_attr("PENDING"));
        updates.insert("Name".to_string(), string_attr("Platform"));

        let expr = build_update_expression(&updates);

        assert_eq!(expr.expression, "SET #Name = :Name, #Status = :Status");
        assert_eq!(expr.names["#Name"], "Name");
        assert_eq!(expr.names["#Status"], "Status");
        assert_eq!(expr.values[":Name"], string_attr("Platform"));
        assert_eq!(expr.values[":Status"], string_attr("PENDING"));
    }

    #[test]
    fn apply_writes_every_assignment() {
        let mut updates = Item::new();
        updates.insert("Email".to_string(), string_attr("new@example.com"));
        updates.insert("UpdatedAt".to_string(), AttributeValue::N("42".to_string()));
        let expr = build_update_expression(&updates);

        let mut item = Item::new();
        item.insert("Email".to_string(), string_attr("old@example.com"));
        item.insert("Role".to_string(), string_attr("ADMIN"));
        expr.apply(&mut item).unwrap();

        assert_eq!(item["Email"], string_attr("new@example.com"));
        assert_eq!(item["UpdatedAt"], AttributeValue::N("42".to_string()));
        assert_eq!(item["Role"], string_attr("ADMIN"));
    }

    #[test]
    fn apply_rejects_undefined_placeholders() {
        let expr = UpdateExpression {
            expression: "SET #Email = :Email".to_string(),
            names: HashMap::new(),
            values: HashMap::new(),
        };

        let mut item = Item::new();
        assert!(expr.apply(&mut item).is_err());
    }
}
