//! Metadata-driven constraint validation.
//!
//! Checks an entity instance against the constraints its metadata
//! declares: required (non-nullable) values, maximum string lengths, and
//! regex patterns. Nested complex values validate recursively with dotted
//! property paths in the reported failures.

use crate::entity::PropertyAccessor;
use crate::error::{ValidationFailure, ValidationFailureKind};
use crate::meta::EntityType;
use crate::value::Value;
use regex::Regex;

/// Validate one entity instance against its metadata.
///
/// Returns every failure found; an empty vector means the instance passes.
pub fn validate_entity(
    entity: &dyn PropertyAccessor,
    entity_type: &EntityType,
) -> Vec<ValidationFailure> {
    let mut failures = Vec::new();
    validate_level(entity, entity_type, &entity_type.short_name, "", &mut failures);
    failures
}

fn validate_level(
    entity: &dyn PropertyAccessor,
    entity_type: &EntityType,
    root_name: &str,
    prefix: &str,
    failures: &mut Vec<ValidationFailure>,
) {
    // Base-type constraints apply to the same instance.
    if let Some(base_type) = &entity_type.base_type {
        validate_level(entity, base_type, root_name, prefix, failures);
    }

    for property in &entity_type.data_properties {
        let path = join_path(prefix, &property.name);
        let value = entity.get(&property.name);

        // Database-generated values are not the caller's to supply.
        if !property.nullable && !property.is_generated() {
            let missing = match &value {
                None | Some(Value::Null) => true,
                Some(_) => false,
            };
            if missing {
                failures.push(ValidationFailure {
                    entity: root_name.to_string(),
                    property: path.clone(),
                    kind: ValidationFailureKind::Required,
                    message: "value is required".to_string(),
                });
                continue;
            }
        }

        if let Some(Value::Text(text)) = &value {
            if let Some(max_length) = property.max_length {
                if text.chars().count() > max_length {
                    failures.push(ValidationFailure {
                        entity: root_name.to_string(),
                        property: path.clone(),
                        kind: ValidationFailureKind::MaxLength,
                        message: format!(
                            "length {} exceeds maximum {max_length}",
                            text.chars().count()
                        ),
                    });
                }
            }

            if let Some(pattern) = &property.pattern {
                match Regex::new(pattern) {
                    Ok(regex) => {
                        if !regex.is_match(text) {
                            failures.push(ValidationFailure {
                                entity: root_name.to_string(),
                                property: path.clone(),
                                kind: ValidationFailureKind::Pattern,
                                message: format!("value does not match pattern '{pattern}'"),
                            });
                        }
                    }
                    Err(_) => {
                        tracing::warn!(
                            property = %path,
                            pattern = %pattern,
                            "Skipping non-compiling validation pattern"
                        );
                    }
                }
            }
        }
    }

    for complex_property in &entity_type.complex_properties {
        let path = join_path(prefix, &complex_property.name);
        match entity.nested(&complex_property.name) {
            Some(nested) => validate_level(
                nested,
                &complex_property.complex_type,
                root_name,
                &path,
                failures,
            ),
            None => failures.push(ValidationFailure {
                entity: root_name.to_string(),
                property: path,
                kind: ValidationFailureKind::Required,
                message: "complex value is missing".to_string(),
            }),
        }
    }
}

fn join_path(prefix: &str, name: &str) -> String {
    if prefix.is_empty() {
        name.to_string()
    } else {
        format!("{prefix}.{name}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::DynamicEntity;
    use crate::meta::{ComplexProperty, DataProperty, GenerationPattern};
    use std::sync::Arc;

    fn customer_type() -> EntityType {
        let address = Arc::new(
            EntityType::new_complex("Address")
                .property(DataProperty::new("city").nullable(false))
                .property(DataProperty::new("zip").pattern("^[0-9]{4,5}$")),
        );
        EntityType::new("Customer", "Customers")
            .key(DataProperty::new("id").generation(GenerationPattern::Identity))
            .property(DataProperty::new("name").nullable(false).max_length(10))
            .complex_property(ComplexProperty::new("address", address))
    }

    fn valid_customer() -> DynamicEntity {
        DynamicEntity::new()
            .with("name", "Acme")
            .with_nested(
                "address",
                DynamicEntity::new().with("city", "Vienna").with("zip", "1010"),
            )
    }

    #[test]
    fn test_valid_entity_passes() {
        let failures = validate_entity(&valid_customer(), &customer_type());
        assert!(failures.is_empty(), "unexpected: {failures:?}");
    }

    #[test]
    fn test_generated_key_not_required() {
        // `id` is Identity-generated and absent; that must not fail.
        let failures = validate_entity(&valid_customer(), &customer_type());
        assert!(failures.iter().all(|f| f.property != "id"));
    }

    #[test]
    fn test_required_failure() {
        let entity = DynamicEntity::new().with("name", Value::Null).with_nested(
            "address",
            DynamicEntity::new().with("city", "Vienna"),
        );
        let failures = validate_entity(&entity, &customer_type());
        assert!(failures
            .iter()
            .any(|f| f.property == "name" && f.kind == ValidationFailureKind::Required));
    }

    #[test]
    fn test_max_length_failure() {
        let entity = valid_customer().with("name", "far too long a name");
        let failures = validate_entity(&entity, &customer_type());
        assert!(failures
            .iter()
            .any(|f| f.property == "name" && f.kind == ValidationFailureKind::MaxLength));
    }

    #[test]
    fn test_pattern_failure_uses_dotted_path() {
        let entity = DynamicEntity::new().with("name", "Acme").with_nested(
            "address",
            DynamicEntity::new().with("city", "Vienna").with("zip", "abc"),
        );
        let failures = validate_entity(&entity, &customer_type());
        assert!(failures
            .iter()
            .any(|f| f.property == "address.zip" && f.kind == ValidationFailureKind::Pattern));
    }

    #[test]
    fn test_missing_complex_value_reported() {
        let entity = DynamicEntity::new().with("name", "Acme");
        let failures = validate_entity(&entity, &customer_type());
        assert!(failures
            .iter()
            .any(|f| f.property == "address" && f.kind == ValidationFailureKind::Required));
    }
}
