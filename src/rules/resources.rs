//! Per-resource checks against the catalog.

use tracing::debug;

use crate::catalog;
use crate::templates::{Resource, Template};
use crate::validation::{codes, Diagnostic, ValidationPass, ValidatorConfig};
use crate::value::PropertyValue;

pub struct ResourcePass;

impl ValidationPass for ResourcePass {
    fn name(&self) -> &'static str {
        "resources"
    }

    fn check(&self, template: &Template, _config: &ValidatorConfig) -> Vec<Diagnostic> {
        template
            .resources
            .iter()
            .flat_map(|(logical_id, resource)| check_resource(logical_id, resource))
            .collect()
    }
}

pub fn check_resource(logical_id: &str, resource: &Resource) -> Vec<Diagnostic> {
    let Some(spec) = catalog::lookup(&resource.type_name) else {
        debug!(logical_id, type_name = %resource.type_name, "type not in catalog");
        return vec![Diagnostic::warning(
            codes::UNKNOWN_TYPE,
            format!(
                "Resource type '{}' is not in the catalog; properties were not checked",
                resource.type_name
            ),
        )
        .for_resource(logical_id)];
    };

    let mut diagnostics = vec![];

    for required in spec.required {
        let present = matches!(
            resource.property(required),
            Some(value) if *value != PropertyValue::Null
        );
        if !present {
            diagnostics.push(
                Diagnostic::error(
                    codes::MISSING_PROPERTY,
                    format!("Required property '{}' is missing", required),
                )
                .for_resource(logical_id)
                .on_property(*required),
            );
        }
    }

    for (name, value) in &resource.properties {
        if !spec.is_known(name) {
            diagnostics.push(
                Diagnostic::warning(
                    codes::UNKNOWN_PROPERTY,
                    format!(
                        "Property '{}' is not recognized for {}",
                        name, resource.type_name
                    ),
                )
                .for_resource(logical_id)
                .on_property(name.as_str()),
            );
            continue;
        }
        if let Some(message) = spec.check(name, value) {
            diagnostics.push(
                Diagnostic::error(codes::INVALID_PROPERTY, message)
                    .for_resource(logical_id)
                    .on_property(name.as_str()),
            );
        }
    }

    diagnostics
}
