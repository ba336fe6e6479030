//! Structural checks, independent of resource type.

use lazy_static::lazy_static;
use regex::Regex;

use crate::templates::{Template, FORMAT_VERSION};
use crate::validation::{codes, Diagnostic, ValidationPass, ValidatorConfig};

pub const MAX_LOGICAL_ID_LEN: usize = 255;
pub const MAX_DESCRIPTION_LEN: usize = 1024;

lazy_static! {
    static ref LOGICAL_ID: Regex = Regex::new(r"^[A-Za-z][A-Za-z0-9]*$").unwrap();
}

pub fn is_valid_logical_id(id: &str) -> bool {
    LOGICAL_ID.is_match(id)
}

pub struct StructuralPass;

impl ValidationPass for StructuralPass {
    fn name(&self) -> &'static str {
        "structural"
    }

    fn check(&self, template: &Template, _config: &ValidatorConfig) -> Vec<Diagnostic> {
        let mut diagnostics = vec![];

        if template.format_version != FORMAT_VERSION {
            diagnostics.push(Diagnostic::error(
                codes::FORMAT_VERSION,
                format!(
                    "AWSTemplateFormatVersion must be '{}', got '{}'",
                    FORMAT_VERSION, template.format_version
                ),
            ));
        }

        if template.description.len() > MAX_DESCRIPTION_LEN {
            diagnostics.push(Diagnostic::error(
                codes::DESCRIPTION_TOO_LONG,
                format!(
                    "Description is {} bytes; the limit is {}",
                    template.description.len(),
                    MAX_DESCRIPTION_LEN
                ),
            ));
        }

        if template.resources.is_empty() {
            diagnostics.push(Diagnostic::error(
                codes::NO_RESOURCES,
                "Template must declare at least one resource",
            ));
        }

        for logical_id in template.resources.keys() {
            if !is_valid_logical_id(logical_id) {
                diagnostics.push(
                    Diagnostic::error(
                        codes::INVALID_LOGICAL_ID,
                        format!(
                            "Logical id '{}' must start with a letter and contain only letters and digits",
                            logical_id
                        ),
                    )
                    .for_resource(logical_id.as_str()),
                );
            }
            if logical_id.len() > MAX_LOGICAL_ID_LEN {
                diagnostics.push(
                    Diagnostic::error(
                        codes::LOGICAL_ID_TOO_LONG,
                        format!(
                            "Logical id is {} characters; the limit is {}",
                            logical_id.len(),
                            MAX_LOGICAL_ID_LEN
                        ),
                    )
                    .for_resource(logical_id.as_str()),
                );
            }
        }

        diagnostics
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::templates::Resource;

    fn check(template: &Template) -> Vec<Diagnostic> {
        StructuralPass.check(template, &ValidatorConfig::default())
    }

    fn with_resource(id: &str) -> Template {
        let mut template = Template::new("test");
        template.resources.insert(id.to_string(), Resource::new("AWS::SNS::Topic"));
        template
    }

    #[test]
    fn test_well_formed_template_passes() {
        assert!(check(&with_resource("Topic1")).is_empty());
    }

    #[test]
    fn test_wrong_version() {
        let mut template = with_resource("Topic1");
        template.format_version = "2020-01-01".into();
        let diagnostics = check(&template);
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].code, codes::FORMAT_VERSION);
    }

    #[test]
    fn test_empty_resources() {
        let diagnostics = check(&Template::new("empty"));
        assert_eq!(diagnostics[0].code, codes::NO_RESOURCES);
    }

    #[test]
    fn test_logical_id_syntax() {
        for bad in ["my-topic", "1topic", "topic_1", ""] {
            let diagnostics = check(&with_resource(bad));
            assert!(
                diagnostics.iter().any(|d| d.code == codes::INVALID_LOGICAL_ID),
                "{:?} should be rejected",
                bad
            );
        }
    }

    #[test]
    fn test_logical_id_length() {
        let ok = "a".repeat(MAX_LOGICAL_ID_LEN);
        assert!(check(&with_resource(&ok)).is_empty());

        let long = "a".repeat(MAX_LOGICAL_ID_LEN + 1);
        let diagnostics = check(&with_resource(&long));
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].code, codes::LOGICAL_ID_TOO_LONG);
    }

    #[test]
    fn test_description_length() {
        let mut template = with_resource("Topic1");
        template.description = "d".repeat(MAX_DESCRIPTION_LEN + 1);
        assert_eq!(check(&template)[0].code, codes::DESCRIPTION_TOO_LONG);
    }
}
