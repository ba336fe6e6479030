//! Best-practice heuristics. Warnings only; evaluated on every resource
//! whether or not its type or properties passed the earlier passes.

use crate::catalog;
use crate::templates::{Resource, Template};
use crate::validation::{codes, Diagnostic, ValidationPass, ValidatorConfig};
use crate::value::PropertyValue;

pub const MAX_SYNC_LAMBDA_TIMEOUT: f64 = 300.0;
const WEB_PORTS: [i64; 2] = [80, 443];
const OPEN_CIDRS: [(&str, &str); 2] = [("CidrIp", "0.0.0.0/0"), ("CidrIpv6", "::/0")];

pub struct BestPracticesPass;

impl ValidationPass for BestPracticesPass {
    fn name(&self) -> &'static str {
        "best_practices"
    }

    fn check(&self, template: &Template, _config: &ValidatorConfig) -> Vec<Diagnostic> {
        let mut diagnostics = vec![];
        for (logical_id, resource) in &template.resources {
            lint_resource(logical_id, resource, &mut diagnostics);
        }
        diagnostics
    }
}

fn lint_resource(logical_id: &str, resource: &Resource, out: &mut Vec<Diagnostic>) {
    let warn = |code: &str, property: &str, message: String| {
        Diagnostic::warning(code, message)
            .for_resource(logical_id)
            .on_property(property)
    };

    match resource.type_name.as_str() {
        "AWS::S3::Bucket" => {
            if resource.property("BucketEncryption").is_none() {
                out.push(warn(
                    codes::BUCKET_UNENCRYPTED,
                    "BucketEncryption",
                    "S3 bucket has no default encryption configured".to_string(),
                ));
            }
        }
        "AWS::RDS::DBInstance" => {
            if !enabled(resource.property("StorageEncrypted")) {
                out.push(warn(
                    codes::DATABASE_UNENCRYPTED,
                    "StorageEncrypted",
                    "RDS instance storage is not encrypted".to_string(),
                ));
            }
            if !enabled(resource.property("MultiAZ")) {
                out.push(warn(
                    codes::DATABASE_SINGLE_AZ,
                    "MultiAZ",
                    "RDS instance is not Multi-AZ; consider MultiAZ for production".to_string(),
                ));
            }
        }
        "AWS::Lambda::Function" => {
            let timeout = resource.property("Timeout").and_then(PropertyValue::as_f64);
            if let Some(timeout) = timeout.filter(|t| *t > MAX_SYNC_LAMBDA_TIMEOUT) {
                out.push(warn(
                    codes::FUNCTION_LONG_TIMEOUT,
                    "Timeout",
                    format!(
                        "Lambda timeout of {}s is long; consider Step Functions for long-running work",
                        timeout
                    ),
                ));
            }
        }
        "AWS::EC2::SecurityGroup" => {
            let rules = resource
                .property("SecurityGroupIngress")
                .and_then(PropertyValue::as_list)
                .unwrap_or_default();
            for rule in rules {
                if let Some(message) = open_ingress(rule) {
                    out.push(warn(codes::OPEN_INGRESS, "SecurityGroupIngress", message));
                }
            }
        }
        "AWS::EC2::SecurityGroupIngress" => {
            let rule = PropertyValue::Map(resource.properties.clone());
            if let Some(message) = open_ingress(&rule) {
                out.push(warn(codes::OPEN_INGRESS, "CidrIp", message));
            }
        }
        _ => {}
    }
}

/// Absent or false is off; an intrinsic is assumed on.
fn enabled(value: Option<&PropertyValue>) -> bool {
    value.map_or(false, |v| v.is_intrinsic() || v.is_truthy())
}

/// Message for a rule that opens a non-web port to the whole internet.
fn open_ingress(rule: &PropertyValue) -> Option<String> {
    let source = OPEN_CIDRS
        .iter()
        .find(|(key, cidr)| rule.get(key).and_then(PropertyValue::as_str) == Some(*cidr))
        .map(|(_, cidr)| *cidr)?;

    let protocol = catalog::ingress_protocol(rule).unwrap_or_default();
    let from = rule.get("FromPort").and_then(PropertyValue::as_i64);
    let to = rule.get("ToPort").and_then(PropertyValue::as_i64).or(from);

    match (protocol.as_str(), from, to) {
        ("-1" | "all", _, _) | (_, None, _) => Some(format!(
            "Ingress rule allows {} on all ports; restrict the port range or source",
            source
        )),
        (_, Some(from), Some(to)) if from == to => {
            if WEB_PORTS.contains(&from) {
                None
            } else {
                Some(format!(
                    "Ingress rule allows {} on port {}; restrict the source CIDR",
                    source, from
                ))
            }
        }
        (_, Some(from), Some(to)) => Some(format!(
            "Ingress rule allows {} on ports {}-{}; restrict the source CIDR",
            source, from, to
        )),
        (_, Some(_), None) => None,
    }
}
