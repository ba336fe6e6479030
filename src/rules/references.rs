//! Intrinsic reference scanning.
//!
//! Walks arbitrarily nested property values with an explicit worklist so
//! adversarial nesting cannot grow the call stack. Values deeper than the
//! configured bound are not scanned and the scan is marked truncated.

use std::collections::HashSet;

use crate::value::{PropertyValue, SUB_KEY};

/// Names supplied by the deployment environment, never defined as resources.
pub const PSEUDO_PARAMETERS: &[&str] = &[
    "AWS::AccountId",
    "AWS::Region",
    "AWS::StackId",
    "AWS::StackName",
    "AWS::Partition",
    "AWS::URLSuffix",
    "AWS::NoValue",
    "AWS::NotificationARNs",
];

pub fn is_pseudo_parameter(name: &str) -> bool {
    PSEUDO_PARAMETERS.contains(&name)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reference {
    Ref(String),
    GetAtt(String, String),
    /// `${Name}` or `${Name.Attr}` inside an `Fn::Sub` string.
    Sub(String),
}

impl Reference {
    pub fn target(&self) -> &str {
        match self {
            Self::Ref(target) | Self::GetAtt(target, _) | Self::Sub(target) => target,
        }
    }

    /// `GetAtt` only resolves against resources; the others may also name parameters.
    pub fn may_name_parameter(&self) -> bool {
        !matches!(self, Self::GetAtt(..))
    }

    pub fn describe(&self) -> String {
        match self {
            Self::Ref(target) => format!("Ref {}", target),
            Self::GetAtt(target, attribute) => format!("GetAtt {}.{}", target, attribute),
            Self::Sub(target) => format!("Fn::Sub ${{{}}}", target),
        }
    }
}

#[derive(Debug, Default)]
pub struct ScanResult {
    pub references: Vec<Reference>,
    pub truncated: bool,
}

/// Collect every intrinsic reference nested inside `value`.
pub fn scan(value: &PropertyValue, max_depth: usize) -> ScanResult {
    let mut result = ScanResult::default();
    let mut worklist: Vec<(&PropertyValue, usize)> = vec![(value, 0)];

    while let Some((current, depth)) = worklist.pop() {
        if depth > max_depth {
            result.truncated = true;
            continue;
        }
        match current {
            PropertyValue::Ref(target) => result.references.push(Reference::Ref(target.clone())),
            PropertyValue::GetAtt(target, attribute) => result
                .references
                .push(Reference::GetAtt(target.clone(), attribute.clone())),
            PropertyValue::List(items) => {
                worklist.extend(items.iter().rev().map(|item| (item, depth + 1)));
            }
            PropertyValue::Map(map) => match map.get(SUB_KEY).filter(|_| map.len() == 1) {
                Some(sub) => scan_sub(sub, depth, &mut result, &mut worklist),
                None => worklist.extend(map.values().rev().map(|item| (item, depth + 1))),
            },
            PropertyValue::Null
            | PropertyValue::Bool(_)
            | PropertyValue::Number(_)
            | PropertyValue::String(_) => {}
        }
    }

    result
}

fn scan_sub<'a>(
    sub: &'a PropertyValue,
    depth: usize,
    result: &mut ScanResult,
    worklist: &mut Vec<(&'a PropertyValue, usize)>,
) {
    let (template, locals) = match sub {
        PropertyValue::String(template) => (template.as_str(), None),
        PropertyValue::List(args) if args.len() == 2 => match (&args[0], &args[1]) {
            (PropertyValue::String(template), PropertyValue::Map(locals)) => {
                (template.as_str(), Some(locals))
            }
            _ => {
                worklist.extend(args.iter().rev().map(|item| (item, depth + 1)));
                return;
            }
        },
        other => {
            worklist.push((other, depth + 1));
            return;
        }
    };

    let local_names: HashSet<&str> = locals
        .map(|l| l.keys().map(String::as_str).collect())
        .unwrap_or_default();
    for variable in sub_variables(template) {
        if !local_names.contains(variable) {
            result.references.push(Reference::Sub(variable.to_string()));
        }
    }
    if let Some(locals) = locals {
        worklist.extend(locals.values().rev().map(|item| (item, depth + 1)));
    }
}

/// Targets named by `${...}` placeholders; `${!Literal}` is escaped text.
pub fn sub_variables(template: &str) -> Vec<&str> {
    let mut variables = vec![];
    let mut rest = template;
    while let Some(start) = rest.find("${") {
        let after = &rest[start + 2..];
        let Some(end) = after.find('}') else { break };
        let body = after[..end].trim();
        if !body.is_empty() && !body.starts_with('!') {
            let target = if body.starts_with("AWS::") {
                body
            } else {
                body.split('.').next().unwrap_or(body)
            };
            variables.push(target);
        }
        rest = &after[end + 1..];
    }
    variables
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn value(json: serde_json::Value) -> PropertyValue {
        serde_json::from_value(json).unwrap()
    }

    fn targets(result: &ScanResult) -> Vec<&str> {
        result.references.iter().map(Reference::target).collect()
    }

    #[test]
    fn test_finds_nested_references() {
        let v = value(json!({
            "VpcConfig": {
                "SubnetIds": [{"Ref": "sub1"}, {"Ref": "sub2"}],
                "SecurityGroupIds": [{"Fn::GetAtt": ["sg1", "GroupId"]}]
            },
            "Plain": "text"
        }));
        let result = scan(&v, 64);
        assert_eq!(targets(&result), vec!["sub1", "sub2", "sg1"]);
        assert!(!result.truncated);
    }

    #[test]
    fn test_sub_variables() {
        assert_eq!(
            sub_variables("arn:${AWS::Partition}:s3:::${Bucket}/${!Literal}/${Fn.Arn}"),
            vec!["AWS::Partition", "Bucket", "Fn"]
        );
        assert!(sub_variables("no placeholders").is_empty());
        assert!(sub_variables("${unterminated").is_empty());
    }

    #[test]
    fn test_sub_locals_are_not_references() {
        let v = value(json!({
            "Fn::Sub": ["${Name}-${Queue}", {"Name": {"Ref": "AWS::StackName"}}]
        }));
        let result = scan(&v, 64);
        assert_eq!(targets(&result), vec!["Queue", "AWS::StackName"]);
    }

    #[test]
    fn test_deep_nesting_is_truncated_not_overflowed() {
        let mut v = PropertyValue::reference("deep");
        for _ in 0..1_000 {
            v = PropertyValue::list([v]);
        }
        let result = scan(&v, 64);
        assert!(result.truncated);
        assert!(result.references.is_empty());
    }

    #[test]
    fn test_pseudo_parameters() {
        assert!(is_pseudo_parameter("AWS::Region"));
        assert!(!is_pseudo_parameter("AWS::Everything"));
    }
}
