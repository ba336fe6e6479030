//! Property Values - Tagged Union
//!
//! Every property bag (resource `Properties`, node attributes) holds
//! `PropertyValue`s. Intrinsic references are first-class variants so
//! consumers match on them instead of probing JSON objects.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Number, Value};

pub const REF_KEY: &str = "Ref";
pub const GET_ATT_KEY: &str = "Fn::GetAtt";
pub const SUB_KEY: &str = "Fn::Sub";

pub type PropertyMap = IndexMap<String, PropertyValue>;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "Value", into = "Value")]
pub enum PropertyValue {
    Null,
    Bool(bool),
    Number(Number),
    String(String),
    List(Vec<PropertyValue>),
    Map(PropertyMap),
    /// `{"Ref": "<logicalId>"}`
    Ref(String),
    /// `{"Fn::GetAtt": ["<logicalId>", "<attribute>"]}`
    GetAtt(String, String),
}

impl PropertyValue {
    pub fn reference(logical_id: impl Into<String>) -> Self {
        Self::Ref(logical_id.into())
    }

    pub fn get_att(logical_id: impl Into<String>, attribute: impl Into<String>) -> Self {
        Self::GetAtt(logical_id.into(), attribute.into())
    }

    /// Build a map value from `(key, value)` pairs, keeping their order.
    pub fn map<'a, I>(entries: I) -> Self
    where
        I: IntoIterator<Item = (&'a str, PropertyValue)>,
    {
        Self::Map(entries.into_iter().map(|(k, v)| (k.to_string(), v)).collect())
    }

    pub fn list<I>(items: I) -> Self
    where
        I: IntoIterator<Item = PropertyValue>,
    {
        Self::List(items.into_iter().collect())
    }

    /// Loose boolean reading used for editor-supplied flags.
    ///
    /// `true`, any non-zero number and the string `"true"` (any case) are truthy.
    pub fn is_truthy(&self) -> bool {
        match self {
            Self::Bool(b) => *b,
            Self::Number(n) => n.as_f64().map_or(false, |f| f != 0.0),
            Self::String(s) => s.eq_ignore_ascii_case("true"),
            _ => false,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            Self::String(s) if s.eq_ignore_ascii_case("true") => Some(true),
            Self::String(s) if s.eq_ignore_ascii_case("false") => Some(false),
            _ => None,
        }
    }

    /// Numeric reading; accepts numbers and numeric strings (`"20"`).
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Number(n) => n.as_f64(),
            Self::String(s) => s.trim().parse::<f64>().ok(),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f as i64)),
            Self::String(s) => s.trim().parse::<i64>().ok(),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[PropertyValue]> {
        match self {
            Self::List(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&PropertyMap> {
        match self {
            Self::Map(map) => Some(map),
            _ => None,
        }
    }

    /// Field lookup on a map value.
    pub fn get(&self, key: &str) -> Option<&PropertyValue> {
        self.as_map().and_then(|m| m.get(key))
    }

    /// True for values whose content is only known at deploy time:
    /// `Ref`, `GetAtt` and any single-key `Fn::*` function object.
    pub fn is_intrinsic(&self) -> bool {
        match self {
            Self::Ref(_) | Self::GetAtt(..) => true,
            Self::Map(map) => map.len() == 1 && map.keys().all(|k| k.starts_with("Fn::")),
            _ => false,
        }
    }

    fn from_object(object: Map<String, Value>) -> Self {
        if object.len() == 1 {
            if let Some(Value::String(target)) = object.get(REF_KEY) {
                return Self::Ref(target.clone());
            }
            if let Some((target, attribute)) = object.get(GET_ATT_KEY).and_then(parse_get_att) {
                return Self::GetAtt(target, attribute);
            }
        }
        Self::Map(object.into_iter().map(|(k, v)| (k, Self::from(v))).collect())
    }
}

/// `["id", "Attr"]` or the short form `"id.Attr"`.
fn parse_get_att(args: &Value) -> Option<(String, String)> {
    match args {
        Value::Array(parts) if parts.len() == 2 => {
            let target = parts[0].as_str()?;
            let attribute = parts[1].as_str()?;
            Some((target.to_string(), attribute.to_string()))
        }
        Value::String(dotted) => {
            let (target, attribute) = dotted.split_once('.')?;
            Some((target.to_string(), attribute.to_string()))
        }
        _ => None,
    }
}

impl From<Value> for PropertyValue {
    fn from(value: Value) -> Self {
        match value {
            Value::Null => Self::Null,
            Value::Bool(b) => Self::Bool(b),
            Value::Number(n) => Self::Number(n),
            Value::String(s) => Self::String(s),
            Value::Array(items) => Self::List(items.into_iter().map(Self::from).collect()),
            Value::Object(object) => Self::from_object(object),
        }
    }
}

impl From<PropertyValue> for Value {
    fn from(value: PropertyValue) -> Self {
        match value {
            PropertyValue::Null => Value::Null,
            PropertyValue::Bool(b) => Value::Bool(b),
            PropertyValue::Number(n) => Value::Number(n),
            PropertyValue::String(s) => Value::String(s),
            PropertyValue::List(items) => {
                Value::Array(items.into_iter().map(Value::from).collect())
            }
            PropertyValue::Map(map) => {
                Value::Object(map.into_iter().map(|(k, v)| (k, Value::from(v))).collect())
            }
            PropertyValue::Ref(target) => {
                let mut object = Map::new();
                object.insert(REF_KEY.to_string(), Value::String(target));
                Value::Object(object)
            }
            PropertyValue::GetAtt(target, attribute) => {
                let mut object = Map::new();
                object.insert(
                    GET_ATT_KEY.to_string(),
                    Value::Array(vec![Value::String(target), Value::String(attribute)]),
                );
                Value::Object(object)
            }
        }
    }
}

impl From<&str> for PropertyValue {
    fn from(s: &str) -> Self {
        Self::String(s.to_string())
    }
}

impl From<String> for PropertyValue {
    fn from(s: String) -> Self {
        Self::String(s)
    }
}

impl From<bool> for PropertyValue {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

impl From<i64> for PropertyValue {
    fn from(n: i64) -> Self {
        Self::Number(n.into())
    }
}

impl From<f64> for PropertyValue {
    fn from(f: f64) -> Self {
        Number::from_f64(f).map_or(Self::Null, Self::Number)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_ref_object_becomes_ref() {
        let v: PropertyValue = serde_json::from_value(json!({"Ref": "vpc1"})).unwrap();
        assert_eq!(v, PropertyValue::reference("vpc1"));
    }

    #[test]
    fn test_get_att_short_form() {
        let v: PropertyValue =
            serde_json::from_value(json!({"Fn::GetAtt": "db.Endpoint.Address"})).unwrap();
        assert_eq!(v, PropertyValue::get_att("db", "Endpoint.Address"));
    }

    #[test]
    fn test_ref_with_extra_keys_stays_map() {
        let v: PropertyValue = serde_json::from_value(json!({"Ref": "a", "Other": 1})).unwrap();
        assert!(matches!(v, PropertyValue::Map(_)));
    }

    #[test]
    fn test_intrinsics_serialize_to_cfn_shape() {
        let v = PropertyValue::list([
            PropertyValue::reference("vpc1"),
            PropertyValue::get_att("fnRole", "Arn"),
        ]);
        assert_eq!(
            serde_json::to_value(&v).unwrap(),
            json!([{"Ref": "vpc1"}, {"Fn::GetAtt": ["fnRole", "Arn"]}])
        );
    }

    #[test]
    fn test_truthiness() {
        assert!(PropertyValue::from(true).is_truthy());
        assert!(PropertyValue::from("TRUE").is_truthy());
        assert!(PropertyValue::from(1i64).is_truthy());
        assert!(!PropertyValue::from("yes").is_truthy());
        assert!(!PropertyValue::from(0i64).is_truthy());
        assert!(!PropertyValue::Null.is_truthy());
    }

    #[test]
    fn test_numeric_strings_read_as_numbers() {
        assert_eq!(PropertyValue::from("20").as_i64(), Some(20));
        assert_eq!(PropertyValue::from(512i64).as_f64(), Some(512.0));
        assert_eq!(PropertyValue::from("abc").as_i64(), None);
    }

    #[test]
    fn test_fn_sub_is_intrinsic() {
        let v: PropertyValue =
            serde_json::from_value(json!({"Fn::Sub": "${AWS::Region}"})).unwrap();
        assert!(v.is_intrinsic());
        assert!(!PropertyValue::map([("Key", "v".into())]).is_intrinsic());
    }
}
