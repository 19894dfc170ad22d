//! Option structs and their conversion into request params
//!
//! Every option struct doubles as a clap `Args` definition and a serde
//! `Serialize` type. The serialized field name is the wire name, so the
//! conversion is a serde walk followed by pruning of empty values.

pub mod base;
pub mod cloudaccounts;
pub mod hosts;
pub mod pods;
pub mod servers;

use serde::Serialize;
use serde_json::{Map, Value};
use thiserror::Error;

pub use base::{list_struct_to_params, BaseListOptions, ListOptions};

/// Request parameters (a JSON object)
pub type Params = Map<String, Value>;

#[derive(Debug, Error)]
pub enum ParamsError {
    #[error("options must serialize to a JSON object")]
    NotAnObject,

    #[error("failed to serialize options: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalidate tag info {0}")]
    InvalidTag(String),

    #[error("malformed deploy info: {0}")]
    MalformedDeployInfo(String),

    #[error("No valid update data")]
    EmptyUpdate,

    #[error("missing {0} option")]
    Missing(&'static str),

    #[error("invalid {field} '{value}': {reason}")]
    InvalidValue {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Invalid {kind} index: {index}")]
    InvalidIndex { kind: &'static str, index: usize },
}

impl ParamsError {
    pub fn invalid(field: &str, value: &str, reason: impl Into<String>) -> Self {
        ParamsError::InvalidValue {
            field: field.to_string(),
            value: value.to_string(),
            reason: reason.into(),
        }
    }
}

/// Options that know how to turn themselves into request params
pub trait Options {
    fn params(&self) -> Result<Params, ParamsError>;
}

/// Used as `skip_serializing_if` for plain flags that are only sent when set
pub fn is_false(b: &bool) -> bool {
    !*b
}

/// Serialize an option struct and drop every empty value.
///
/// `null`, `""`, `[]` and `{}` are removed; `false` and `0` are kept when the
/// struct chose to serialize them.
pub fn struct_to_params<T: Serialize>(opts: &T) -> Result<Params, ParamsError> {
    match serde_json::to_value(opts)? {
        Value::Object(mut map) => {
            prune(&mut map);
            Ok(map)
        }
        _ => Err(ParamsError::NotAnObject),
    }
}

fn prune(map: &mut Params) {
    for value in map.values_mut() {
        prune_value(value);
    }
    map.retain(|_, v| !is_empty(v));
}

fn prune_value(value: &mut Value) {
    match value {
        Value::Object(inner) => prune(inner),
        Value::Array(items) => items.iter_mut().for_each(prune_value),
        _ => {}
    }
}

fn is_empty(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.is_empty(),
        Value::Array(a) => a.is_empty(),
        Value::Object(o) => o.is_empty(),
        _ => false,
    }
}

/// Parse `k=v` / `k` metadata tags into a map.
///
/// A bare key maps to itself. An empty key or more than one `=` is rejected.
pub fn parse_metadata_tags(tags: &[String]) -> Result<Params, ParamsError> {
    let mut metadata = Params::new();
    for tag in tags {
        let parts: Vec<&str> = tag.split('=').collect();
        match parts.as_slice() {
            [key, value] => {
                if key.is_empty() {
                    return Err(ParamsError::InvalidTag(tag.clone()));
                }
                metadata.insert(key.to_string(), Value::String(value.to_string()));
            }
            [key] => {
                metadata.insert(key.to_string(), Value::String(key.to_string()));
            }
            _ => return Err(ParamsError::InvalidTag(tag.clone())),
        }
    }
    Ok(metadata)
}

/// Parse a size string into megabytes.
///
/// `default_unit` applies to bare numbers and is one of `m`, `g`, `t`.
pub fn parse_size_mb(input: &str, default_unit: char) -> Result<u64, ParamsError> {
    let s = input.trim().to_ascii_lowercase();
    let s = s.strip_suffix('b').unwrap_or(&s);
    let (digits, unit) = match s.chars().last() {
        Some(c) if c.is_ascii_alphabetic() => (&s[..s.len() - 1], c),
        Some(_) => (s, default_unit.to_ascii_lowercase()),
        None => return Err(ParamsError::invalid("size", input, "empty size")),
    };
    let n: u64 = digits
        .parse()
        .map_err(|_| ParamsError::invalid("size", input, "not a number"))?;
    let factor = match unit {
        'm' => 1,
        'g' => 1024,
        't' => 1024 * 1024,
        _ => return Err(ParamsError::invalid("size", input, "unknown unit")),
    };
    n.checked_mul(factor)
        .ok_or_else(|| ParamsError::invalid("size", input, "too large"))
}

/// True when the string looks like a size accepted by [`parse_size_mb`]
pub fn is_size(input: &str) -> bool {
    let s = input.to_ascii_lowercase();
    let s = s.strip_suffix('b').unwrap_or(&s);
    let digits = s.trim_end_matches(['m', 'g', 't']);
    !digits.is_empty()
        && digits.len() + 1 >= s.len()
        && digits.chars().all(|c| c.is_ascii_digit())
}

/// Boolean value of a `key=value` segment
pub(crate) fn parse_bool(field: &str, value: &str) -> Result<bool, ParamsError> {
    match value.to_ascii_lowercase().as_str() {
        "true" | "yes" | "1" => Ok(true),
        "false" | "no" | "0" => Ok(false),
        _ => Err(ParamsError::invalid(field, value, "expected true or false")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[derive(Serialize, Default)]
    struct Inner {
        #[serde(skip_serializing_if = "is_false")]
        backup: bool,
        zone: Option<String>,
    }

    #[derive(Serialize, Default)]
    struct Sample {
        name: String,
        #[serde(rename = "vcpu_count")]
        ncpu: Option<u32>,
        gpu: Option<bool>,
        #[serde(skip_serializing_if = "is_false")]
        auto_start: bool,
        #[serde(skip)]
        id: String,
        net: Vec<String>,
        #[serde(flatten)]
        inner: Inner,
        nested: Inner,
    }

    #[test]
    fn field_names_map_to_json_keys() {
        let opts = Sample {
            name: "vm1".into(),
            ncpu: Some(2),
            id: "ignored".into(),
            net: vec!["vnet1".into()],
            inner: Inner { backup: true, zone: Some("zone1".into()) },
            ..Default::default()
        };
        let params = struct_to_params(&opts).unwrap();
        assert_eq!(
            Value::Object(params),
            json!({
                "name": "vm1",
                "vcpu_count": 2,
                "net": ["vnet1"],
                "backup": true,
                "zone": "zone1"
            })
        );
    }

    #[test]
    fn explicit_false_is_kept_but_plain_false_is_not() {
        let opts = Sample { gpu: Some(false), ..Default::default() };
        let params = struct_to_params(&opts).unwrap();
        assert_eq!(params.get("gpu"), Some(&json!(false)));
        assert!(!params.contains_key("auto_start"));
        assert!(!params.contains_key("nested"));
    }

    #[test]
    fn non_object_is_rejected() {
        assert!(matches!(struct_to_params(&vec![1, 2]), Err(ParamsError::NotAnObject)));
    }

    #[test]
    fn metadata_tags() {
        let tags = vec!["os=linux".to_string(), "gpu".to_string()];
        let md = parse_metadata_tags(&tags).unwrap();
        assert_eq!(Value::Object(md), json!({"os": "linux", "gpu": "gpu"}));

        assert!(matches!(
            parse_metadata_tags(&["=x".to_string()]),
            Err(ParamsError::InvalidTag(_))
        ));
        assert!(matches!(
            parse_metadata_tags(&["a=b=c".to_string()]),
            Err(ParamsError::InvalidTag(_))
        ));
    }

    #[test]
    fn sizes() {
        assert_eq!(parse_size_mb("512", 'm').unwrap(), 512);
        assert_eq!(parse_size_mb("20g", 'm').unwrap(), 20 * 1024);
        assert_eq!(parse_size_mb("1T", 'm').unwrap(), 1024 * 1024);
        assert_eq!(parse_size_mb("4", 'g').unwrap(), 4096);
        assert_eq!(parse_size_mb("2GB", 'm').unwrap(), 2048);
        assert!(parse_size_mb("abc", 'm').is_err());
        assert!(matches!(
            parse_size_mb("99999999999999t", 'm'),
            Err(ParamsError::InvalidValue { .. })
        ));
        assert_eq!(parse_size_mb(&u64::MAX.to_string(), 'm').unwrap(), u64::MAX);
        assert!(is_size("30g"));
        assert!(is_size("1024"));
        assert!(!is_size("centos7"));
        assert!(!is_size("g"));
    }
}
