//! Lenient readers for raw attribute bags.
//!
//! Editors send booleans as `true`, `1`, or `"true"` and numbers as strings.
//! Every reader returns None for anything it cannot interpret so callers can
//! fall back to a default instead of rejecting the request.

use serde_json::{Map, Value};

/// First value present under any of `names`, skipping nulls.
pub fn lookup<'a>(attrs: &'a Value, names: &[&str]) -> Option<&'a Value> {
    let map: &Map<String, Value> = attrs.as_object()?;
    names.iter().filter_map(|name| map.get(*name)).find(|value| !value.is_null())
}

/// Integer from a JSON number or a numeric string. Fractions truncate.
pub fn as_integer(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().filter(|f| f.is_finite()).map(|f| f.trunc() as i64)),
        Value::String(s) => {
            let s = s.trim();
            s.parse::<i64>().ok().or_else(|| s.parse::<f64>().ok().filter(|f| f.is_finite()).map(|f| f.trunc() as i64))
        }
        Value::Bool(_) | Value::Null | Value::Array(_) | Value::Object(_) => None,
    }
}

pub fn as_bool(value: &Value) -> Option<bool> {
    match value {
        Value::Bool(b) => Some(*b),
        Value::Number(n) => n.as_f64().map(|f| f != 0.0),
        Value::String(s) => match s.trim().to_ascii_lowercase().as_str() {
            "true" | "1" | "yes" | "on" => Some(true),
            "false" | "0" | "no" | "off" | "" => Some(false),
            _ => None,
        },
        Value::Null | Value::Array(_) | Value::Object(_) => None,
    }
}

/// String value; numbers are accepted in their JSON form.
pub fn as_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Lowercase key made of `[a-z0-9_-]`, the way content-type and order
/// names are compared.
pub fn sanitize_key(raw: &str) -> String {
    raw.chars()
        .filter_map(|c| {
            let c = c.to_ascii_lowercase();
            (c.is_ascii_alphanumeric() || c == '_' || c == '-').then_some(c)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_lookup_prefers_first_present_name() {
        let attrs = json!({ "per_page": 4, "postsPerPage": null, "limit": 9 });
        assert_eq!(lookup(&attrs, &["postsPerPage", "per_page", "limit"]), Some(&json!(4)));
        assert_eq!(lookup(&attrs, &["missing"]), None);
        assert_eq!(lookup(&json!([1, 2]), &["per_page"]), None);
    }

    #[test]
    fn test_as_integer() {
        assert_eq!(as_integer(&json!(12)), Some(12));
        assert_eq!(as_integer(&json!(-3)), Some(-3));
        assert_eq!(as_integer(&json!(7.9)), Some(7));
        assert_eq!(as_integer(&json!(" 15 ")), Some(15));
        assert_eq!(as_integer(&json!("2.5")), Some(2));
        assert_eq!(as_integer(&json!("abc")), None);
        assert_eq!(as_integer(&json!(true)), None);
    }

    #[test]
    fn test_as_bool() {
        assert_eq!(as_bool(&json!(true)), Some(true));
        assert_eq!(as_bool(&json!(0)), Some(false));
        assert_eq!(as_bool(&json!("1")), Some(true));
        assert_eq!(as_bool(&json!("False")), Some(false));
        assert_eq!(as_bool(&json!("")), Some(false));
        assert_eq!(as_bool(&json!("maybe")), None);
    }

    #[test]
    fn test_sanitize_key() {
        assert_eq!(sanitize_key("Menu_Order"), "menu_order");
        assert_eq!(sanitize_key("po st<script>"), "postscript");
        assert_eq!(sanitize_key("custom-type"), "custom-type");
    }
}
