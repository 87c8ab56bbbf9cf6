// Copyright (c) 2025, Tom Ouellette
// Licensed under the BSD 3-Clause License

//! Parsing of `key=value` config overrides.
//!
//! Values are parsed into json values: a comma-free token becomes an
//! integer, float, boolean, null (`None`) or string, while `a,b`, `[a,b]`
//! and `(a,b)` become arrays. Brackets may be nested, e.g. `[(1,2),(3,4)]`.
//! Quotes around a value and all white space are dropped.

use serde_json::{Number, Value};

use crate::error::SorrelError;

/// Split a `key=value` override into its key and parsed value
///
/// # Examples
///
/// ```
/// use serde_json::json;
/// use sorrel_core::config::options::parse_cfg_option;
///
/// let (key, value) = parse_cfg_option("model.backbone.depth=50").unwrap();
/// assert_eq!(key, "model.backbone.depth");
/// assert_eq!(value, json!(50));
///
/// let (key, value) = parse_cfg_option("key=1,2,3").unwrap();
/// assert_eq!(key, "key");
/// assert_eq!(value, json!([1, 2, 3]));
/// ```
pub fn parse_cfg_option(option: &str) -> Result<(String, Value), SorrelError> {
    let (key, value) = option.split_once('=').ok_or_else(|| {
        SorrelError::CfgOptionError(format!("Expected KEY=VALUE but got `{}`", option))
    })?;

    if key.is_empty() {
        return Err(SorrelError::CfgOptionError(format!(
            "Missing key in `{}`",
            option
        )));
    }

    Ok((key.to_string(), parse_value(value)?))
}

/// Parse the value half of an override
///
/// # Examples
///
/// ```
/// use serde_json::json;
/// use sorrel_core::config::options::parse_value;
///
/// assert_eq!(parse_value("0.5").unwrap(), json!(0.5));
/// assert_eq!(parse_value("False").unwrap(), json!(false));
/// assert_eq!(parse_value("None").unwrap(), json!(null));
/// assert_eq!(parse_value("\"[(1,2),(3,4)]\"").unwrap(), json!([[1, 2], [3, 4]]));
/// ```
pub fn parse_value(value: &str) -> Result<Value, SorrelError> {
    let value: String = value
        .trim_matches(|c| c == '\'' || c == '"')
        .chars()
        .filter(|c| *c != ' ')
        .collect();

    let bracketed = (value.starts_with('(') && value.ends_with(')'))
        || (value.starts_with('[') && value.ends_with(']'));

    let inner = if bracketed {
        &value[1..value.len() - 1]
    } else if !value.contains(',') {
        return Ok(parse_scalar(&value));
    } else {
        value.as_str()
    };

    let mut values = Vec::new();
    let mut rest = inner;

    while !rest.is_empty() {
        let comma = next_comma(rest)?;

        // An unbracketed value without a top-level comma would recurse forever
        if !bracketed && comma == value.len() {
            return Err(SorrelError::CfgOptionError(format!(
                "Malformed value `{}`",
                value
            )));
        }

        values.push(parse_value(&rest[..comma])?);
        rest = rest.get(comma + 1..).unwrap_or("");
    }

    Ok(Value::Array(values))
}

/// Parse a comma-free token into the narrowest matching scalar
fn parse_scalar(value: &str) -> Value {
    if let Ok(n) = value.parse::<i64>() {
        return Value::Number(n.into());
    }

    if let Ok(n) = value.parse::<f64>() {
        if let Some(n) = Number::from_f64(n) {
            return Value::Number(n);
        }
    }

    match value.to_lowercase().as_str() {
        "true" => return Value::Bool(true),
        "false" => return Value::Bool(false),
        _ => {}
    }

    if value == "None" {
        return Value::Null;
    }

    Value::String(value.to_string())
}

/// Position of the first comma outside of any brackets, or the string length
fn next_comma(value: &str) -> Result<usize, SorrelError> {
    let count = |c: char| value.chars().filter(|&x| x == c).count();

    if count('(') != count(')') || count('[') != count(']') {
        return Err(SorrelError::CfgOptionError(format!(
            "Imbalanced brackets exist in `{}`",
            value
        )));
    }

    let (mut paren, mut bracket) = (0i64, 0i64);

    for (idx, c) in value.char_indices() {
        match c {
            '(' => paren += 1,
            ')' => paren -= 1,
            '[' => bracket += 1,
            ']' => bracket -= 1,
            ',' if paren == 0 && bracket == 0 => return Ok(idx),
            _ => {}
        }

        if paren < 0 || bracket < 0 {
            return Err(SorrelError::CfgOptionError(format!(
                "Imbalanced brackets exist in `{}`",
                value
            )));
        }
    }

    Ok(value.len())
}

#[cfg(test)]
mod test {

    use super::*;
    use serde_json::json;

    #[test]
    fn test_scalars() {
        assert_eq!(parse_value("1").unwrap(), json!(1));
        assert_eq!(parse_value("-3").unwrap(), json!(-3));
        assert_eq!(parse_value("1e-3").unwrap(), json!(0.001));
        assert_eq!(parse_value("true").unwrap(), json!(true));
        assert_eq!(parse_value("TRUE").unwrap(), json!(true));
        assert_eq!(parse_value("None").unwrap(), json!(null));
        assert_eq!(parse_value("none").unwrap(), json!("none"));
        assert_eq!(parse_value("mmseg").unwrap(), json!("mmseg"));
        assert_eq!(parse_value("'quoted'").unwrap(), json!("quoted"));
    }

    #[test]
    fn test_non_finite_floats_stay_strings() {
        assert_eq!(parse_value("inf").unwrap(), json!("inf"));
        assert_eq!(parse_value("nan").unwrap(), json!("nan"));
    }

    #[test]
    fn test_lists() {
        assert_eq!(parse_value("1,2,3").unwrap(), json!([1, 2, 3]));
        assert_eq!(parse_value("[a,b]").unwrap(), json!(["a", "b"]));
        assert_eq!(parse_value("[]").unwrap(), json!([]));
        assert_eq!(parse_value("[1]").unwrap(), json!([1]));
        assert_eq!(parse_value("1,2,").unwrap(), json!([1, 2]));
        assert_eq!(parse_value("[ 1, 2.5 , x ]").unwrap(), json!([1, 2.5, "x"]));
    }

    #[test]
    fn test_nested() {
        assert_eq!(
            parse_value("[(1,2),(3,4)]").unwrap(),
            json!([[1, 2], [3, 4]])
        );
        assert_eq!(
            parse_value("[(a,b),[c,(d,e)]]").unwrap(),
            json!([["a", "b"], ["c", ["d", "e"]]])
        );
        assert_eq!(parse_value("(1,[2,3]),4").unwrap(), json!([[1, [2, 3]], 4]));
    }

    #[test]
    fn test_imbalanced_brackets() {
        assert!(matches!(
            parse_value("[(1,2],3"),
            Err(SorrelError::CfgOptionError(_))
        ));
    }

    #[test]
    fn test_malformed_nesting() {
        assert!(parse_value("a(1,2)").is_err());
        assert!(parse_value("(1),(2)").is_err());
    }

    #[test]
    fn test_cfg_option_split() {
        let (key, value) = parse_cfg_option("a=b=c").unwrap();
        assert_eq!(key, "a");
        assert_eq!(value, json!("b=c"));

        let (key, value) = parse_cfg_option("empty=").unwrap();
        assert_eq!(key, "empty");
        assert_eq!(value, json!(""));

        assert!(parse_cfg_option("no_equals").is_err());
        assert!(parse_cfg_option("=1").is_err());
    }
}
