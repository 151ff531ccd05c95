//! Schema checks for untrusted JSON.
//!
//! Every shape check the crate performs on remote data lives here and
//! produces a [`Validation`], so callers collect reasons instead of
//! branching on ad hoc `is_*` tests.

use serde_json::{Map, Number, Value};

/// Tagged result of a schema check.
#[derive(Debug, Clone, PartialEq)]
pub enum Validation<T> {
    Valid(T),
    Invalid(Vec<String>),
}

impl<T> Validation<T> {
    pub fn invalid(reason: impl Into<String>) -> Self {
        Validation::Invalid(vec![reason.into()])
    }

    pub fn is_valid(&self) -> bool {
        matches!(self, Validation::Valid(_))
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Validation<U> {
        match self {
            Validation::Valid(value) => Validation::Valid(f(value)),
            Validation::Invalid(reasons) => Validation::Invalid(reasons),
        }
    }

    pub fn and_then<U>(self, f: impl FnOnce(T) -> Validation<U>) -> Validation<U> {
        match self {
            Validation::Valid(value) => f(value),
            Validation::Invalid(reasons) => Validation::Invalid(reasons),
        }
    }

    /// Combine two checks, keeping the reasons of both when either fails.
    pub fn zip<U>(self, other: Validation<U>) -> Validation<(T, U)> {
        match (self, other) {
            (Validation::Valid(a), Validation::Valid(b)) => Validation::Valid((a, b)),
            (Validation::Invalid(mut a), Validation::Invalid(b)) => {
                a.extend(b);
                Validation::Invalid(a)
            }
            (Validation::Invalid(a), _) | (_, Validation::Invalid(a)) => Validation::Invalid(a),
        }
    }

    pub fn into_result(self) -> Result<T, Vec<String>> {
        match self {
            Validation::Valid(value) => Ok(value),
            Validation::Invalid(reasons) => Err(reasons),
        }
    }
}

/// `value` must be a JSON object.
pub fn json_object<'a>(value: Option<&'a Value>, field: &str) -> Validation<&'a Map<String, Value>> {
    match value {
        Some(Value::Object(map)) => Validation::Valid(map),
        Some(other) => Validation::invalid(format!(
            "property \"{}\" was not a JSON object: {}",
            field, other
        )),
        None => Validation::invalid(format!("property \"{}\" was missing", field)),
    }
}

/// `value` must be a JSON number of any kind.
pub fn number<'a>(value: Option<&'a Value>, field: &str) -> Validation<&'a Number> {
    match value {
        Some(Value::Number(n)) => Validation::Valid(n),
        Some(other) => Validation::invalid(format!(
            "property \"{}\" was not a number: {}",
            field, other
        )),
        None => Validation::invalid(format!("property \"{}\" was missing", field)),
    }
}

/// `value` must be an integer in `0..=u64::MAX`. Floats such as `1.0` are rejected.
pub fn non_negative_integer(value: Option<&Value>, field: &str) -> Validation<u64> {
    number(value, field).and_then(|n| match n.as_u64() {
        Some(v) => Validation::Valid(v),
        None => Validation::invalid(format!(
            "property \"{}\" was not a non-negative integer: {}",
            field, n
        )),
    })
}

/// `value` must be a boolean when present; absent or `null` yields `default`.
pub fn optional_bool(value: Option<&Value>, field: &str, default: bool) -> Validation<bool> {
    match value {
        None | Some(Value::Null) => Validation::Valid(default),
        Some(Value::Bool(b)) => Validation::Valid(*b),
        Some(other) => Validation::invalid(format!(
            "property \"{}\" was not a boolean: {}",
            field, other
        )),
    }
}

/// Container identifiers are non-empty and start with the `!` sigil.
pub fn container_id(id: &str) -> Validation<&str> {
    if id.is_empty() {
        return Validation::invalid("container id was empty");
    }
    if !id.starts_with('!') {
        return Validation::invalid(format!("container id did not start with '!': \"{}\"", id));
    }
    Validation::Valid(id)
}
