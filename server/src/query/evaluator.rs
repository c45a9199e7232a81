//! Per-document query evaluation.

use serde_json::Value;

use super::like::like_match;

/// Structural equality, except that two numbers compare by double value
/// so `1` and `1.0` are equal.
#[must_use]
#[allow(clippy::float_cmp)]
pub fn value_eq(a: &Value, b: &Value) -> bool {
    if a.is_number() && b.is_number() {
        return a.as_f64() == b.as_f64();
    }
    a == b
}

/// Test a document against a query object.
///
/// `$or` takes any-of semantics over its sub-queries and `$and` all-of;
/// any other entry is a field condition. A non-object query matches
/// nothing.
#[must_use]
pub fn evaluate_query(doc: &Value, query: &Value) -> bool {
    let Some(conditions) = query.as_object() else {
        return false;
    };

    if let Some(subs) = conditions.get("$or") {
        return subs
            .as_array()
            .is_some_and(|arr| arr.iter().any(|sub| evaluate_query(doc, sub)));
    }

    if let Some(subs) = conditions.get("$and") {
        return subs
            .as_array()
            .is_some_and(|arr| arr.iter().all(|sub| evaluate_query(doc, sub)));
    }

    conditions
        .iter()
        .all(|(field, cond)| evaluate_condition(doc, field, cond))
}

/// Test one field condition. A document without the field fails every
/// condition on it, including `$in`.
fn evaluate_condition(doc: &Value, field: &str, cond: &Value) -> bool {
    let Some(value) = doc.get(field) else {
        return false;
    };

    let Some(ops) = cond.as_object() else {
        // Bare literal: equality.
        return value_eq(value, cond);
    };

    ops.iter().all(|(op, arg)| match op.as_str() {
        "$eq" => value_eq(value, arg),
        "$gt" => numeric_pair(value, arg).is_some_and(|(v, a)| v > a),
        "$lt" => numeric_pair(value, arg).is_some_and(|(v, a)| v < a),
        "$like" => match (value.as_str(), arg.as_str()) {
            (Some(v), Some(pattern)) => like_match(v, pattern),
            _ => false,
        },
        "$in" => arg
            .as_array()
            .is_some_and(|candidates| candidates.iter().any(|x| value_eq(value, x))),
        // Unknown operators match nothing.
        _ => false,
    })
}

/// Both sides as doubles, when both are numbers.
fn numeric_pair(value: &Value, arg: &Value) -> Option<(f64, f64)> {
    Some((value.as_f64()?, arg.as_f64()?))
}
