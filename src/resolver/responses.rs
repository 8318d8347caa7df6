//! `$resp[<ref>]...` substitution from earlier responses

use regex::{Captures, Regex};
use serde_json::Value;
use std::sync::LazyLock;

use super::{map_strings, render};
use crate::jsonpath;
use crate::runner::RuntimeContext;

/// Whole-string reference; the jsonpath argument runs to the final `)`
static EXACT_RESP_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\$resp\[([^\]]+)\]\.(?:(status)|(text)|jsonpath\((.*)\))$")
        .expect("failed to compile response reference regex")
});

/// Embedded reference; the jsonpath argument may hold one level of parentheses
static INLINE_RESP_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"\$resp\[([^\]]+)\]\.(?:(status)|(text)|jsonpath\(([^()]*(?:\([^()]*\)[^()]*)*)\))",
    )
    .expect("failed to compile response reference regex")
});

/// Value produced by a resolved reference
enum Resolved {
    Single(Value),
    Many(Vec<Value>),
}

impl Resolved {
    fn into_value(self) -> Value {
        match self {
            Resolved::Single(v) => v,
            Resolved::Many(items) => Value::Array(items),
        }
    }

    fn render(&self) -> String {
        match self {
            Resolved::Single(v) => render(v),
            Resolved::Many(items) => items.iter().map(render).collect::<Vec<_>>().join(","),
        }
    }
}

/// Substitute response references in every string leaf of `value`
pub fn substitute_responses(value: &Value, ctx: &RuntimeContext) -> Value {
    map_strings(value, &|s| substitute_response_str(s, ctx))
}

/// Substitute response references in a single string
///
/// A string that is exactly one reference keeps the resolved value's type.
/// Embedded references are replaced by their string form, with multiple
/// jsonpath matches joined by commas. Unresolvable references stay as written.
pub fn substitute_response_str(text: &str, ctx: &RuntimeContext) -> Value {
    if !text.contains("$resp[") {
        return Value::String(text.to_string());
    }

    if let Some(caps) = EXACT_RESP_RE
        .captures(text)
        .filter(|caps| caps.get(4).is_none_or(|expr| !expr.as_str().contains("$resp[")))
    {
        if let Some(resolved) = resolve(&caps, ctx) {
            return resolved.into_value();
        }
    }

    let replaced = INLINE_RESP_RE.replace_all(text, |caps: &Captures| {
        resolve(caps, ctx)
            .map(|resolved| resolved.render())
            .unwrap_or_else(|| caps[0].to_string())
    });

    Value::String(replaced.into_owned())
}

fn resolve(caps: &Captures, ctx: &RuntimeContext) -> Option<Resolved> {
    let reference = &caps[1];
    let Some(response) = ctx.lookup(reference) else {
        tracing::debug!(reference, "unresolved response reference");
        return None;
    };

    if caps.get(2).is_some() {
        return Some(Resolved::Single(Value::from(response.status)));
    }
    if caps.get(3).is_some() {
        return Some(Resolved::Single(Value::String(response.text.clone())));
    }

    let expr = caps.get(4)?.as_str();
    let body = response.json()?;
    let mut matches = match jsonpath::find(expr, &body) {
        Ok(matches) => matches,
        Err(e) => {
            tracing::debug!(reference, error = %e, "response reference query failed");
            return None;
        }
    };

    match matches.len() {
        0 => None,
        1 => matches.pop().map(Resolved::Single),
        _ => Some(Resolved::Many(matches)),
    }
}
