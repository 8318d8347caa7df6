//! JSON path queries over `serde_json::Value`
//!
//! Supported syntax:
//! - `$` root (optional, a bare `data.id` is read as `$.data.id`)
//! - `.name`, `['name']`, `["name"]` child member
//! - `[0]`, `[-1]` array index, `[0,2]` / `['a','b']` unions
//! - `[1:3]`, `[::2]` array slices
//! - `.*`, `[*]` wildcard
//! - `..name`, `..*`, `..[0]` recursive descent
//!
//! Filter expressions are not supported.

use serde_json::Value;
use thiserror::Error;

/// A path expression that could not be parsed
#[derive(Error, Debug, Clone, PartialEq)]
#[error("Invalid JSON path '{path}': {reason}")]
pub struct JsonPathError {
    pub path: String,
    pub reason: String,
}

type Result<T> = std::result::Result<T, JsonPathError>;

/// A parsed JSON path expression
#[derive(Debug, Clone, PartialEq)]
pub struct JsonPath {
    segments: Vec<Segment>,
}

#[derive(Debug, Clone, PartialEq)]
enum Segment {
    Child(Selector),
    Descendant(Selector),
}

#[derive(Debug, Clone, PartialEq)]
enum Selector {
    Name(String),
    Index(i64),
    Wildcard,
    Slice {
        start: Option<i64>,
        end: Option<i64>,
        step: i64,
    },
    Union(Vec<Selector>),
}

impl JsonPath {
    /// Parse a path expression
    pub fn parse(expr: &str) -> Result<Self> {
        Parser::new(expr).parse()
    }

    /// Evaluate against a document, returning every match in document order
    pub fn query<'a>(&self, root: &'a Value) -> Vec<&'a Value> {
        let mut current = vec![root];

        for segment in &self.segments {
            let mut next = Vec::new();
            for node in current {
                match segment {
                    Segment::Child(selector) => selector.select(node, &mut next),
                    Segment::Descendant(selector) => {
                        let mut nodes = Vec::new();
                        collect_descendants(node, &mut nodes);
                        for n in nodes {
                            selector.select(n, &mut next);
                        }
                    }
                }
            }
            current = next;
        }

        current
    }
}

/// Parse `expr` and evaluate it against `root`, cloning the matches
pub fn find(expr: &str, root: &Value) -> Result<Vec<Value>> {
    let path = JsonPath::parse(expr)?;
    Ok(path.query(root).into_iter().cloned().collect())
}

impl Selector {
    fn select<'a>(&self, node: &'a Value, out: &mut Vec<&'a Value>) {
        match self {
            Selector::Name(name) => {
                if let Some(v) = node.as_object().and_then(|map| map.get(name)) {
                    out.push(v);
                }
            }
            Selector::Index(index) => {
                if let Some(items) = node.as_array() {
                    let len = items.len() as i64;
                    let idx = if *index < 0 { index + len } else { *index };
                    if (0..len).contains(&idx) {
                        out.push(&items[idx as usize]);
                    }
                }
            }
            Selector::Wildcard => match node {
                Value::Array(items) => out.extend(items.iter()),
                Value::Object(map) => out.extend(map.values()),
                _ => {}
            },
            Selector::Slice { start, end, step } => {
                if let Some(items) = node.as_array() {
                    for idx in slice_indices(items.len() as i64, *start, *end, *step) {
                        out.push(&items[idx]);
                    }
                }
            }
            Selector::Union(selectors) => {
                for selector in selectors {
                    selector.select(node, out);
                }
            }
        }
    }
}

/// The node itself followed by all of its descendants, pre-order
fn collect_descendants<'a>(node: &'a Value, out: &mut Vec<&'a Value>) {
    out.push(node);
    match node {
        Value::Array(items) => {
            for item in items {
                collect_descendants(item, out);
            }
        }
        Value::Object(map) => {
            for value in map.values() {
                collect_descendants(value, out);
            }
        }
        _ => {}
    }
}

fn slice_indices(len: i64, start: Option<i64>, end: Option<i64>, step: i64) -> Vec<usize> {
    let normalize = |i: i64| if i < 0 { i + len } else { i };
    let mut indices = Vec::new();

    if step > 0 {
        let mut i = start.map(normalize).unwrap_or(0).clamp(0, len);
        let stop = end.map(normalize).unwrap_or(len).clamp(0, len);
        while i < stop {
            indices.push(i as usize);
            i = match i.checked_add(step) {
                Some(next) => next,
                None => break,
            };
        }
    } else {
        let mut i = start.map(normalize).unwrap_or(len - 1).clamp(-1, len - 1);
        let stop = end.map(normalize).unwrap_or(-1).clamp(-1, len - 1);
        while i > stop {
            indices.push(i as usize);
            i = match i.checked_add(step) {
                Some(next) => next,
                None => break,
            };
        }
    }

    indices
}

struct Parser<'a> {
    expr: &'a str,
    chars: Vec<char>,
    pos: usize,
}

impl<'a> Parser<'a> {
    fn new(expr: &'a str) -> Self {
        Self {
            expr,
            chars: expr.trim().chars().collect(),
            pos: 0,
        }
    }

    fn invalid(&self, reason: impl std::fmt::Display) -> JsonPathError {
        JsonPathError {
            path: self.expr.to_string(),
            reason: reason.to_string(),
        }
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn parse(mut self) -> Result<JsonPath> {
        let mut segments = Vec::new();

        match self.peek() {
            None => return Err(self.invalid("empty path")),
            Some('$') => self.pos += 1,
            Some('[') => {}
            Some(_) => {
                let name = self.read_name();
                if name.is_empty() {
                    return Err(self.invalid(format!("unexpected character at {}", self.pos)));
                }
                segments.push(Segment::Child(Selector::Name(name)));
            }
        }

        while let Some(c) = self.peek() {
            match c {
                '.' => {
                    self.pos += 1;
                    let descendant = self.peek() == Some('.');
                    if descendant {
                        self.pos += 1;
                    }

                    let selector = match self.peek() {
                        Some('[') => self.parse_bracket()?,
                        Some('*') => {
                            self.pos += 1;
                            Selector::Wildcard
                        }
                        _ => {
                            let name = self.read_name();
                            if name.is_empty() {
                                return Err(self.invalid("expected a member name after '.'"));
                            }
                            Selector::Name(name)
                        }
                    };

                    segments.push(if descendant {
                        Segment::Descendant(selector)
                    } else {
                        Segment::Child(selector)
                    });
                }
                '[' => {
                    let selector = self.parse_bracket()?;
                    segments.push(Segment::Child(selector));
                }
                other => {
                    return Err(self.invalid(format!(
                        "unexpected '{}' at position {}",
                        other, self.pos
                    )));
                }
            }
        }

        Ok(JsonPath { segments })
    }

    fn read_name(&mut self) -> String {
        let mut name = String::new();
        while let Some(c) = self.peek() {
            if c == '.' || c == '[' {
                break;
            }
            name.push(c);
            self.pos += 1;
        }
        name.trim().to_string()
    }

    /// Parse a `[...]` selector; `pos` is on the opening bracket
    fn parse_bracket(&mut self) -> Result<Selector> {
        self.pos += 1;
        let mut content = String::new();
        let mut quote: Option<char> = None;

        loop {
            let c = self
                .peek()
                .ok_or_else(|| self.invalid("unterminated '['"))?;
            self.pos += 1;

            match quote {
                Some(q) => {
                    if c == '\\' {
                        content.push(c);
                        if let Some(escaped) = self.peek() {
                            content.push(escaped);
                            self.pos += 1;
                        }
                        continue;
                    }
                    if c == q {
                        quote = None;
                    }
                }
                None => {
                    if c == ']' {
                        break;
                    }
                    if c == '\'' || c == '"' {
                        quote = Some(c);
                    }
                }
            }
            content.push(c);
        }

        let content = content.trim();
        if content.is_empty() {
            return Err(self.invalid("empty '[]' selector"));
        }
        if content.starts_with('?') || content.starts_with('(') {
            return Err(self.invalid("filter expressions are not supported"));
        }
        if content == "*" {
            return Ok(Selector::Wildcard);
        }

        let mut selectors = split_top_level(content)
            .iter()
            .map(|part| self.parse_bracket_item(part))
            .collect::<Result<Vec<_>>>()?;

        if selectors.len() == 1 {
            Ok(selectors.remove(0))
        } else {
            Ok(Selector::Union(selectors))
        }
    }

    fn parse_bracket_item(&self, part: &str) -> Result<Selector> {
        let part = part.trim();

        if let Some(name) = unquote(part) {
            return Ok(Selector::Name(name));
        }
        if part == "*" {
            return Ok(Selector::Wildcard);
        }
        if part.contains(':') {
            let bounds: Vec<&str> = part.split(':').map(str::trim).collect();
            if bounds.len() > 3 {
                return Err(self.invalid(format!("bad slice '{part}'")));
            }
            let parse_bound = |s: &str| -> Result<Option<i64>> {
                if s.is_empty() {
                    Ok(None)
                } else {
                    s.parse()
                        .map(Some)
                        .map_err(|_| self.invalid(format!("bad slice bound '{s}'")))
                }
            };
            let start = parse_bound(bounds[0])?;
            let end = parse_bound(bounds.get(1).copied().unwrap_or(""))?;
            let step = parse_bound(bounds.get(2).copied().unwrap_or(""))?.unwrap_or(1);
            if step == 0 {
                return Err(self.invalid("slice step cannot be zero"));
            }
            return Ok(Selector::Slice { start, end, step });
        }

        part.parse::<i64>()
            .map(Selector::Index)
            .map_err(|_| self.invalid(format!("unsupported selector '{part}'")))
    }
}

/// Split on commas that are not inside quotes
fn split_top_level(content: &str) -> Vec<String> {
    let mut parts = Vec::new();
    let mut current = String::new();
    let mut quote: Option<char> = None;
    let mut escaped = false;

    for c in content.chars() {
        if escaped {
            current.push(c);
            escaped = false;
            continue;
        }
        match quote {
            Some(q) => {
                if c == '\\' {
                    escaped = true;
                } else if c == q {
                    quote = None;
                }
                current.push(c);
            }
            None => match c {
                ',' => parts.push(std::mem::take(&mut current)),
                '\'' | '"' => {
                    quote = Some(c);
                    current.push(c);
                }
                _ => current.push(c),
            },
        }
    }
    parts.push(current);

    parts
}

/// Strip matching quotes and resolve backslash escapes
fn unquote(part: &str) -> Option<String> {
    let first = part.chars().next()?;
    if (first != '\'' && first != '"') || part.len() < 2 || !part.ends_with(first) {
        return None;
    }

    let inner = &part[1..part.len() - 1];
    let mut out = String::with_capacity(inner.len());
    let mut chars = inner.chars();
    while let Some(c) = chars.next() {
        if c == '\\' {
            if let Some(next) = chars.next() {
                out.push(next);
            }
        } else {
            out.push(c);
        }
    }
    Some(out)
}
