//! Convert upstream XML into a `serde_json::Value` tree.
//!
//! Attributes, child elements and element text share one key namespace:
//! `<station id="TBS"><name>TBS</name></station>` decodes to
//! `{"id": "TBS", "name": "TBS"}`. Repeated sibling elements collapse into an
//! array in document order.

use std::sync::LazyLock;

use regex::Regex;
use roxmltree::{Document, Node};
use serde_json::{Map, Number, Value};

use crate::error::Result;

/// Key under which text of an element that also has attributes or children
/// is stored.
pub const TEXT_KEY: &str = "#text";

/// Decimal literal: optional sign, leading zeros, fraction and exponent.
/// Group 2 is the literal without sign and leading zeros.
#[allow(clippy::expect_used)] // Static regex that is guaranteed to be valid
static DECIMAL_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^([-+])?0*(\.[0-9]+([eE]-?[0-9]+)?|[0-9]+(\.[0-9]+)?([eE]-?[0-9]+)?)$")
        .expect("valid regex")
});

/// Hexadecimal literal such as `0x1F`.
#[allow(clippy::expect_used)] // Static regex that is guaranteed to be valid
static HEX_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([-+])?0x([0-9a-fA-F]+)$").expect("valid regex"));

/// Largest magnitude below which every whole `f64` is an exact integer.
const MAX_SAFE_INTEGER: f64 = 9_007_199_254_740_992.0;

/// Get the tag name without namespace prefix.
///
/// # Examples
/// ```
/// use roxmltree::Document;
/// use radiko_harvester::xml::get_tag_name;
///
/// let doc = Document::parse(r#"<r:radiko xmlns:r="urn:x"/>"#).unwrap();
/// assert_eq!(get_tag_name(doc.root_element()), "radiko");
/// ```
pub fn get_tag_name<'a>(node: Node<'a, '_>) -> &'a str {
    node.tag_name().name()
}

/// Get all element children of a node (excludes text nodes, comments, etc.).
pub fn element_children<'a, 'input>(
    node: Node<'a, 'input>,
) -> impl Iterator<Item = Node<'a, 'input>> {
    node.children().filter(|child| child.is_element())
}

/// Decode an XML document into a generic tree.
///
/// The result is an object with a single key, the root element name.
/// Fails only when the text is not well-formed XML.
///
/// # Examples
/// ```
/// use radiko_harvester::xml::decode;
/// use serde_json::json;
///
/// let tree = decode(r#"<stations><station id="TBS"><name>TBS</name></station></stations>"#).unwrap();
/// assert_eq!(tree, json!({"stations": {"station": {"id": "TBS", "name": "TBS"}}}));
/// ```
pub fn decode(xml: &str) -> Result<Value> {
    let doc = Document::parse(xml)?;
    let root = doc.root_element();

    let mut tree = Map::new();
    tree.insert(get_tag_name(root).to_string(), decode_element(root));
    Ok(Value::Object(tree))
}

fn decode_element(node: Node<'_, '_>) -> Value {
    let has_attributes = node.attributes().next().is_some();
    let has_children = element_children(node).next().is_some();

    if !has_attributes && !has_children {
        return scalar(&collect_text(node));
    }

    let mut map = Map::new();

    // Attribute values are never number-coerced
    for attribute in node.attributes() {
        map.insert(
            attribute.name().to_string(),
            Value::String(attribute.value().to_string()),
        );
    }

    for child in element_children(node) {
        insert_child(&mut map, get_tag_name(child), decode_element(child));
    }

    let text = collect_text(node);
    if !text.is_empty() {
        map.insert(TEXT_KEY.to_string(), scalar(&text));
    }

    Value::Object(map)
}

/// Insert a child value, turning repeated keys into an array.
fn insert_child(map: &mut Map<String, Value>, key: &str, value: Value) {
    match map.get_mut(key) {
        Some(Value::Array(items)) => items.push(value),
        Some(existing) => {
            let first = existing.take();
            *existing = Value::Array(vec![first, value]);
        }
        None => {
            map.insert(key.to_string(), value);
        }
    }
}

/// Concatenate the direct text (and CDATA) children of a node, trimmed.
fn collect_text(node: Node<'_, '_>) -> String {
    let text: String = node
        .children()
        .filter(|child| child.is_text())
        .filter_map(|child| child.text())
        .collect();
    text.trim().to_string()
}

fn scalar(text: &str) -> Value {
    parse_number(text)
        .map(Value::Number)
        .unwrap_or_else(|| Value::String(text.to_string()))
}

/// Number coercion of element text.
///
/// Accepts decimal literals (with leading zeros and exponents) and hex
/// literals. Text whose digits would not survive the conversion stays text.
fn parse_number(text: &str) -> Option<Number> {
    if let Some(caps) = HEX_PATTERN.captures(text) {
        let magnitude = i64::from_str_radix(&caps[2], 16).ok()?;
        let negative = caps.get(1).is_some_and(|m| m.as_str() == "-");
        return Some(Number::from(if negative { -magnitude } else { magnitude }));
    }

    let caps = DECIMAL_PATTERN.captures(text)?;
    let negative = caps.get(1).is_some_and(|m| m.as_str() == "-");
    let unsigned = &caps[2];
    let has_exponent = caps.get(3).is_some() || caps.get(5).is_some();

    if has_exponent || unsigned.contains('.') {
        let magnitude: f64 = unsigned.parse().ok()?;
        if !has_exponent && magnitude.to_string() != trim_fraction_zeros(unsigned) {
            return None;
        }
        return float_number(if negative { -magnitude } else { magnitude });
    }

    // Integers too large for 64 bits stay strings so no digits are lost
    if negative {
        format!("-{unsigned}").parse::<i64>().ok().map(Number::from)
    } else if let Ok(n) = unsigned.parse::<i64>() {
        Some(Number::from(n))
    } else {
        unsigned.parse::<u64>().ok().map(Number::from)
    }
}

/// `1.50` -> `1.5`, `1.0` -> `1`, `.5` -> `0.5`.
fn trim_fraction_zeros(literal: &str) -> String {
    if !literal.contains('.') {
        return literal.to_string();
    }
    let trimmed = literal.trim_end_matches('0').trim_end_matches('.');
    match trimmed {
        "" => "0".to_string(),
        t if t.starts_with('.') => format!("0{t}"),
        t => t.to_string(),
    }
}

/// Whole values become integers, so `1e5` serializes as `100000`.
fn float_number(value: f64) -> Option<Number> {
    if value.fract() == 0.0 && value.abs() < MAX_SAFE_INTEGER {
        return Some(Number::from(value as i64));
    }
    Number::from_f64(value)
}
