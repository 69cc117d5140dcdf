//! Wire formats and query parameter parsing.
//!
//! Every endpoint speaks either JSON or plain text, picked by the `format`
//! query parameter. Plain text carries one item per line.

use axum::http::header;
use axum::response::{IntoResponse, Json, Response};
use bytes::Bytes;
use serde_json::Value;

use crate::error::{ServerError, ServerResult};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Format {
    Json,
    Plain,
}

impl Format {
    /// Parse the `format` parameter. Absent means JSON; case is ignored.
    pub fn from_param(raw: Option<&str>) -> ServerResult<Self> {
        match raw.map(str::to_ascii_lowercase).as_deref() {
            None | Some("json") => Ok(Self::Json),
            Some("plain") => Ok(Self::Plain),
            Some(other) => Err(ServerError::bad_request_with(
                "Error: wrong format parameter",
                format!("format={other}"),
            )),
        }
    }
}

/// A boolean switch such as `push_if_new` or `delete`.
///
/// Absent, empty, `false` and `0` are off; any other value is on.
pub fn parse_flag(raw: Option<&str>) -> bool {
    match raw.map(str::trim) {
        None | Some("") | Some("0") => false,
        Some(value) => !value.eq_ignore_ascii_case("false"),
    }
}

/// A non-negative decimal parameter. Only ASCII digits are accepted.
///
/// `label` names the parameter in the error message, which for
/// `push_if_older_than` is `Error: wrong if_older_than parameter`.
pub fn parse_count(raw: Option<&str>, default: u64, label: &str) -> ServerResult<u64> {
    let Some(raw) = raw else {
        return Ok(default);
    };
    let invalid = || {
        ServerError::bad_request_with(format!("Error: wrong {label} parameter"), format!("{label}={raw}"))
    };
    if raw.is_empty() || !raw.bytes().all(|b| b.is_ascii_digit()) {
        return Err(invalid());
    }
    raw.parse().map_err(|_| invalid())
}

fn body_text(body: &Bytes) -> ServerResult<&str> {
    std::str::from_utf8(body).map_err(|e| ServerError::bad_request_with("Error: can't decode text input", e))
}

fn body_json(body: &Bytes) -> ServerResult<Value> {
    serde_json::from_slice(body).map_err(|e| ServerError::bad_request_with("Error: can't decode JSON input", e))
}

/// Decode a push body into its items.
///
/// JSON bodies must be an array. Plain bodies are split on every `\n` with
/// nothing trimmed: an empty body is one empty item and a trailing newline
/// adds an empty last item.
pub fn decode_items(format: Format, body: &Bytes) -> ServerResult<Vec<Value>> {
    match format {
        Format::Json => match body_json(body)? {
            Value::Array(items) => Ok(items),
            other => Err(ServerError::bad_request_with(
                "Error: JSON must be a list of object",
                other,
            )),
        },
        Format::Plain => Ok(body_text(body)?
            .split('\n')
            .map(|line| Value::String(line.to_string()))
            .collect()),
    }
}

/// Decode a store body. JSON bodies must be an object or an array; plain
/// bodies are stored as one string.
pub fn decode_object(format: Format, body: &Bytes) -> ServerResult<Value> {
    match format {
        Format::Json => match body_json(body)? {
            value @ (Value::Object(_) | Value::Array(_)) => Ok(value),
            other => Err(ServerError::bad_request_with(
                "Error: JSON must be an object or list",
                other,
            )),
        },
        Format::Plain => Ok(Value::String(body_text(body)?.to_string())),
    }
}

/// Text form of a payload: strings verbatim, anything else as compact JSON.
pub fn render_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn plain(text: String) -> Response {
    ([(header::CONTENT_TYPE, "text/plain; charset=utf-8")], text).into_response()
}

pub fn render_count(format: Format, count: usize) -> Response {
    match format {
        Format::Json => Json(count).into_response(),
        Format::Plain => plain(count.to_string()),
    }
}

pub fn render_items(format: Format, items: Vec<Value>) -> Response {
    match format {
        Format::Json => Json(items).into_response(),
        Format::Plain => plain(items.iter().map(render_text).collect::<Vec<_>>().join("\n")),
    }
}

pub fn render_id(format: Format, id: String) -> Response {
    match format {
        Format::Json => Json(id).into_response(),
        Format::Plain => plain(id),
    }
}

/// A loaded payload, or the empty value (`{}` / empty text) if none matched.
pub fn render_loaded(format: Format, payload: Option<Value>) -> Response {
    match (format, payload) {
        (Format::Json, Some(value)) => Json(value).into_response(),
        (Format::Json, None) => Json(Value::Object(Default::default())).into_response(),
        (Format::Plain, Some(value)) => plain(render_text(&value)),
        (Format::Plain, None) => plain(String::new()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn format_defaults_to_json_and_ignores_case() {
        assert_eq!(Format::from_param(None).unwrap(), Format::Json);
        assert_eq!(Format::from_param(Some("PLAIN")).unwrap(), Format::Plain);
        assert_eq!(Format::from_param(Some("Json")).unwrap(), Format::Json);
        assert!(Format::from_param(Some("xml")).is_err());
    }

    #[test]
    fn flags() {
        assert!(!parse_flag(None));
        assert!(!parse_flag(Some("")));
        assert!(!parse_flag(Some("false")));
        assert!(!parse_flag(Some("FALSE")));
        assert!(!parse_flag(Some("0")));
        assert!(parse_flag(Some("true")));
        assert!(parse_flag(Some("1")));
        assert!(parse_flag(Some("yes")));
    }

    #[test]
    fn counts_accept_digits_only() {
        assert_eq!(parse_count(None, 1, "quantity").unwrap(), 1);
        assert_eq!(parse_count(Some("42"), 1, "quantity").unwrap(), 42);
        for bad in ["", "-1", "1.5", "ten", " 3", "+3"] {
            assert!(parse_count(Some(bad), 1, "quantity").is_err(), "{bad:?}");
        }
        // Digits, but too large for u64.
        assert!(parse_count(Some("99999999999999999999999"), 0, "quantity").is_err());
    }

    #[test]
    fn count_error_uses_the_label() {
        let err = parse_count(Some("x"), 0, "if_older_than").unwrap_err();
        assert_eq!(err.to_string(), "Error: wrong if_older_than parameter");
    }

    #[test]
    fn json_items_must_be_an_array() {
        let items = decode_items(Format::Json, &Bytes::from_static(b"[\"a\", {\"b\": 1}]")).unwrap();
        assert_eq!(items, vec![json!("a"), json!({"b": 1})]);

        let err = decode_items(Format::Json, &Bytes::from_static(b"{\"a\": 1}")).unwrap_err();
        assert_eq!(err.to_string(), "Error: JSON must be a list of object");

        let err = decode_items(Format::Json, &Bytes::from_static(b"[1,")).unwrap_err();
        assert_eq!(err.to_string(), "Error: can't decode JSON input");
    }

    #[test]
    fn plain_items_are_lines() {
        let items = decode_items(Format::Plain, &Bytes::from_static(b"0\n1\n2")).unwrap();
        assert_eq!(items, vec![json!("0"), json!("1"), json!("2")]);

        let items = decode_items(Format::Plain, &Bytes::from_static(b"a\n\nb")).unwrap();
        assert_eq!(items, vec![json!("a"), json!(""), json!("b")]);
    }

    #[test]
    fn plain_split_keeps_every_segment() {
        let items = decode_items(Format::Plain, &Bytes::from_static(b"a\n")).unwrap();
        assert_eq!(items, vec![json!("a"), json!("")]);

        let items = decode_items(Format::Plain, &Bytes::from_static(b"a\r\nb")).unwrap();
        assert_eq!(items, vec![json!("a\r"), json!("b")]);

        let items = decode_items(Format::Plain, &Bytes::new()).unwrap();
        assert_eq!(items, vec![json!("")]);
    }

    #[test]
    fn plain_rejects_invalid_utf8() {
        assert!(decode_items(Format::Plain, &Bytes::from_static(&[0xff, 0xfe])).is_err());
    }

    #[test]
    fn store_body_shapes() {
        assert_eq!(
            decode_object(Format::Json, &Bytes::from_static(b"{\"k\": 1}")).unwrap(),
            json!({"k": 1})
        );
        assert_eq!(decode_object(Format::Json, &Bytes::from_static(b"[1]")).unwrap(), json!([1]));
        assert!(decode_object(Format::Json, &Bytes::from_static(b"\"str\"")).is_err());
        assert_eq!(
            decode_object(Format::Plain, &Bytes::from_static(b"free text\n")).unwrap(),
            json!("free text\n")
        );
    }

    #[test]
    fn text_rendering() {
        assert_eq!(render_text(&json!("line")), "line");
        assert_eq!(render_text(&json!({"a": [1, 2]})), r#"{"a":[1,2]}"#);
        assert_eq!(render_text(&json!(7)), "7");
    }
}
