use pixela_core::types::PostPixelRequest;
use serde_json::{Map, Value};

use crate::error::ToolError;

/// Typed view over a `tools/call` argument bag.
///
/// Required accessors fail with `MissingParameter` when the key is absent or
/// not a string. Optional accessors never fail: a wrong type reads as absent.
#[derive(Clone, Copy, Debug)]
pub struct ToolArgs<'a> {
    map: &'a Map<String, Value>,
}

impl<'a> ToolArgs<'a> {
    pub fn new(map: &'a Map<String, Value>) -> Self {
        Self { map }
    }

    pub fn required(&self, key: &'static str) -> Result<&'a str, ToolError> {
        self.map
            .get(key)
            .and_then(Value::as_str)
            .ok_or(ToolError::MissingParameter(key))
    }

    pub fn required_owned(&self, key: &'static str) -> Result<String, ToolError> {
        self.required(key).map(str::to_string)
    }

    /// Non-empty string or `None`.
    pub fn optional(&self, key: &str) -> Option<&'a str> {
        self.map
            .get(key)
            .and_then(Value::as_str)
            .filter(|value| !value.is_empty())
    }

    pub fn optional_owned(&self, key: &str) -> Option<String> {
        self.optional(key).map(str::to_string)
    }

    /// The pixel date, defaulting to today in local time.
    pub fn date_or_today(&self, key: &str) -> String {
        self.optional_owned(key).unwrap_or_else(today)
    }

    /// A JSON boolean or the strings `"true"` / `"false"`.
    pub fn optional_flag(&self, key: &str) -> Option<bool> {
        match self.map.get(key)? {
            Value::Bool(flag) => Some(*flag),
            Value::String(text) => match text.as_str() {
                "true" => Some(true),
                "false" => Some(false),
                _ => None,
            },
            _ => None,
        }
    }

    /// An array of strings, or a comma-separated string.
    pub fn string_list(&self, key: &str) -> Option<Vec<String>> {
        let items: Vec<String> = match self.map.get(key)? {
            Value::Array(items) => items
                .iter()
                .filter_map(Value::as_str)
                .map(|item| item.trim().to_string())
                .collect(),
            Value::String(text) => text.split(',').map(|item| item.trim().to_string()).collect(),
            _ => return None,
        };
        let items: Vec<String> = items.into_iter().filter(|item| !item.is_empty()).collect();
        (!items.is_empty()).then_some(items)
    }

    /// Batch pixel array. Every element needs a non-empty `date` and
    /// `quantity`; the first defect aborts the whole batch.
    pub fn pixels(&self, key: &'static str) -> Result<Vec<PostPixelRequest>, ToolError> {
        let items = self
            .map
            .get(key)
            .and_then(Value::as_array)
            .ok_or(ToolError::MissingParameter(key))?;
        if items.is_empty() {
            return Err(ToolError::invalid(key, "must contain at least one pixel"));
        }

        items
            .iter()
            .enumerate()
            .map(|(index, item)| -> Result<PostPixelRequest, ToolError> {
                let object = item
                    .as_object()
                    .ok_or_else(|| ToolError::invalid(format!("{key}[{index}]"), "must be an object"))?;
                let element = ToolArgs::new(object);
                let field = |name: &str| {
                    element.optional_owned(name).ok_or_else(|| {
                        ToolError::invalid(
                            format!("{key}[{index}].{name}"),
                            "is required and must be a non-empty string",
                        )
                    })
                };
                Ok(PostPixelRequest {
                    date: field("date")?,
                    quantity: field("quantity")?,
                    optional_data: element.optional_owned("optionalData"),
                })
            })
            .collect()
    }
}

pub fn today() -> String {
    chrono::Local::now().format("%Y%m%d").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn bag(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            _ => panic!("test args must be an object"),
        }
    }

    #[test]
    fn required_rejects_absent_and_non_string() {
        let map = bag(json!({ "username": 42, "token": "" }));
        let args = ToolArgs::new(&map);
        assert!(matches!(
            args.required("username"),
            Err(ToolError::MissingParameter("username"))
        ));
        assert!(matches!(
            args.required("graphID"),
            Err(ToolError::MissingParameter("graphID"))
        ));
        assert_eq!(args.required("token").unwrap(), "");
    }

    #[test]
    fn optional_treats_wrong_type_and_empty_as_absent() {
        let map = bag(json!({ "timezone": 9, "unit": "", "color": "sora" }));
        let args = ToolArgs::new(&map);
        assert_eq!(args.optional("timezone"), None);
        assert_eq!(args.optional("unit"), None);
        assert_eq!(args.optional("color"), Some("sora"));
    }

    #[test]
    fn date_defaults_to_today_in_compact_form() {
        let map = bag(json!({}));
        let date = ToolArgs::new(&map).date_or_today("date");
        assert_eq!(date.len(), 8);
        assert!(date.chars().all(|c| c.is_ascii_digit()));

        let map = bag(json!({ "date": "20250101" }));
        assert_eq!(ToolArgs::new(&map).date_or_today("date"), "20250101");
    }

    #[test]
    fn flags_accept_bool_and_text() {
        let map = bag(json!({ "a": true, "b": "false", "c": "maybe" }));
        let args = ToolArgs::new(&map);
        assert_eq!(args.optional_flag("a"), Some(true));
        assert_eq!(args.optional_flag("b"), Some(false));
        assert_eq!(args.optional_flag("c"), None);
        assert_eq!(args.optional_flag("d"), None);
    }

    #[test]
    fn string_list_accepts_array_or_csv() {
        let map = bag(json!({ "a": ["x", " y "], "b": "x, y,", "c": [] }));
        let args = ToolArgs::new(&map);
        assert_eq!(args.string_list("a"), Some(vec!["x".to_string(), "y".to_string()]));
        assert_eq!(args.string_list("b"), Some(vec!["x".to_string(), "y".to_string()]));
        assert_eq!(args.string_list("c"), None);
    }

    #[test]
    fn pixels_validate_every_element() {
        let map = bag(json!({
            "pixels": [
                { "date": "20250101", "quantity": "1" },
                { "date": "20250102" }
            ]
        }));
        let err = ToolArgs::new(&map).pixels("pixels").unwrap_err();
        assert_eq!(
            err.to_string(),
            "invalid parameter 'pixels[1].quantity': is required and must be a non-empty string"
        );

        let map = bag(json!({ "pixels": [] }));
        assert!(matches!(
            ToolArgs::new(&map).pixels("pixels"),
            Err(ToolError::InvalidParameter { .. })
        ));

        let map = bag(json!({ "pixels": ["20250101"] }));
        let err = ToolArgs::new(&map).pixels("pixels").unwrap_err();
        assert!(err.to_string().contains("pixels[0]"));
    }

    #[test]
    fn pixels_keep_optional_data() {
        let map = bag(json!({
            "pixels": [{ "date": "20250101", "quantity": "2", "optionalData": "{\"k\":1}" }]
        }));
        let pixels = ToolArgs::new(&map).pixels("pixels").unwrap();
        assert_eq!(pixels[0].optional_data.as_deref(), Some("{\"k\":1}"));
    }
}
