use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::error::PixelaError;

// ---------------------------------------------------------------------------
// Request bodies
// ---------------------------------------------------------------------------

/// Body of `POST /v1/users`. The token travels in the body, not a header.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateUserRequest {
    pub token: String,
    pub username: String,
    /// "yes" or "no"
    pub agree_terms_of_service: String,
    /// "yes" or "no"
    pub not_minor: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateUserRequest {
    pub new_token: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thanks_code: Option<String>,
}

/// Body of `PUT /@{username}`. Every field is optional; absent ones keep
/// their current value on the remote side.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateUserProfileRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gravatar_icon_email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub about: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pixela_graph: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timezone: Option<String>,
    #[serde(rename = "contributeURLs", skip_serializing_if = "Option::is_none")]
    pub contribute_urls: Option<Vec<String>>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateGraphRequest {
    pub id: String,
    pub name: String,
    pub unit: String,
    /// "int" or "float"
    #[serde(rename = "type")]
    pub graph_type: String,
    pub color: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timezone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub self_sufficient: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_secret: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub publish_optional_data: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateGraphRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timezone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub self_sufficient: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_secret: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub publish_optional_data: Option<String>,
}

/// One pixel to record. Also the element type of the batch endpoint's array body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PostPixelRequest {
    /// yyyyMMdd
    pub date: String,
    /// Integer or decimal, kept as text so the adapter never needs the graph type.
    pub quantity: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub optional_data: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdatePixelRequest {
    pub quantity: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub optional_data: Option<String>,
}

/// Body of the `add` / `subtract` counter endpoints.
#[derive(Debug, Clone, Serialize)]
pub struct QuantityRequest {
    pub quantity: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WebhookType {
    Increment,
    Decrement,
}

impl WebhookType {
    pub fn as_str(self) -> &'static str {
        match self {
            WebhookType::Increment => "increment",
            WebhookType::Decrement => "decrement",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "increment" => Some(WebhookType::Increment),
            "decrement" => Some(WebhookType::Decrement),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct CreateWebhookRequest {
    #[serde(rename = "graphID")]
    pub graph_id: String,
    #[serde(rename = "type")]
    pub webhook_type: WebhookType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quantity: Option<String>,
}

/// Query of `GET .../pixels`.
#[derive(Debug, Clone, Default)]
pub struct PixelsQuery {
    pub from: Option<String>,
    pub to: Option<String>,
    pub with_body: Option<bool>,
}

impl PixelsQuery {
    pub(crate) fn pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = Vec::new();
        if let Some(from) = &self.from {
            pairs.push(("from", from.clone()));
        }
        if let Some(to) = &self.to {
            pairs.push(("to", to.clone()));
        }
        if let Some(with_body) = self.with_body {
            pairs.push(("withBody", with_body.to_string()));
        }
        pairs
    }
}

/// Query of the public SVG endpoint.
#[derive(Debug, Clone, Default)]
pub struct GraphSvgQuery {
    pub date: Option<String>,
    pub mode: Option<String>,
}

impl GraphSvgQuery {
    pub(crate) fn pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = Vec::new();
        if let Some(date) = &self.date {
            pairs.push(("date", date.clone()));
        }
        if let Some(mode) = &self.mode {
            pairs.push(("mode", mode.clone()));
        }
        pairs
    }
}

// ---------------------------------------------------------------------------
// Response bodies
// ---------------------------------------------------------------------------

/// Body-level result of every write endpoint. Pixela reports success here,
/// not in the status line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PixelaResponse {
    pub message: String,
    pub is_success: bool,
    /// Present only on webhook creation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub webhook_hash: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pixel {
    /// Single-pixel reads omit the date; callers fill it from the request.
    #[serde(default)]
    pub date: String,
    #[serde(default, deserialize_with = "numeric_string")]
    pub quantity: String,
    #[serde(
        default,
        deserialize_with = "non_empty_string",
        skip_serializing_if = "Option::is_none"
    )]
    pub optional_data: Option<String>,
}

/// Graph metadata as served by `graph-def` and the graph list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphDefinition {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub unit: String,
    #[serde(rename = "type", default)]
    pub graph_type: String,
    #[serde(default)]
    pub color: String,
    #[serde(default)]
    pub timezone: String,
    #[serde(default, deserialize_with = "flag")]
    pub self_sufficient: bool,
    #[serde(default, deserialize_with = "flag")]
    pub is_secret: bool,
    #[serde(default, deserialize_with = "flag")]
    pub publish_optional_data: bool,
}

/// Aggregates of one graph. Quantities stay textual so float graphs keep
/// their exact representation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphStats {
    #[serde(default)]
    pub total_pixels_count: i64,
    #[serde(default, deserialize_with = "numeric_string")]
    pub max_quantity: String,
    #[serde(default, deserialize_with = "numeric_string")]
    pub min_quantity: String,
    #[serde(default)]
    pub max_date: String,
    #[serde(default)]
    pub min_date: String,
    #[serde(default, deserialize_with = "numeric_string")]
    pub total_quantity: String,
    #[serde(default, deserialize_with = "numeric_string")]
    pub avg_quantity: String,
    #[serde(default, deserialize_with = "numeric_string")]
    pub todays_quantity: String,
    #[serde(default, deserialize_with = "numeric_string")]
    pub yesterday_quantity: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Webhook {
    #[serde(rename = "webhookHash")]
    pub webhook_hash: String,
    #[serde(rename = "graphID")]
    pub graph_id: String,
    /// Kept as text: Pixela has more webhook kinds than this adapter creates.
    #[serde(rename = "type")]
    pub webhook_type: String,
    #[serde(
        default,
        deserialize_with = "optional_numeric_string",
        skip_serializing_if = "Option::is_none"
    )]
    pub quantity: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct WebhookList {
    #[serde(default)]
    pub webhooks: Vec<Webhook>,
}

/// A list field Pixela serves either as bare strings (dates, ids) or as
/// detail objects, depending on query flags and API version.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Listing<T> {
    Names(Vec<String>),
    Details(Vec<T>),
}

/// Detail entries must carry their key; an entry without one is a shape error.
pub trait ListEntry {
    fn has_key(&self) -> bool;
}

impl ListEntry for Pixel {
    fn has_key(&self) -> bool {
        !self.date.is_empty()
    }
}

impl ListEntry for GraphDefinition {
    fn has_key(&self) -> bool {
        !self.id.is_empty()
    }
}

impl<T: DeserializeOwned + ListEntry> Listing<T> {
    /// Tries the string-array shape first, then the detail-object shape.
    /// A missing or null field is an empty list.
    pub fn decode(field: &'static str, raw: Option<&Value>) -> Result<Self, PixelaError> {
        let raw = match raw {
            None | Some(Value::Null) => return Ok(Listing::Names(Vec::new())),
            Some(value) => value,
        };
        if let Ok(names) = Vec::<String>::deserialize(raw) {
            return Ok(Listing::Names(names));
        }
        if let Ok(details) = Vec::<T>::deserialize(raw) {
            if details.iter().all(ListEntry::has_key) {
                return Ok(Listing::Details(details));
            }
        }
        Err(PixelaError::SchemaMismatch {
            field,
            raw: raw.to_string(),
        })
    }
}

impl<T> Listing<T> {
    pub fn len(&self) -> usize {
        match self {
            Listing::Names(names) => names.len(),
            Listing::Details(details) => details.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

pub type PixelList = Listing<Pixel>;
pub type GraphList = Listing<GraphDefinition>;

// ---------------------------------------------------------------------------
// Tolerant field decoders
// ---------------------------------------------------------------------------

#[derive(Deserialize)]
#[serde(untagged)]
enum FlagRepr {
    Bool(bool),
    Text(String),
}

/// `true`/`false` literals pass through; of the strings only `"true"` is true.
pub(crate) fn flag<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<FlagRepr>::deserialize(deserializer)? {
        Some(FlagRepr::Bool(value)) => value,
        Some(FlagRepr::Text(text)) => text == "true",
        None => false,
    })
}

#[derive(Deserialize)]
#[serde(untagged)]
enum NumericRepr {
    Number(serde_json::Number),
    Text(String),
}

pub(crate) fn numeric_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(optional_numeric_string(deserializer)?.unwrap_or_default())
}

pub(crate) fn optional_numeric_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<NumericRepr>::deserialize(deserializer)? {
        Some(NumericRepr::Number(number)) => Some(number.to_string()),
        Some(NumericRepr::Text(text)) => Some(text),
        None => None,
    })
}

pub(crate) fn non_empty_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.filter(|text| !text.is_empty()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn graph_with_flags(flags: Value) -> GraphDefinition {
        let mut raw = json!({
            "id": "test-graph",
            "name": "Test",
            "unit": "commit",
            "type": "int",
            "color": "shibafu",
            "timezone": "Asia/Tokyo"
        });
        for (key, value) in flags.as_object().expect("flags must be an object") {
            raw[key] = value.clone();
        }
        serde_json::from_value(raw).expect("graph definition should decode")
    }

    #[test]
    fn graph_flags_accept_booleans_and_strings_alike() {
        let native = graph_with_flags(json!({
            "selfSufficient": true,
            "isSecret": false,
            "publishOptionalData": true
        }));
        let textual = graph_with_flags(json!({
            "selfSufficient": "true",
            "isSecret": "false",
            "publishOptionalData": "true"
        }));
        assert_eq!(native, textual);
        assert!(textual.self_sufficient);
        assert!(!textual.is_secret);
        assert!(textual.publish_optional_data);
    }

    #[test]
    fn graph_flags_treat_unknown_strings_and_missing_as_false() {
        let graph = graph_with_flags(json!({
            "selfSufficient": "yes",
            "isSecret": "TRUE"
        }));
        assert!(!graph.self_sufficient);
        assert!(!graph.is_secret);
        assert!(!graph.publish_optional_data);
    }

    #[test]
    fn normalized_graph_serializes_flags_as_booleans() {
        let graph = graph_with_flags(json!({ "isSecret": "true" }));
        let value = serde_json::to_value(&graph).unwrap();
        assert_eq!(value["isSecret"], json!(true));
        assert_eq!(value["selfSufficient"], json!(false));
        assert_eq!(value["type"], json!("int"));
    }

    #[test]
    fn listing_prefers_string_array_shape() {
        let raw = json!(["20250101", "20250102"]);
        let listing = PixelList::decode("pixels", Some(&raw)).unwrap();
        assert_eq!(
            listing,
            Listing::Names(vec!["20250101".to_string(), "20250102".to_string()])
        );
    }

    #[test]
    fn listing_falls_back_to_detail_objects() {
        let raw = json!([{ "date": "20250101", "quantity": "3" }]);
        let listing = PixelList::decode("pixels", Some(&raw)).unwrap();
        assert_eq!(
            listing,
            Listing::Details(vec![Pixel {
                date: "20250101".to_string(),
                quantity: "3".to_string(),
                optional_data: None,
            }])
        );
    }

    #[test]
    fn listing_treats_missing_and_empty_as_empty() {
        assert!(PixelList::decode("pixels", None).unwrap().is_empty());
        assert!(PixelList::decode("pixels", Some(&json!(null))).unwrap().is_empty());
        assert!(PixelList::decode("pixels", Some(&json!([]))).unwrap().is_empty());
    }

    #[test]
    fn listing_reports_schema_mismatch_with_raw_payload() {
        let raw = json!({ "unexpected": 1 });
        let err = PixelList::decode("pixels", Some(&raw)).unwrap_err();
        match err {
            PixelaError::SchemaMismatch { field, raw } => {
                assert_eq!(field, "pixels");
                assert!(raw.contains("unexpected"));
            }
            other => panic!("expected schema mismatch, got {other:?}"),
        }
    }

    #[test]
    fn listing_rejects_entries_without_a_key() {
        let raw = json!([{ "date": "20250101", "quantity": "1" }, { "unexpected": 1 }]);
        let err = PixelList::decode("pixels", Some(&raw)).unwrap_err();
        assert!(matches!(err, PixelaError::SchemaMismatch { field: "pixels", .. }));
    }

    #[test]
    fn stats_keep_quantities_as_text() {
        let stats: GraphStats = serde_json::from_value(json!({
            "totalPixelsCount": 4,
            "maxQuantity": 12,
            "minQuantity": 0,
            "maxDate": "20250102",
            "minDate": "20250103",
            "totalQuantity": "25",
            "avgQuantity": 6.25,
            "todaysQuantity": 3,
            "yesterdayQuantity": 10
        }))
        .unwrap();
        assert_eq!(stats.total_pixels_count, 4);
        assert_eq!(stats.max_quantity, "12");
        assert_eq!(stats.total_quantity, "25");
        assert_eq!(stats.avg_quantity, "6.25");
        assert_eq!(stats.max_date, "20250102");
    }

    #[test]
    fn optional_request_fields_are_omitted_not_null() {
        let body = serde_json::to_value(PostPixelRequest {
            date: "20250101".to_string(),
            quantity: "5".to_string(),
            optional_data: None,
        })
        .unwrap();
        assert_eq!(body, json!({ "date": "20250101", "quantity": "5" }));

        let body = serde_json::to_value(UpdateGraphRequest {
            color: Some("sora".to_string()),
            ..Default::default()
        })
        .unwrap();
        assert_eq!(body, json!({ "color": "sora" }));
    }

    #[test]
    fn pixel_drops_empty_optional_data() {
        let pixel: Pixel = serde_json::from_value(json!({
            "quantity": "7",
            "optionalData": ""
        }))
        .unwrap();
        assert_eq!(pixel.date, "");
        assert_eq!(pixel.optional_data, None);
    }

    #[test]
    fn webhook_request_uses_remote_field_names() {
        let body = serde_json::to_value(CreateWebhookRequest {
            graph_id: "g1".to_string(),
            webhook_type: WebhookType::Decrement,
            quantity: None,
        })
        .unwrap();
        assert_eq!(body, json!({ "graphID": "g1", "type": "decrement" }));
    }
}
