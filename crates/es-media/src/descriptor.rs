//! Media descriptors and the metadata normalizer
//!
//! Upstream content is uncontrolled JSON. [`normalize`] is total: anything
//! missing or mistyped becomes absent, never an error.

use es_storage::RawContent;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Typed display descriptor
///
/// `uri` is always present, possibly empty when the content named no media.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MediaDescriptor {
    /// Media URI, from `media.uri` or the legacy `image` field
    pub uri: String,
    /// Declared mime type
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mime_type: Option<String>,
    /// Intrinsic width in pixels
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<u32>,
    /// Intrinsic height in pixels
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<u32>,
    /// Alternative text
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alt_text: Option<String>,
}

impl MediaDescriptor {
    /// Create descriptor for `uri` with every optional field absent
    #[inline]
    #[must_use]
    pub fn new(uri: impl Into<String>) -> Self {
        Self {
            uri: uri.into(),
            ..Self::default()
        }
    }

    /// With mime type
    #[inline]
    #[must_use]
    pub fn with_mime_type(mut self, mime_type: impl Into<String>) -> Self {
        self.mime_type = Some(mime_type.into());
        self
    }

    /// With alt text
    #[inline]
    #[must_use]
    pub fn with_alt_text(mut self, alt_text: impl Into<String>) -> Self {
        self.alt_text = Some(alt_text.into());
        self
    }

    /// Check whether the content named any media at all
    #[inline]
    #[must_use]
    pub fn has_uri(&self) -> bool {
        !self.uri.is_empty()
    }

    /// Media kind, if supported
    #[inline]
    #[must_use]
    pub fn kind(&self) -> Option<MediaKind> {
        MediaKind::from_mime(self.mime_type.as_deref())
    }
}

/// Supported media kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MediaKind {
    /// Still image, rendered as an image element
    Image,
}

impl MediaKind {
    /// Classify a declared mime type
    ///
    /// An undeclared type is assumed to be an image; of the declared ones only
    /// `image/png` is supported.
    #[must_use]
    pub fn from_mime(mime: Option<&str>) -> Option<Self> {
        match mime.map(str::trim) {
            None => Some(Self::Image),
            Some(m) if m.eq_ignore_ascii_case("image/png") => Some(Self::Image),
            Some(_) => None,
        }
    }
}

/// Normalize fetched content into a [`MediaDescriptor`]
///
/// Field precedence: `media.uri`, then top-level `image`. Dimensions prefer
/// `media.width`/`media.height` over the top-level fields. Alt text is `name`,
/// else `description`.
#[must_use]
pub fn normalize(raw: &RawContent) -> MediaDescriptor {
    let media = raw.get("media");

    let uri = media
        .and_then(|m| text(m.get("uri")))
        .or_else(|| text(raw.get("image")))
        .unwrap_or_default()
        .to_string();

    MediaDescriptor {
        uri,
        mime_type: media.and_then(|m| text(m.get("mimeType"))).map(str::to_string),
        width: dimension(media, raw, "width"),
        height: dimension(media, raw, "height"),
        alt_text: text(raw.get("name"))
            .or_else(|| text(raw.get("description")))
            .map(str::to_string),
    }
}

fn text(value: Option<&Value>) -> Option<&str> {
    value.and_then(Value::as_str).filter(|s| !s.is_empty())
}

fn dimension(media: Option<&Value>, raw: &Value, field: &str) -> Option<u32> {
    let pixels = |v: &Value| {
        v.as_u64()
            .and_then(|n| u32::try_from(n).ok())
            .filter(|n| *n > 0)
    };
    media
        .and_then(|m| m.get(field))
        .and_then(pixels)
        .or_else(|| raw.get(field).and_then(pixels))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;
    use serde_json::json;

    #[test]
    fn normalize_legacy_image() {
        let descriptor = normalize(&json!({"image": "ipfs://X"}));
        assert_eq!(descriptor.uri, "ipfs://X");
    }

    #[test]
    fn normalize_media_uri() {
        let descriptor = normalize(&json!({"media": {"uri": "ipfs://X"}}));
        assert_eq!(descriptor.uri, "ipfs://X");
    }

    #[test]
    fn normalize_prefers_media_uri() {
        let descriptor = normalize(&json!({
            "image": "ipfs://legacy",
            "media": {"uri": "ipfs://fresh", "mimeType": "image/png"}
        }));
        assert_eq!(descriptor.uri, "ipfs://fresh");
        assert_eq!(descriptor.mime_type.as_deref(), Some("image/png"));
    }

    #[test]
    fn normalize_empty_media_uri_falls_back() {
        let descriptor = normalize(&json!({"image": "ipfs://legacy", "media": {"uri": ""}}));
        assert_eq!(descriptor.uri, "ipfs://legacy");
    }

    #[test]
    fn normalize_full_document() {
        let descriptor = normalize(&json!({
            "name": "Tabby",
            "description": "cat",
            "media": {"uri": "ipfs://Qm1", "mimeType": "image/png", "width": 640},
            "height": 480
        }));

        assert_eq!(
            descriptor,
            MediaDescriptor {
                uri: "ipfs://Qm1".to_string(),
                mime_type: Some("image/png".to_string()),
                width: Some(640),
                height: Some(480),
                alt_text: Some("Tabby".to_string()),
            }
        );
    }

    #[test]
    fn normalize_alt_from_description() {
        let descriptor = normalize(&json!({"image": "ipfs://Qm456", "description": "cat"}));
        assert_eq!(descriptor.alt_text.as_deref(), Some("cat"));
    }

    #[test]
    fn normalize_missing_everything() {
        let descriptor = normalize(&json!({"unrelated": true}));
        assert_eq!(descriptor, MediaDescriptor::default());
        assert!(!descriptor.has_uri());
    }

    #[test]
    fn normalize_ignores_mistyped_fields() {
        let descriptor = normalize(&json!({
            "image": 42,
            "media": "not an object",
            "width": "wide",
            "height": -3
        }));
        assert_eq!(descriptor, MediaDescriptor::default());
    }

    #[test]
    fn normalize_non_object() {
        assert_eq!(normalize(&json!([1, 2, 3])), MediaDescriptor::default());
        assert_eq!(normalize(&json!("ipfs://X")), MediaDescriptor::default());
    }

    #[test]
    fn media_kind_from_mime() {
        assert_eq!(MediaKind::from_mime(None), Some(MediaKind::Image));
        assert_eq!(MediaKind::from_mime(Some("image/png")), Some(MediaKind::Image));
        assert_eq!(MediaKind::from_mime(Some("IMAGE/PNG")), Some(MediaKind::Image));
        assert_eq!(MediaKind::from_mime(Some("video/mp4")), None);
    }

    #[test]
    fn descriptor_serde_camel_case() {
        let descriptor = MediaDescriptor::new("ipfs://Qm").with_mime_type("image/png");
        let value = serde_json::to_value(&descriptor).unwrap();
        assert_eq!(value, json!({"uri": "ipfs://Qm", "mimeType": "image/png"}));
    }

    fn arb_json() -> impl Strategy<Value = Value> {
        let leaf = prop_oneof![
            Just(Value::Null),
            any::<bool>().prop_map(Value::from),
            any::<i64>().prop_map(Value::from),
            "[a-z:/0-9]{0,12}".prop_map(Value::from),
        ];
        leaf.prop_recursive(3, 32, 6, |inner| {
            prop_oneof![
                prop::collection::vec(inner.clone(), 0..4).prop_map(Value::from),
                prop::collection::hash_map(
                    prop_oneof![
                        Just("media".to_string()),
                        Just("uri".to_string()),
                        Just("image".to_string()),
                        Just("width".to_string()),
                        Just("name".to_string()),
                        "[a-z]{1,6}",
                    ],
                    inner,
                    0..5
                )
                .prop_map(|m| Value::Object(m.into_iter().collect())),
            ]
        })
    }

    proptest! {
        #[test]
        fn prop_normalize_is_total(raw in arb_json()) {
            let descriptor = normalize(&raw);
            prop_assert!(descriptor.width.map_or(true, |w| w > 0));
            prop_assert!(descriptor.height.map_or(true, |h| h > 0));
            prop_assert!(descriptor.alt_text.as_deref().map_or(true, |a| !a.is_empty()));
        }

        #[test]
        fn prop_legacy_and_media_forms_agree(uri in "ipfs://[A-Za-z0-9]{1,46}") {
            let legacy = normalize(&json!({"image": uri.clone()}));
            let modern = normalize(&json!({"media": {"uri": uri.clone()}}));
            prop_assert_eq!(&legacy.uri, &uri);
            prop_assert_eq!(legacy, modern);
        }
    }
}
