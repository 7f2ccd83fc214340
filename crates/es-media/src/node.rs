//! Renderable nodes
//!
//! A render sink holds a single slot; every [`RenderNode`] fully replaces the
//! previous one.

use crate::descriptor::{MediaDescriptor, MediaKind};
use es_storage::SourceResolver;
use std::fmt;

/// Image element ready to display
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageNode {
    /// Resolved display URL
    pub src: String,
    /// Alternative text
    pub alt: Option<String>,
    /// Width attribute
    pub width: Option<u32>,
    /// Height attribute
    pub height: Option<u32>,
}

impl fmt::Display for ImageNode {
    /// Markup for the node; the element always fills its container
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<img src=\"{}\"", escape_attribute(&self.src))?;
        if let Some(alt) = &self.alt {
            write!(f, " alt=\"{}\"", escape_attribute(alt))?;
        }
        if let Some(width) = self.width {
            write!(f, " width=\"{width}\"")?;
        }
        if let Some(height) = self.height {
            write!(f, " height=\"{height}\"")?;
        }
        f.write_str(" style=\"width: 100%; height: 100%\">")
    }
}

fn escape_attribute(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '"' => escaped.push_str("&quot;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

/// Placeholder visuals
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Placeholder {
    /// Resolution in progress
    Loading,
    /// Every storage backend came back empty
    NoContent,
    /// Ledger holds no metadata for the ids
    NoMetadata,
}

impl Placeholder {
    /// Stable marker name, usable as a CSS class or asset key
    #[inline]
    #[must_use]
    pub fn marker(self) -> &'static str {
        match self {
            Self::Loading => "loading",
            Self::NoContent => "no-content",
            Self::NoMetadata => "no-metadata",
        }
    }
}

impl fmt::Display for Placeholder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.marker())
    }
}

/// Content of the single render slot
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RenderNode {
    /// Media element
    Image(ImageNode),
    /// Placeholder visual
    Placeholder(Placeholder),
    /// Empty slot
    Cleared,
}

impl RenderNode {
    /// Image node, if this is one
    #[inline]
    #[must_use]
    pub fn as_image(&self) -> Option<&ImageNode> {
        match self {
            Self::Image(image) => Some(image),
            _ => None,
        }
    }
}

/// Why a descriptor could not be turned into a node
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum UnsupportedMedia {
    /// Content named no media
    #[error("content has no media uri")]
    MissingUri,

    /// Mime type outside the supported kinds
    #[error("unsupported mime type '{0}'")]
    MimeType(String),

    /// Source resolver could not produce a display url
    #[error("no display url for '{0}'")]
    Unresolvable(String),
}

/// Build the node displaying `descriptor`
///
/// # Errors
/// - `UnsupportedMedia::MissingUri` when the descriptor's uri is empty
/// - `UnsupportedMedia::MimeType` when the kind is not supported
/// - `UnsupportedMedia::Unresolvable` when `source` yields no url
pub fn create_media_node(
    descriptor: &MediaDescriptor,
    source: &dyn SourceResolver,
) -> Result<ImageNode, UnsupportedMedia> {
    if !descriptor.has_uri() {
        return Err(UnsupportedMedia::MissingUri);
    }

    match descriptor.kind() {
        Some(MediaKind::Image) => {
            let src = source
                .resolve(&descriptor.uri)
                .ok_or_else(|| UnsupportedMedia::Unresolvable(descriptor.uri.clone()))?;
            Ok(ImageNode {
                src,
                alt: descriptor.alt_text.clone(),
                width: descriptor.width,
                height: descriptor.height,
            })
        }
        None => Err(UnsupportedMedia::MimeType(
            descriptor.mime_type.clone().unwrap_or_default(),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use es_storage::IpfsGatewaySourceResolver;

    #[test]
    fn create_image_node() {
        let descriptor = MediaDescriptor::new("ipfs://Qm456").with_alt_text("cat");
        let node = create_media_node(&descriptor, &IpfsGatewaySourceResolver::default()).unwrap();

        assert_eq!(node.src, "https://gateway.pinata.cloud/ipfs/Qm456");
        assert_eq!(node.alt.as_deref(), Some("cat"));
        assert_eq!(node.width, None);
    }

    #[test]
    fn create_rejects_video() {
        let descriptor = MediaDescriptor::new("ipfs://Qm").with_mime_type("video/mp4");
        assert_eq!(
            create_media_node(&descriptor, &IpfsGatewaySourceResolver::default()),
            Err(UnsupportedMedia::MimeType("video/mp4".to_string()))
        );
    }

    #[test]
    fn create_rejects_missing_uri() {
        assert_eq!(
            create_media_node(&MediaDescriptor::default(), &IpfsGatewaySourceResolver::default()),
            Err(UnsupportedMedia::MissingUri)
        );
    }

    #[test]
    fn create_rejects_unresolvable_uri() {
        let descriptor = MediaDescriptor::new("ipfs://Qm/");
        assert!(matches!(
            create_media_node(&descriptor, &IpfsGatewaySourceResolver::default()),
            Err(UnsupportedMedia::Unresolvable(_))
        ));
    }

    #[test]
    fn image_markup() {
        let node = ImageNode {
            src: "https://gw/ipfs/Qm".to_string(),
            alt: Some("\"quoted\" & <tagged>".to_string()),
            width: Some(64),
            height: None,
        };
        assert_eq!(
            node.to_string(),
            "<img src=\"https://gw/ipfs/Qm\" alt=\"&quot;quoted&quot; &amp; &lt;tagged&gt;\" \
             width=\"64\" style=\"width: 100%; height: 100%\">"
        );
    }

    #[test]
    fn placeholder_markers() {
        assert_eq!(Placeholder::Loading.marker(), "loading");
        assert_eq!(Placeholder::NoContent.to_string(), "no-content");
        assert_eq!(Placeholder::NoMetadata.marker(), "no-metadata");
    }

    #[test]
    fn render_node_as_image() {
        assert!(RenderNode::Cleared.as_image().is_none());
        assert!(RenderNode::Placeholder(Placeholder::Loading).as_image().is_none());
    }
}
