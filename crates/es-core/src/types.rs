//! Core types
//!
//! Defines:
//! - Ledger identifiers (collection, item, run)
//! - Resolution requests and the lookup variant they use
//! - Visual states

use crate::ledger::Connection;
use es_media::ImageNode;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Collection identifier on the ledger
///
/// Zero is not addressable: it is indistinguishable from an unset attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct CollectionId(u32);

impl CollectionId {
    /// Create identifier, rejecting zero
    #[inline]
    #[must_use]
    pub fn new(id: u32) -> Option<Self> {
        (id > 0).then_some(Self(id))
    }

    /// Raw value
    #[inline]
    #[must_use]
    pub fn get(self) -> u32 {
        self.0
    }
}

impl fmt::Display for CollectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Item identifier within a collection
///
/// Zero is not addressable, as for [`CollectionId`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ItemId(u32);

impl ItemId {
    /// Create identifier, rejecting zero
    #[inline]
    #[must_use]
    pub fn new(id: u32) -> Option<Self> {
        (id > 0).then_some(Self(id))
    }

    /// Raw value
    #[inline]
    #[must_use]
    pub fn get(self) -> u32 {
        self.0
    }
}

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identity of a resolution run, increasing per state machine
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct RunId(pub u64);

impl RunId {
    /// Next identifier
    #[inline]
    #[must_use]
    pub fn next(self) -> Self {
        Self(self.0 + 1)
    }
}

impl fmt::Display for RunId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Which metadata lookup a state machine performs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Lookup {
    /// Collection-level metadata; needs a collection id
    Collection,
    /// Item-level metadata; needs collection and item ids
    Item,
}

impl Lookup {
    /// Build a request if every id this lookup needs is present
    #[must_use]
    pub fn request(
        self,
        connection: Option<Connection>,
        collection: Option<CollectionId>,
        item: Option<ItemId>,
    ) -> Option<ResolutionRequest> {
        let connection = connection?;
        let collection = collection?;
        match self {
            Self::Collection => Some(ResolutionRequest::collection(connection, collection)),
            Self::Item => Some(ResolutionRequest::item(connection, collection, item?)),
        }
    }
}

/// Immutable input of one resolution run
#[derive(Debug, Clone)]
pub struct ResolutionRequest {
    connection: Connection,
    collection: CollectionId,
    item: Option<ItemId>,
}

impl ResolutionRequest {
    /// Request collection-level metadata
    #[inline]
    #[must_use]
    pub fn collection(connection: Connection, collection: CollectionId) -> Self {
        Self {
            connection,
            collection,
            item: None,
        }
    }

    /// Request item-level metadata
    #[inline]
    #[must_use]
    pub fn item(connection: Connection, collection: CollectionId, item: ItemId) -> Self {
        Self {
            connection,
            collection,
            item: Some(item),
        }
    }

    /// Ledger connection to query
    #[inline]
    #[must_use]
    pub fn connection(&self) -> &Connection {
        &self.connection
    }

    /// Collection id
    #[inline]
    #[must_use]
    pub fn collection_id(&self) -> CollectionId {
        self.collection
    }

    /// Item id, for item-level requests
    #[inline]
    #[must_use]
    pub fn item_id(&self) -> Option<ItemId> {
        self.item
    }

    /// Lookup this request performs
    #[inline]
    #[must_use]
    pub fn lookup(&self) -> Lookup {
        if self.item.is_some() {
            Lookup::Item
        } else {
            Lookup::Collection
        }
    }
}

/// What the widget currently displays
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum VisualState {
    /// Nothing has been configured yet
    #[default]
    Idle,
    /// A run is in flight
    Loading,
    /// Media on display
    Rendered(ImageNode),
    /// Required ids or connection missing
    EmptyConfiguration,
    /// Ledger holds no metadata, or the query failed
    NoMetadata,
    /// No storage backend produced content
    NoContent,
    /// Content describes media that cannot be displayed
    UnsupportedMedia,
}

impl VisualState {
    /// Discriminant without payload
    #[must_use]
    pub fn kind(&self) -> VisualStateKind {
        match self {
            Self::Idle => VisualStateKind::Idle,
            Self::Loading => VisualStateKind::Loading,
            Self::Rendered(_) => VisualStateKind::Rendered,
            Self::EmptyConfiguration => VisualStateKind::EmptyConfiguration,
            Self::NoMetadata => VisualStateKind::NoMetadata,
            Self::NoContent => VisualStateKind::NoContent,
            Self::UnsupportedMedia => VisualStateKind::UnsupportedMedia,
        }
    }

    /// Check whether a run ended here
    #[inline]
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Idle | Self::Loading)
    }

    /// Image on display, if any
    #[inline]
    #[must_use]
    pub fn image(&self) -> Option<&ImageNode> {
        match self {
            Self::Rendered(image) => Some(image),
            _ => None,
        }
    }
}

/// Payload-free [`VisualState`], cheap to broadcast
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum VisualStateKind {
    /// See [`VisualState::Idle`]
    Idle,
    /// See [`VisualState::Loading`]
    Loading,
    /// See [`VisualState::Rendered`]
    Rendered,
    /// See [`VisualState::EmptyConfiguration`]
    EmptyConfiguration,
    /// See [`VisualState::NoMetadata`]
    NoMetadata,
    /// See [`VisualState::NoContent`]
    NoContent,
    /// See [`VisualState::UnsupportedMedia`]
    UnsupportedMedia,
}
