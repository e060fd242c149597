use bytes::Bytes;
use serde::{Deserialize, Serialize};

/// Action carried by an invalidation message. Anything the consumer does not
/// recognise deserializes to [`Action::Unknown`] and is discarded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Action {
    InvalidateCache,
    #[serde(other)]
    Unknown,
}

/// Wire message: `{"action":"invalidateCache","keys":["blogs:*"]}`.
/// `keys` are Redis glob patterns.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvalidationEvent {
    pub action: Action,
    #[serde(default)]
    pub keys: Vec<String>,
}

impl InvalidationEvent {
    pub fn invalidate<I, S>(keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            action: Action::InvalidateCache,
            keys: keys.into_iter().map(Into::into).collect(),
        }
    }

    pub fn to_bytes(&self) -> Result<Bytes, serde_json::Error> {
        serde_json::to_vec(self).map(Bytes::from)
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, serde_json::Error> {
        serde_json::from_slice(bytes)
    }
}
