use serde::{Deserialize, Serialize};

/// Byte encoding shared by every cache backend
pub trait CacheValue: Sized + Send + Sync {
    fn to_bytes(&self) -> Result<Vec<u8>, ValueError>;

    fn from_bytes(bytes: &[u8]) -> Result<Self, ValueError>;
}

#[derive(Debug, thiserror::Error)]
pub enum ValueError {
    #[error("Serialization failed: {0}")]
    Serialization(String),
    #[error("Deserialization failed: {0}")]
    Deserialization(String),
}

/// JSON wrapper used for every cached read view
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Json<T>(pub T);

impl<T> From<T> for Json<T> {
    fn from(value: T) -> Self { Json(value) }
}

impl<T> CacheValue for Json<T>
where
    T: Serialize + for<'de> Deserialize<'de> + Send + Sync,
{
    fn to_bytes(&self) -> Result<Vec<u8>, ValueError> {
        serde_json::to_vec(&self.0)
            .map_err(|e| ValueError::Serialization(e.to_string()))
    }

    fn from_bytes(bytes: &[u8]) -> Result<Self, ValueError> {
        serde_json::from_slice(bytes)
            .map(Json)
            .map_err(|e| ValueError::Deserialization(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Serialize, Deserialize, PartialEq, Debug, Clone)]
    struct Post {
        id: u64,
        title: String,
    }

    #[test]
    fn test_json_roundtrip() {
        let post = Post {
            id: 1,
            title: "Hello".into(),
        };
        let json = Json(post.clone());

        let bytes = json.to_bytes().unwrap();
        let recovered = Json::<Post>::from_bytes(&bytes).unwrap();

        assert_eq!(recovered.0, post);
    }

    #[test]
    fn test_json_rejects_foreign_payload() {
        let result = Json::<Post>::from_bytes(b"not json at all");

        assert!(matches!(result, Err(ValueError::Deserialization(_))));
    }
}
