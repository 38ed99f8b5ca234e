use serde::{Deserialize, Serialize};

/// Vehicle license-plate string, the primary lookup key for all parking
/// queries. No normalization is applied; upstream systems expect plates
/// exactly as registered.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Plate(pub String);

impl Plate {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Plate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for Plate {
    fn from(value: &str) -> Self {
        Self(value.to_owned())
    }
}
