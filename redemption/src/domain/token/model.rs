use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Only `used` blocks a redemption. Any other value the provisioning side
/// wrote is kept as-is and treated like `issued`.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "Option<String>", into = "String")]
pub enum TokenStatus {
    #[default]
    Issued,
    Used,
    Other(String),
}

impl From<Option<String>> for TokenStatus {
    fn from(value: Option<String>) -> Self {
        match value {
            None => TokenStatus::Issued,
            Some(v) if v == "issued" => TokenStatus::Issued,
            Some(v) if v == "used" => TokenStatus::Used,
            Some(v) => TokenStatus::Other(v),
        }
    }
}

impl From<TokenStatus> for String {
    fn from(status: TokenStatus) -> Self {
        match status {
            TokenStatus::Issued => "issued".to_string(),
            TokenStatus::Used => "used".to_string(),
            TokenStatus::Other(value) => value,
        }
    }
}

/// A token record as stored under `<token>.json`.
///
/// Fields the provisioning side attaches beyond the four below are kept in
/// `extra` and written back untouched. Missing names read as empty strings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PairingToken {
    #[serde(default)]
    pub token: String,
    #[serde(default)]
    pub gifter: String,
    #[serde(default)]
    pub giftee: String,
    #[serde(default)]
    pub status: TokenStatus,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl PairingToken {
    pub fn new(
        token: impl Into<String>,
        gifter: impl Into<String>,
        giftee: impl Into<String>,
    ) -> Self {
        PairingToken {
            token: token.into(),
            gifter: gifter.into(),
            giftee: giftee.into(),
            status: TokenStatus::Issued,
            extra: Map::new(),
        }
    }

    pub fn is_used(&self) -> bool {
        self.status == TokenStatus::Used
    }

    /// Moves the record to `used` and hands out its pairing. Returns `None`
    /// if the record was already used; `used` is terminal.
    pub fn consume(&mut self) -> Option<Pairing> {
        if self.is_used() {
            return None;
        }
        self.status = TokenStatus::Used;
        Some(Pairing {
            gifter: self.gifter.clone(),
            giftee: self.giftee.clone(),
        })
    }
}

/// The body returned to the caller on a successful redemption.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pairing {
    pub gifter: String,
    pub giftee: String,
}

/// A record together with the store version it was read at.
#[derive(Debug, Clone)]
pub struct VersionedToken {
    pub record: PairingToken,
    pub version: Option<String>,
}
