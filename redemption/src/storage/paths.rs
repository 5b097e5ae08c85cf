// KeyManager maps tokens to object keys.
//
// The key layout in the bucket (or under the filesystem root) is flat:
//
//	<prefix>
//	├── <token>.json
//	├── <token>.json
//	└── ...
//
// The prefix is empty unless configured, which matches the layout the
// provisioning side writes.

#[derive(Clone, Debug, Default)]
pub struct KeyManager {
    prefix: String,
}

impl KeyManager {
    pub fn new(prefix: impl Into<String>) -> Self {
        KeyManager {
            prefix: prefix.into(),
        }
    }

    /// Returns the key of a single token record,
    /// (e.g. `<prefix><token>.json`).
    pub fn token_key(&self, token: &str) -> String {
        format!("{}{}.json", self.prefix, token)
    }
}
