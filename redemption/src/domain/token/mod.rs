mod model;
mod repository;

pub use model::{Pairing, PairingToken, TokenStatus, VersionedToken};
pub use repository::{ObjectTokenRepository, SaveOutcome, TokenRepository};
