use serde::{Deserialize, Serialize};

/// Body of `POST /`.
///
/// Both fields are optional at the parsing stage so that a missing field is reported with the
/// same message as an invalid one.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct RelayRequest {
    /// Guild the content belongs to; becomes the storage folder
    #[serde(rename = "guildID")]
    pub guild_id: Option<String>,
    /// Absolute URL of the media to relay
    pub content: Option<String>,
}
