use std::str::FromStr;

use serde::Deserialize;

/// Canonical operation name type used throughout the crate.
pub type OpName = String;

/// How a stage treats the entries of its `after = [...]` list.
///
/// - `Strong`: every entry is a mandatory dependency; a failed or skipped
///   dependency skips the stage (default behaviour).
/// - `Weak`: every entry is advisory; the stage waits for it but runs no
///   matter how it ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum DepsMode {
    #[default]
    Strong,
    Weak,
}

/// How the `content` of a `[[stage.<name>.files]]` entry is encoded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
pub enum FileEncoding {
    /// Written as-is.
    #[default]
    #[serde(rename = "plain")]
    Plain,
    #[serde(rename = "base64", alias = "b64")]
    Base64,
    /// Gzip stream, base64-encoded.
    #[serde(rename = "gz+base64", alias = "gzip+base64", alias = "gz+b64")]
    GzipBase64,
}

impl FromStr for DepsMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "strong" => Ok(DepsMode::Strong),
            "weak" => Ok(DepsMode::Weak),
            other => Err(format!(
                "invalid deps_mode: {other} (expected \"strong\" or \"weak\")"
            )),
        }
    }
}
