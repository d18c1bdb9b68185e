// src/config/model.rs

use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::Deserialize;

use crate::dag::GraphOptions;
use crate::types::{DepsMode, FileEncoding};

/// Stage file exactly as deserialized from TOML, before validation.
///
/// ```toml
/// [config]
/// enable_init = true
///
/// [stage.mounts]
/// commands = ["mount -a"]
/// fatal = true
///
/// [stage.network]
/// commands = ["ip link set lo up"]
/// after = ["mounts"]
/// ```
#[derive(Debug, Clone, Deserialize)]
pub struct RawConfigFile {
    #[serde(default)]
    pub config: ConfigSection,

    /// All stages from `[stage.<name>]`, keyed by stage name.
    #[serde(default)]
    pub stage: BTreeMap<String, StageConfig>,
}

/// A validated stage file. Obtain one through `ConfigFile::try_from`.
#[derive(Debug, Clone)]
pub struct ConfigFile {
    pub config: ConfigSection,
    pub stage: BTreeMap<String, StageConfig>,
}

impl ConfigFile {
    pub(crate) fn new_unchecked(config: ConfigSection, stage: BTreeMap<String, StageConfig>) -> Self {
        Self { config, stage }
    }
}

/// `[config]` section: graph-wide behaviour.
#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct ConfigSection {
    /// Run stages that have no `after`/`weak_after` edges and that nothing
    /// depends on. Without it such stages are skipped.
    #[serde(default)]
    pub enable_init: bool,

    /// Wait for background stages before finishing, and report their fatal
    /// failures.
    #[serde(default)]
    pub collect_orphans: bool,
}

impl ConfigSection {
    pub fn graph_options(&self) -> GraphOptions {
        GraphOptions {
            enable_init: self.enable_init,
            collect_orphans: self.collect_orphans,
        }
    }
}

/// `[stage.<name>]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct StageConfig {
    /// Shell commands; all of them run concurrently when the stage runs.
    ///
    /// A stage without commands only orders other stages.
    #[serde(default)]
    pub commands: Vec<String>,

    /// Mandatory dependencies.
    #[serde(default)]
    pub after: Vec<String>,

    /// Advisory dependencies: waited for, but their failure does not skip
    /// this stage. Listing a name here downgrades the same name in `after`.
    #[serde(default)]
    pub weak_after: Vec<String>,

    /// `"weak"` turns every `after` entry into an advisory dependency.
    #[serde(default)]
    pub deps_mode: DepsMode,

    /// Fail the whole run if this stage fails.
    #[serde(default)]
    pub fatal: bool,

    /// Do not make dependents (or the end of the run) wait for this stage.
    #[serde(default)]
    pub background: bool,

    /// Files written before the stage's commands start.
    #[serde(default)]
    pub files: Vec<FileConfig>,
}

/// `[[stage.<name>.files]]` entry.
///
/// ```toml
/// [[stage.motd.files]]
/// path = "/etc/motd"
/// content = "SGVsbG8K"
/// encoding = "base64"
/// permissions = 0o644
/// ```
#[derive(Debug, Clone, Deserialize)]
pub struct FileConfig {
    pub path: PathBuf,

    #[serde(default)]
    pub content: String,

    #[serde(default)]
    pub encoding: FileEncoding,

    /// Unix mode bits; left to the umask when unset.
    #[serde(default)]
    pub permissions: Option<u32>,
}
