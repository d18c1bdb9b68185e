#![allow(dead_code)]

use std::collections::BTreeMap;

use stagedag::config::{ConfigFile, ConfigSection, FileConfig, RawConfigFile, StageConfig};
use stagedag::types::{DepsMode, FileEncoding};

/// Builder for `ConfigFile` to simplify test setup.
pub struct ConfigFileBuilder {
    config: RawConfigFile,
}

impl ConfigFileBuilder {
    pub fn new() -> Self {
        Self {
            config: RawConfigFile {
                config: ConfigSection::default(),
                stage: BTreeMap::new(),
            },
        }
    }

    pub fn with_stage(mut self, name: &str, stage: StageConfig) -> Self {
        self.config.stage.insert(name.to_string(), stage);
        self
    }

    pub fn enable_init(mut self, val: bool) -> Self {
        self.config.config.enable_init = val;
        self
    }

    pub fn collect_orphans(mut self, val: bool) -> Self {
        self.config.config.collect_orphans = val;
        self
    }

    pub fn build(self) -> ConfigFile {
        ConfigFile::try_from(self.config).expect("Failed to build valid config from builder")
    }
}

impl Default for ConfigFileBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Builder for `StageConfig`.
pub struct StageConfigBuilder {
    stage: StageConfig,
}

impl StageConfigBuilder {
    pub fn new() -> Self {
        Self {
            stage: StageConfig {
                commands: vec![],
                after: vec![],
                weak_after: vec![],
                deps_mode: DepsMode::Strong,
                fatal: false,
                background: false,
                files: vec![],
            },
        }
    }

    pub fn command(mut self, cmd: &str) -> Self {
        self.stage.commands.push(cmd.to_string());
        self
    }

    pub fn after(mut self, dep: &str) -> Self {
        self.stage.after.push(dep.to_string());
        self
    }

    pub fn weak_after(mut self, dep: &str) -> Self {
        self.stage.weak_after.push(dep.to_string());
        self
    }

    pub fn weak_deps(mut self) -> Self {
        self.stage.deps_mode = DepsMode::Weak;
        self
    }

    pub fn fatal(mut self) -> Self {
        self.stage.fatal = true;
        self
    }

    pub fn background(mut self) -> Self {
        self.stage.background = true;
        self
    }

    pub fn file(
        mut self,
        path: impl Into<std::path::PathBuf>,
        content: &str,
        encoding: FileEncoding,
    ) -> Self {
        self.stage.files.push(FileConfig {
            path: path.into(),
            content: content.to_string(),
            encoding,
            permissions: None,
        });
        self
    }

    pub fn build(self) -> StageConfig {
        self.stage
    }
}

impl Default for StageConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}
