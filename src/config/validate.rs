// src/config/validate.rs

use crate::config::model::{ConfigFile, RawConfigFile};
use crate::dag::Graph;
use crate::exec::files::decode;
use crate::errors::{Result, StagedagError};

impl TryFrom<RawConfigFile> for ConfigFile {
    type Error = StagedagError;

    fn try_from(raw: RawConfigFile) -> std::result::Result<Self, Self::Error> {
        validate_raw_config(&raw)?;
        Ok(ConfigFile::new_unchecked(raw.config, raw.stage))
    }
}

fn validate_raw_config(cfg: &RawConfigFile) -> Result<()> {
    ensure_has_stages(cfg)?;
    validate_commands(cfg)?;
    validate_files(cfg)?;
    validate_stage_dependencies(cfg)?;
    validate_dag(cfg)?;
    Ok(())
}

fn ensure_has_stages(cfg: &RawConfigFile) -> Result<()> {
    if cfg.stage.is_empty() {
        return Err(StagedagError::ConfigError(
            "config must contain at least one [stage.<name>] section".to_string(),
        ));
    }
    Ok(())
}

fn validate_commands(cfg: &RawConfigFile) -> Result<()> {
    for (name, stage) in cfg.stage.iter() {
        if stage.commands.iter().any(|c| c.trim().is_empty()) {
            return Err(StagedagError::ConfigError(format!(
                "stage '{}' has an empty entry in `commands`",
                name
            )));
        }
    }
    Ok(())
}

/// Every file needs a path and a payload that decodes.
fn validate_files(cfg: &RawConfigFile) -> Result<()> {
    for (name, stage) in cfg.stage.iter() {
        for file in stage.files.iter() {
            if file.path.as_os_str().is_empty() {
                return Err(StagedagError::ConfigError(format!(
                    "stage '{}' has a file entry without `path`",
                    name
                )));
            }
            if let Err(e) = decode(&file.content, file.encoding) {
                return Err(StagedagError::ConfigError(format!(
                    "stage '{}' file {}: {:#}",
                    name,
                    file.path.display(),
                    e
                )));
            }
        }
    }
    Ok(())
}

fn validate_stage_dependencies(cfg: &RawConfigFile) -> Result<()> {
    for (name, stage) in cfg.stage.iter() {
        let lists = [("after", &stage.after), ("weak_after", &stage.weak_after)];
        for (field, deps) in lists {
            for dep in deps.iter() {
                if !cfg.stage.contains_key(dep) {
                    return Err(StagedagError::ConfigError(format!(
                        "stage '{}' has unknown dependency '{}' in `{}`",
                        name, dep, field
                    )));
                }
                if dep == name {
                    return Err(StagedagError::ConfigError(format!(
                        "stage '{}' cannot depend on itself in `{}`",
                        name, field
                    )));
                }
            }
        }
    }
    Ok(())
}

/// Reject cycles with the same layering the engine uses at run time.
fn validate_dag(cfg: &RawConfigFile) -> Result<()> {
    let mut graph = Graph::new();
    for (name, stage) in cfg.stage.iter() {
        for dep in stage.after.iter().chain(stage.weak_after.iter()) {
            graph.depend_on(name.as_str(), dep.as_str())?;
        }
    }
    graph.layers().map(|_| ())
}
