//! Loader utilities for starting a `Session` from TOML content files.
//!
//! A content directory holds `manifest.toml` (the registered state keys and their
//! starting values) and, optionally, `quests.toml`. Quest definitions are checked
//! against the manifest before anything is built, so a misspelled flag is reported
//! at start-up instead of silently never matching.

pub mod quests;

use std::fs;
use std::path::Path;

use anyhow::{Context, Result, bail};
use log::{info, warn};
use tale_data::{KeyManifest, QuestFile};

use crate::loader::quests::build_quest;
use crate::quest::QuestLog;
use crate::session::Session;
use crate::state::GameState;

pub const MANIFEST_FILE: &str = "manifest.toml";
pub const QUESTS_FILE: &str = "quests.toml";

/// Load a `Session` from the content files in `dir`.
///
/// # Errors
/// Errors bubble up from file IO, TOML parsing, validation, or quest assembly.
pub fn load_session(dir: impl AsRef<Path>) -> Result<Session> {
    let dir = dir.as_ref();
    let manifest = load_manifest(&dir.join(MANIFEST_FILE)).context("while loading key manifest")?;
    info!(
        "manifest registers {} flags, {} counters, {} labels, {} variables",
        manifest.flags.len(),
        manifest.counters.len(),
        manifest.labels.len(),
        manifest.variables.len()
    );

    let quests_path = dir.join(QUESTS_FILE);
    let quest_file = if quests_path.exists() {
        load_quest_file(&quests_path).context("while loading quest definitions")?
    } else {
        warn!("no {QUESTS_FILE} in '{}'; starting without quests", dir.display());
        QuestFile::default()
    };
    validate_quests(&quest_file, &manifest)?;

    let mut log = QuestLog::new();
    for def in &quest_file.quests {
        let quest = build_quest(def).with_context(|| format!("while building quest '{}'", def.id))?;
        log.add(quest)?;
    }
    info!("{} quests added to the quest log", log.len());

    Ok(Session::with_parts(GameState::from_manifest(&manifest), log))
}

/// Read and parse a key manifest.
///
/// # Errors
/// Fails if the file can't be read or isn't a valid manifest.
pub fn load_manifest(path: &Path) -> Result<KeyManifest> {
    let text = fs::read_to_string(path).with_context(|| format!("reading '{}'", path.display()))?;
    let manifest = toml::from_str(&text).with_context(|| format!("parsing '{}'", path.display()))?;
    Ok(manifest)
}

/// Read and parse a quest definition file.
///
/// # Errors
/// Fails if the file can't be read or doesn't parse.
pub fn load_quest_file(path: &Path) -> Result<QuestFile> {
    let text = fs::read_to_string(path).with_context(|| format!("reading '{}'", path.display()))?;
    let file = toml::from_str(&text).with_context(|| format!("parsing '{}'", path.display()))?;
    Ok(file)
}

/// Validate quest definitions and return a single aggregated error.
fn validate_quests(file: &QuestFile, manifest: &KeyManifest) -> Result<()> {
    let errors = tale_data::validate_quests(file, manifest);
    if errors.is_empty() {
        return Ok(());
    }
    let details = errors
        .into_iter()
        .map(|err| format!("- {err}"))
        .collect::<Vec<_>>()
        .join("\n");
    bail!("quest validation failed:\n{details}");
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    const MANIFEST: &str = r#"
variables = ["inventory"]

[flags]
lamp_lit = false

[counters]
coins = 0

[labels]
mood = "calm"
"#;

    const QUESTS: &str = r#"
[[quests]]
id = "light"
name = "Let There Be Light"
description = "Light the lamp."

[[quests.complete_when]]
condition = { pred = { type = "flagSet", flag = "lamp_lit" } }
"#;

    #[test]
    fn loads_manifest_and_quests() -> Result<()> {
        let dir = tempdir()?;
        fs::write(dir.path().join(MANIFEST_FILE), MANIFEST)?;
        fs::write(dir.path().join(QUESTS_FILE), QUESTS)?;

        let session = load_session(dir.path())?;
        assert_eq!(session.state.flags.try_get("lamp_lit"), Some(false));
        assert_eq!(session.state.counters.try_get("coins"), Some(0));
        assert_eq!(session.state.labels.try_get("mood"), Some("calm"));
        assert_eq!(session.quests.len(), 1);
        Ok(())
    }

    #[test]
    fn quests_file_is_optional() -> Result<()> {
        let dir = tempdir()?;
        fs::write(dir.path().join(MANIFEST_FILE), MANIFEST)?;
        let session = load_session(dir.path())?;
        assert!(session.quests.is_empty());
        Ok(())
    }

    #[test]
    fn missing_manifest_is_an_error() -> Result<()> {
        let dir = tempdir()?;
        let err = load_session(dir.path()).unwrap_err();
        assert!(format!("{err:#}").contains("key manifest"));
        Ok(())
    }

    #[test]
    fn unregistered_keys_fail_validation() -> Result<()> {
        let dir = tempdir()?;
        fs::write(dir.path().join(MANIFEST_FILE), MANIFEST)?;
        fs::write(dir.path().join(QUESTS_FILE), QUESTS.replace("lamp_lit", "lamp_lt"))?;
        let err = load_session(dir.path()).unwrap_err();
        let message = format!("{err:#}");
        assert!(message.contains("quest validation failed"), "{message}");
        assert!(message.contains("lamp_lt"), "{message}");
        Ok(())
    }
}
