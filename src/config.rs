//! Persistent CLI defaults.
//!
//! A config file is a list of flag tokens, one or more per line, exactly as
//! they would appear on the command line. A global file provides machine
//! defaults and a `.stencilrc` in the working directory overrides it;
//! flags given on the command line win over both.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

/// Flags that can be persisted to a config file.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ConfigFlags {
    pub json: bool,
    pub pretty: bool,
    pub entries: Option<String>,
}

impl ConfigFlags {
    /// Merge two flag sets; `other` wins for valued options.
    #[must_use]
    pub fn union(&self, other: &Self) -> Self {
        Self {
            json: self.json || other.json,
            pretty: self.pretty || other.pretty,
            entries: other.entries.clone().or_else(|| self.entries.clone()),
        }
    }
}

pub fn global_config_path() -> PathBuf {
    #[cfg(target_os = "windows")]
    {
        if let Some(appdata) = std::env::var_os("APPDATA") {
            return PathBuf::from(appdata).join("stencil").join("config");
        }
    }

    #[cfg(target_os = "macos")]
    {
        if let Some(home) = std::env::var_os("HOME") {
            return PathBuf::from(home)
                .join("Library")
                .join("Application Support")
                .join("stencil")
                .join("config");
        }
    }

    #[cfg(not(any(target_os = "windows", target_os = "macos")))]
    {
        if let Some(xdg) = std::env::var_os("XDG_CONFIG_HOME") {
            return PathBuf::from(xdg).join("stencil").join("config");
        }
        if let Some(home) = std::env::var_os("HOME") {
            return PathBuf::from(home).join(".config").join("stencil").join("config");
        }
    }

    PathBuf::from(".stencilrc")
}

pub fn local_override_path() -> PathBuf {
    PathBuf::from(".stencilrc")
}

/// Load flags from a config file; a missing file yields defaults.
///
/// # Errors
///
/// Returns an error when the file exists but cannot be read.
pub fn load_config_flags(path: &Path) -> Result<ConfigFlags> {
    if !path.exists() {
        return Ok(ConfigFlags::default());
    }
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config {}", path.display()))?;
    let tokens = content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .flat_map(|line| line.split_whitespace().map(ToOwned::to_owned))
        .collect::<Vec<_>>();
    Ok(parse_flag_tokens(&tokens))
}

/// Write flags to a config file, creating parent directories as needed.
///
/// # Errors
///
/// Returns an error when the directory or file cannot be written.
pub fn save_config_flags(path: &Path, flags: &ConfigFlags) -> Result<()> {
    let mut lines = Vec::new();
    lines.push("# stencil defaults (saved with --save)".to_string());
    if flags.json {
        lines.push("--json".to_string());
    }
    if flags.pretty {
        lines.push("--pretty".to_string());
    }
    if let Some(entries) = &flags.entries {
        lines.push(format!("--entries {entries}"));
    }
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create config dir {}", parent.display()))?;
    }
    fs::write(path, format!("{}\n", lines.join("\n")))
        .with_context(|| format!("Failed to write config {}", path.display()))
}

/// Remove a config file if it exists.
///
/// # Errors
///
/// Returns an error when the file exists but cannot be removed.
pub fn clear_config_flags(path: &Path) -> Result<()> {
    if path.exists() {
        fs::remove_file(path).with_context(|| format!("Failed to remove {}", path.display()))?;
    }
    Ok(())
}

/// Pick the known flags out of a token list, ignoring everything else.
#[must_use]
pub fn parse_flag_tokens(tokens: &[String]) -> ConfigFlags {
    let mut flags = ConfigFlags::default();
    let mut i = 0;
    while i < tokens.len() {
        let token = &tokens[i];
        if token == "--json" {
            flags.json = true;
        } else if token == "--pretty" {
            flags.pretty = true;
        } else if token == "--entries" {
            if let Some(next) = tokens.get(i + 1) {
                flags.entries = Some(next.clone());
                i += 1;
            }
        } else if let Some(value) = token.strip_prefix("--entries=") {
            flags.entries = Some(value.to_string());
        }
        i += 1;
    }
    flags
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_parse_flag_tokens_extracts_known_flags() {
        let args = vec![
            "stencil".to_string(),
            "--json".to_string(),
            "--entries=Name,Date".to_string(),
            "letter.txt".to_string(),
        ];
        let flags = parse_flag_tokens(&args);
        assert!(flags.json);
        assert!(!flags.pretty);
        assert_eq!(flags.entries, Some("Name,Date".to_string()));
    }

    #[test]
    fn test_parse_flag_tokens_spaced_value() {
        let args = vec!["--entries".to_string(), "A,B".to_string()];
        let flags = parse_flag_tokens(&args);
        assert_eq!(flags.entries, Some("A,B".to_string()));
    }

    #[test]
    fn test_config_union_merges_cli_over_file_for_options() {
        let file = ConfigFlags {
            json: true,
            entries: Some("A".to_string()),
            ..ConfigFlags::default()
        };
        let cli = ConfigFlags {
            pretty: true,
            entries: Some("B".to_string()),
            ..ConfigFlags::default()
        };
        let merged = file.union(&cli);
        assert!(merged.json);
        assert!(merged.pretty);
        assert_eq!(merged.entries, Some("B".to_string()));
    }

    #[test]
    fn test_load_missing_file_yields_defaults() {
        let dir = tempdir().unwrap();
        let flags = load_config_flags(&dir.path().join("absent")).unwrap();
        assert_eq!(flags, ConfigFlags::default());
    }

    #[test]
    fn test_save_load_and_clear_config() {
        let dir = tempdir().unwrap();
        let path = dir.path().join(".stencilrc");
        let flags = ConfigFlags {
            json: true,
            pretty: true,
            entries: Some("InstructorName,DueDate".to_string()),
        };

        save_config_flags(&path, &flags).unwrap();
        let loaded = load_config_flags(&path).unwrap();
        assert_eq!(loaded, flags);

        clear_config_flags(&path).unwrap();
        assert!(!path.exists());
    }
}
