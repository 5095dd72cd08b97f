//! Application configuration loading for CLI defaults.

use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};

use crate::cli::MAX_CHUNK_SIZE;

/// File configuration for streamget defaults.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FileConfig {
    /// URL prefix allowed when no `--allow-prefix` is given.
    pub allowed_prefix: Option<String>,
    /// Default whole-download bound in seconds.
    pub timeout_secs: Option<u64>,
    /// Default connect timeout in seconds.
    pub connect_timeout_secs: Option<u64>,
    /// Default copy chunk size in bytes.
    pub chunk_size: Option<u64>,
    /// Default verbosity mode.
    pub verbosity: Option<VerbositySetting>,
}

impl FileConfig {
    /// Validates config values against the same ranges the CLI enforces.
    pub fn validate(&self) -> Result<()> {
        validate_range("timeout_secs", self.timeout_secs, 1, 86_400)?;
        validate_range("connect_timeout_secs", self.connect_timeout_secs, 1, 3600)?;
        validate_range("chunk_size", self.chunk_size, 1, MAX_CHUNK_SIZE)?;

        if let Some(prefix) = &self.allowed_prefix
            && prefix.trim().is_empty()
        {
            bail!("Invalid config value for `allowed_prefix`: must not be empty");
        }
        Ok(())
    }
}

fn validate_range(field: &str, value: Option<u64>, min: u64, max: u64) -> Result<()> {
    let Some(value) = value else {
        return Ok(());
    };
    if !(min..=max).contains(&value) {
        bail!("Invalid config value for `{field}`: {value}. Expected range: {min}..={max}");
    }
    Ok(())
}

/// Supported config verbosity labels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VerbositySetting {
    Default,
    Verbose,
    Quiet,
    Debug,
}

/// Loaded config metadata.
#[derive(Debug, Clone)]
pub struct LoadedConfig {
    /// Resolved config path if a base directory is known.
    pub path: Option<PathBuf>,
    /// Parsed file config when a config file exists and was valid.
    pub config: Option<FileConfig>,
}

/// Resolves default config path.
///
/// Priority:
/// 1. `$XDG_CONFIG_HOME/streamget/config.toml`
/// 2. `$HOME/.config/streamget/config.toml`
#[must_use]
pub fn resolve_default_config_path() -> Option<PathBuf> {
    if let Some(xdg_config_home) = env_var_non_empty_os("XDG_CONFIG_HOME") {
        return Some(
            PathBuf::from(xdg_config_home)
                .join("streamget")
                .join("config.toml"),
        );
    }

    let home = env_var_non_empty_os("HOME")?;
    Some(
        PathBuf::from(home)
            .join(".config")
            .join("streamget")
            .join("config.toml"),
    )
}

fn env_var_non_empty_os(name: &str) -> Option<std::ffi::OsString> {
    let value = env::var_os(name)?;
    if value.is_empty() { None } else { Some(value) }
}

/// Loads config from the default path if present.
pub fn load_default_file_config() -> Result<LoadedConfig> {
    let path = resolve_default_config_path();
    let config = match path.as_deref() {
        Some(path_ref) if path_ref.exists() => Some(load_file_config(path_ref)?),
        _ => None,
    };
    Ok(LoadedConfig { path, config })
}

fn load_file_config(path: &Path) -> Result<FileConfig> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file '{}'", path.display()))?;
    parse_config_str(&raw)
        .with_context(|| format!("Failed to parse config file '{}'", path.display()))
}

fn parse_config_str(raw: &str) -> Result<FileConfig> {
    let mut cfg = FileConfig::default();
    for (line_index, raw_line) in raw.lines().enumerate() {
        let line_no = line_index + 1;
        let line = strip_inline_comment(raw_line).trim();
        if line.is_empty() {
            continue;
        }

        let Some((raw_key, raw_value)) = line.split_once('=') else {
            bail!("Invalid config syntax on line {line_no}: expected key = value");
        };

        let key = raw_key.trim();
        let value = raw_value.trim();

        match key {
            "allowed_prefix" => {
                let parsed = parse_string_literal(value)
                    .with_context(|| format!("Invalid `allowed_prefix` value on line {line_no}"))?;
                cfg.allowed_prefix = Some(parsed);
            }
            "timeout_secs" => {
                let parsed = parse_integer_u64(value)
                    .with_context(|| format!("Invalid `timeout_secs` value on line {line_no}"))?;
                cfg.timeout_secs = Some(parsed);
            }
            "connect_timeout_secs" => {
                let parsed = parse_integer_u64(value).with_context(|| {
                    format!("Invalid `connect_timeout_secs` value on line {line_no}")
                })?;
                cfg.connect_timeout_secs = Some(parsed);
            }
            "chunk_size" => {
                let parsed = parse_integer_u64(value)
                    .with_context(|| format!("Invalid `chunk_size` value on line {line_no}"))?;
                cfg.chunk_size = Some(parsed);
            }
            "verbosity" => {
                let parsed = parse_string_literal(value)
                    .with_context(|| format!("Invalid `verbosity` value on line {line_no}"))?;
                cfg.verbosity = Some(parse_verbosity(&parsed).with_context(|| {
                    format!("Invalid `verbosity` value '{parsed}' on line {line_no}")
                })?);
            }
            unknown => {
                bail!("Unknown configuration key: '{unknown}' on line {line_no}");
            }
        }
    }
    cfg.validate()?;
    Ok(cfg)
}

fn strip_inline_comment(line: &str) -> &str {
    let mut in_string = false;
    for (index, ch) in line.char_indices() {
        match ch {
            '"' => in_string = !in_string,
            '#' if !in_string => return &line[..index],
            _ => {}
        }
    }
    line
}

fn parse_string_literal(raw_value: &str) -> Result<String> {
    if raw_value.len() < 2 || !raw_value.starts_with('"') || !raw_value.ends_with('"') {
        bail!("Expected double-quoted string");
    }
    Ok(raw_value[1..raw_value.len() - 1].to_string())
}

fn parse_integer_u64(raw_value: &str) -> Result<u64> {
    let token = raw_value.trim().replace('_', "");
    if token.is_empty() {
        bail!("Expected integer value");
    }
    let value = token.parse::<i128>()?;
    if value < 0 {
        bail!("Expected non-negative integer");
    }
    u64::try_from(value).map_err(|_| anyhow::anyhow!("Integer value out of range for u64"))
}

fn parse_verbosity(value: &str) -> Result<VerbositySetting> {
    match value {
        "default" => Ok(VerbositySetting::Default),
        "verbose" => Ok(VerbositySetting::Verbose),
        "quiet" => Ok(VerbositySetting::Quiet),
        "debug" => Ok(VerbositySetting::Debug),
        other => bail!("expected one of default, verbose, quiet, debug; got '{other}'"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_config_all_keys() {
        let raw = r#"
            # streamget defaults
            allowed_prefix = "https://downloads.example.com/#stable/" # trailing comment
            timeout_secs = 1_200
            connect_timeout_secs = 10
            chunk_size = 65536
            verbosity = "quiet"
        "#;

        let cfg = parse_config_str(raw).unwrap();

        assert_eq!(
            cfg.allowed_prefix.as_deref(),
            Some("https://downloads.example.com/#stable/")
        );
        assert_eq!(cfg.timeout_secs, Some(1200));
        assert_eq!(cfg.connect_timeout_secs, Some(10));
        assert_eq!(cfg.chunk_size, Some(65_536));
        assert_eq!(cfg.verbosity, Some(VerbositySetting::Quiet));
    }

    #[test]
    fn test_parse_config_empty_is_default() {
        assert_eq!(parse_config_str("\n# nothing\n").unwrap(), FileConfig::default());
    }

    #[test]
    fn test_parse_config_unknown_key_rejected() {
        let err = parse_config_str("concurrency = 4").unwrap_err();
        assert!(
            err.to_string().contains("Unknown configuration key"),
            "{err:#}"
        );
    }

    #[test]
    fn test_parse_config_missing_equals_rejected() {
        let err = parse_config_str("timeout_secs 5").unwrap_err();
        assert!(err.to_string().contains("line 1"), "{err:#}");
    }

    #[test]
    fn test_parse_config_out_of_range_rejected() {
        let err = parse_config_str("chunk_size = 0").unwrap_err();
        assert!(format!("{err:#}").contains("chunk_size"), "{err:#}");

        let err = parse_config_str("timeout_secs = 100000").unwrap_err();
        assert!(format!("{err:#}").contains("timeout_secs"), "{err:#}");
    }

    #[test]
    fn test_parse_config_unquoted_string_rejected() {
        let err = parse_config_str("allowed_prefix = https://x").unwrap_err();
        assert!(format!("{err:#}").contains("double-quoted"), "{err:#}");
    }

    #[test]
    fn test_parse_config_bad_verbosity_rejected() {
        assert!(parse_config_str(r#"verbosity = "loud""#).is_err());
    }

    #[test]
    fn test_parse_config_negative_integer_rejected() {
        assert!(parse_config_str("connect_timeout_secs = -1").is_err());
    }

    #[test]
    fn test_load_file_config_reads_from_disk() {
        let temp_dir = tempfile::TempDir::new().unwrap();
        let path = temp_dir.path().join("config.toml");
        fs::write(&path, "timeout_secs = 42\n").unwrap();

        let cfg = load_file_config(&path).unwrap();
        assert_eq!(cfg.timeout_secs, Some(42));
    }
}
