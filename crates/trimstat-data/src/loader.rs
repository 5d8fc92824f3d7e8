//! Loading pipeline: reads config and attempt-log files and validates them
//! into engine types.
//!
//! A log directory holds `attempts.{ron,toml,json}` and optionally
//! `config.{ron,toml,json}`; the encoding follows the extension.

use serde::de::DeserializeOwned;
use std::path::{Path, PathBuf};

use trimstat_core::{Attempt, AttemptError, ConfigError, RollingConfig};

use crate::schema::AttemptData;

// ===========================================================================
// Errors
// ===========================================================================

/// Failures while reading attempt logs or configs from disk.
#[derive(Debug, thiserror::Error)]
pub enum DataLoadError {
    /// No `{file}.{ron,toml,json}` in the directory.
    #[error("no '{file}' data file in {dir}")]
    MissingRequired { file: String, dir: PathBuf },

    /// Extension other than `.ron`, `.toml` or `.json`.
    #[error("cannot read {file}: expected a .ron, .toml or .json file")]
    UnsupportedFormat { file: PathBuf },

    /// The same data file exists in two formats.
    #[error("ambiguous data file: both {a} and {b} exist")]
    ConflictingFormats { a: PathBuf, b: PathBuf },

    #[error("failed to parse {file}: {detail}")]
    Parse { file: PathBuf, detail: String },

    /// The configuration parsed but cannot be run.
    #[error("invalid configuration in {file}: {source}")]
    Config {
        file: PathBuf,
        #[source]
        source: ConfigError,
    },

    /// A completed attempt has no duration.
    #[error("attempt {index} in {file} is not a DNF but has no duration")]
    MissingDuration { file: PathBuf, index: usize },

    /// A completed attempt has a duration no clock could produce.
    #[error("attempt {index} in {file}: {source}")]
    InvalidAttempt {
        file: PathBuf,
        index: usize,
        #[source]
        source: AttemptError,
    },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

// ===========================================================================
// Format detection
// ===========================================================================

/// On-disk encodings an attempt log or config can use.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Ron,
    Toml,
    Json,
}

impl Format {
    /// Extensions in discovery order.
    const ALL: [(&'static str, Format); 3] = [
        ("ron", Format::Ron),
        ("toml", Format::Toml),
        ("json", Format::Json),
    ];
}

/// Pick the encoding from the file extension.
pub fn detect_format(path: &Path) -> Result<Format, DataLoadError> {
    let ext = path.extension().and_then(|e| e.to_str());
    Format::ALL
        .iter()
        .find(|(name, _)| Some(*name) == ext)
        .map(|(_, format)| *format)
        .ok_or_else(|| DataLoadError::UnsupportedFormat {
            file: path.to_path_buf(),
        })
}

// ===========================================================================
// File discovery
// ===========================================================================

/// Locate `{base_name}` in `dir` under any supported extension.
///
/// A base name present in more than one encoding is an error rather than a
/// silent pick.
pub fn find_data_file(dir: &Path, base_name: &str) -> Result<Option<PathBuf>, DataLoadError> {
    let mut present = Format::ALL
        .iter()
        .map(|(ext, _)| dir.join(base_name).with_extension(ext))
        .filter(|path| path.is_file());

    match (present.next(), present.next()) {
        (Some(a), Some(b)) => Err(DataLoadError::ConflictingFormats { a, b }),
        (found, _) => Ok(found),
    }
}

/// [`find_data_file`] for files a log directory cannot do without.
pub fn require_data_file(dir: &Path, base_name: &str) -> Result<PathBuf, DataLoadError> {
    find_data_file(dir, base_name)?.ok_or_else(|| DataLoadError::MissingRequired {
        file: base_name.to_string(),
        dir: dir.to_path_buf(),
    })
}

// ===========================================================================
// Decoding
// ===========================================================================

fn parse_error(path: &Path, err: impl std::fmt::Display) -> DataLoadError {
    DataLoadError::Parse {
        file: path.to_path_buf(),
        detail: err.to_string(),
    }
}

/// Read `path` and decode it with the encoding its extension names.
///
/// TOML documents are always tables, so a value that is a list elsewhere
/// sits under `toml_key` there. RON and JSON ignore the key.
pub fn deserialize_file<T: DeserializeOwned>(
    path: &Path,
    toml_key: Option<&str>,
) -> Result<T, DataLoadError> {
    let format = detect_format(path)?;
    let content = std::fs::read_to_string(path)?;

    match (format, toml_key) {
        (Format::Ron, _) => ron::from_str(&content).map_err(|e| parse_error(path, e)),
        (Format::Json, _) => serde_json::from_str(&content).map_err(|e| parse_error(path, e)),
        (Format::Toml, None) => toml::from_str(&content).map_err(|e| parse_error(path, e)),
        (Format::Toml, Some(key)) => {
            let mut table: toml::Table =
                toml::from_str(&content).map_err(|e| parse_error(path, e))?;
            let value = table
                .remove(key)
                .ok_or_else(|| parse_error(path, format!("no '{key}' key")))?;
            value
                .try_into()
                .map_err(|e: toml::de::Error| parse_error(path, e))
        }
    }
}

// ===========================================================================
// Loading
// ===========================================================================

/// Load and validate a [`RollingConfig`].
pub fn load_config(path: &Path) -> Result<RollingConfig, DataLoadError> {
    let config: RollingConfig = deserialize_file(path, None)?;
    config.validate().map_err(|source| DataLoadError::Config {
        file: path.to_path_buf(),
        source,
    })?;
    tracing::info!(
        file = %path.display(),
        windows = ?config.sizes().collect::<Vec<_>>(),
        "loaded rolling config"
    );
    Ok(config)
}

/// Load an attempt log, preserving file order.
///
/// TOML files keep the list under an `attempts` key.
pub fn load_attempts(path: &Path) -> Result<Vec<Attempt>, DataLoadError> {
    let rows: Vec<AttemptData> = deserialize_file(path, Some("attempts"))?;
    let attempts = rows
        .into_iter()
        .enumerate()
        .map(|(index, row)| resolve_attempt(path, index, row))
        .collect::<Result<Vec<_>, DataLoadError>>()?;

    if attempts.is_empty() {
        tracing::warn!(file = %path.display(), "attempt log is empty");
    } else {
        tracing::info!(
            file = %path.display(),
            attempts = attempts.len(),
            dnfs = attempts.iter().filter(|a| a.is_dnf()).count(),
            "loaded attempt log"
        );
    }
    Ok(attempts)
}

fn resolve_attempt(path: &Path, index: usize, row: AttemptData) -> Result<Attempt, DataLoadError> {
    if row.dnf {
        return Ok(Attempt::dnf());
    }
    let duration = row.duration.ok_or_else(|| DataLoadError::MissingDuration {
        file: path.to_path_buf(),
        index,
    })?;
    Attempt::try_solved(duration).map_err(|source| DataLoadError::InvalidAttempt {
        file: path.to_path_buf(),
        index,
        source,
    })
}

/// An attempt log together with the configuration to evaluate it with.
#[derive(Debug, Clone)]
pub struct AttemptLog {
    pub config: RollingConfig,
    pub attempts: Vec<Attempt>,
}

/// Load `attempts.{ron,toml,json}` (required) and `config.{ron,toml,json}`
/// (optional, defaults to ao5/ao12/ao100) from `dir`.
pub fn load_attempt_log(dir: &Path) -> Result<AttemptLog, DataLoadError> {
    let attempts = load_attempts(&require_data_file(dir, "attempts")?)?;
    let config = match find_data_file(dir, "config")? {
        Some(path) => load_config(&path)?,
        None => RollingConfig::default(),
    };
    Ok(AttemptLog { config, attempts })
}

// ===========================================================================
// Tests
// ===========================================================================


#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::{TempDir, tempdir};
    use trimstat_core::{TrimRule, WindowSpec};

    fn write(dir: &TempDir, name: &str, content: &str) -> PathBuf {
        let path = dir.path().join(name);
        fs::write(&path, content).unwrap();
        path
    }

    // -----------------------------------------------------------------------
    // Formats and discovery
    // -----------------------------------------------------------------------

    #[test]
    fn detect_format_by_extension() {
        assert_eq!(detect_format(Path::new("a.ron")).unwrap(), Format::Ron);
        assert_eq!(detect_format(Path::new("a.toml")).unwrap(), Format::Toml);
        assert_eq!(detect_format(Path::new("a.json")).unwrap(), Format::Json);
        assert!(matches!(
            detect_format(Path::new("attempts.csv")),
            Err(DataLoadError::UnsupportedFormat { .. })
        ));
        assert!(matches!(
            detect_format(Path::new("attempts")),
            Err(DataLoadError::UnsupportedFormat { .. })
        ));
    }

    #[test]
    fn find_data_file_missing_and_found() {
        let dir = tempdir().unwrap();
        assert_eq!(find_data_file(dir.path(), "config").unwrap(), None);

        let path = write(&dir, "config.toml", "");
        assert_eq!(find_data_file(dir.path(), "config").unwrap(), Some(path));
    }

    #[test]
    fn find_data_file_rejects_two_encodings() {
        let dir = tempdir().unwrap();
        write(&dir, "attempts.json", "[]");
        write(&dir, "attempts.ron", "[]");

        assert!(matches!(
            find_data_file(dir.path(), "attempts"),
            Err(DataLoadError::ConflictingFormats { .. })
        ));
    }

    #[test]
    fn require_data_file_names_the_missing_file() {
        let dir = tempdir().unwrap();
        let err = require_data_file(dir.path(), "attempts").unwrap_err();
        assert!(matches!(
            err,
            DataLoadError::MissingRequired { ref file, .. } if file == "attempts"
        ));
    }

    // -----------------------------------------------------------------------
    // Config
    // -----------------------------------------------------------------------

    #[test]
    fn load_config_toml() {
        let dir = tempdir().unwrap();
        let path = write(
            &dir,
            "config.toml",
            r#"
[[windows]]
size = 3

[[windows]]
size = 50
rule = { percent = 10 }
"#,
        );

        let config = load_config(&path).unwrap();
        assert_eq!(
            config.windows,
            vec![
                WindowSpec::with_rule(3, TrimRule::Mean),
                WindowSpec::with_rule(50, TrimRule::Percent(10)),
            ]
        );
    }

    #[test]
    fn load_config_ron() {
        let dir = tempdir().unwrap();
        let path = write(&dir, "config.ron", "(windows: [(size: 5), (size: 12)])");
        assert_eq!(load_config(&path).unwrap(), RollingConfig::with_sizes(&[5, 12]));
    }

    #[test]
    fn saved_config_loads_back() {
        let config = RollingConfig::new(vec![
            WindowSpec::new(3),
            WindowSpec::with_rule(5, TrimRule::Mean),
            WindowSpec::with_rule(50, TrimRule::Percent(10)),
            WindowSpec::new(100),
        ]);
        let dir = tempdir().unwrap();

        let ron_path = write(&dir, "a.ron", &ron::to_string(&config).unwrap());
        assert_eq!(load_config(&ron_path).unwrap(), config);

        let json_path = write(&dir, "b.json", &serde_json::to_string(&config).unwrap());
        assert_eq!(load_config(&json_path).unwrap(), config);
    }

    #[test]
    fn load_config_rejects_invalid() {
        let dir = tempdir().unwrap();
        let path = write(
            &dir,
            "config.json",
            r#"{"windows": [{"size": 5}, {"size": 5}]}"#,
        );

        assert!(matches!(
            load_config(&path),
            Err(DataLoadError::Config {
                source: ConfigError::DuplicateSize(5),
                ..
            })
        ));
    }

    #[test]
    fn load_config_parse_error() {
        let dir = tempdir().unwrap();
        let path = write(&dir, "config.json", "{ not json");
        assert!(matches!(load_config(&path), Err(DataLoadError::Parse { .. })));
    }

    // -----------------------------------------------------------------------
    // Attempts
    // -----------------------------------------------------------------------

    #[test]
    fn load_attempts_json() {
        let dir = tempdir().unwrap();
        let path = write(
            &dir,
            "attempts.json",
            r#"[{"duration": 12.0}, {"dnf": true}, {"duration": 9.5, "dnf": false}]"#,
        );

        assert_eq!(
            load_attempts(&path).unwrap(),
            vec![Attempt::solved(12.0), Attempt::dnf(), Attempt::solved(9.5)]
        );
    }

    #[test]
    fn load_attempts_toml() {
        let dir = tempdir().unwrap();
        let path = write(
            &dir,
            "attempts.toml",
            r#"
[[attempts]]
duration = 11.0

[[attempts]]
duration = 30.0
dnf = true
"#,
        );

        assert_eq!(
            load_attempts(&path).unwrap(),
            vec![Attempt::solved(11.0), Attempt::dnf()]
        );
    }

    #[test]
    fn load_attempts_toml_missing_key() {
        let dir = tempdir().unwrap();
        let path = write(&dir, "attempts.toml", "solves = []");
        assert!(matches!(load_attempts(&path), Err(DataLoadError::Parse { .. })));
    }

    #[test]
    fn load_attempts_rejects_negative_duration() {
        let dir = tempdir().unwrap();
        let path = write(&dir, "attempts.json", r#"[{"duration": 1.0}, {"duration": -4.0}]"#);

        assert!(matches!(
            load_attempts(&path),
            Err(DataLoadError::InvalidAttempt {
                index: 1,
                source: AttemptError::Negative(_),
                ..
            })
        ));
    }

    #[test]
    fn load_attempts_requires_duration_when_completed() {
        let dir = tempdir().unwrap();
        let path = write(&dir, "attempts.ron", "[(dnf: false)]");
        assert!(matches!(
            load_attempts(&path),
            Err(DataLoadError::MissingDuration { index: 0, .. })
        ));
    }

    // -----------------------------------------------------------------------
    // Directory loading
    // -----------------------------------------------------------------------

    #[test]
    fn attempt_log_defaults_config() {
        let dir = tempdir().unwrap();
        write(&dir, "attempts.json", r#"[{"duration": 1.0}]"#);

        let log = load_attempt_log(dir.path()).unwrap();
        assert_eq!(log.config, RollingConfig::default());
        assert_eq!(log.attempts.len(), 1);
    }

    #[test]
    fn attempt_log_requires_attempts() {
        let dir = tempdir().unwrap();
        assert!(matches!(
            load_attempt_log(dir.path()),
            Err(DataLoadError::MissingRequired { .. })
        ));
    }
}
