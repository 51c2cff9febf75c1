use std::fs;
use std::path::Path;

use crate::error::{ClassifyError, Result};

pub const CONFIG_FILE: &str = "app.config";

const RESAMPLING_METHODS: [&str; 10] = [
  "NEAREST",
  "AVERAGE",
  "MODE",
  "GAUSS",
  "BILINEAR",
  "CUBIC",
  "CUBICSPLINE",
  "LANCZOS",
  "RMS",
  "NONE",
];

/// Run settings read from `app.config`. Every key is optional; command line
/// flags override whatever is set here.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Settings {
  pub jobs: Option<usize>,
  pub overviews: Option<bool>,
  pub overview_resampling: Option<String>,
  pub progress: Option<bool>,
}

// Loads a configuration value for a given key from `key = value` lines
pub fn config_value(text: &str, key_to_find: &str) -> Option<String> {
  text
    .lines()
    .map(str::trim)
    .filter(|line| !line.is_empty() && !line.starts_with('#'))
    .filter_map(|line| line.split_once('='))
    .filter(|(key, _)| key.trim() == key_to_find)
    .map(|(_, value)| value.trim().to_string())
    .last()
}

fn parse_flag(key: &str, value: &str) -> Result<bool> {
  match value.to_ascii_lowercase().as_str() {
    "true" | "yes" | "on" | "1" => Ok(true),
    "false" | "no" | "off" | "0" => Ok(false),
    _ => Err(ClassifyError::configuration(format!(
      "{}: '{}' is not a valid value for '{}' (expecting true or false)",
      CONFIG_FILE, value, key
    ))),
  }
}

impl Settings {
  pub fn parse(text: &str) -> Result<Settings> {
    let jobs = match config_value(text, "jobs") {
      Some(value) => match value.parse::<usize>() {
        Ok(jobs) if jobs > 0 => Some(jobs),
        _ => {
          return Err(ClassifyError::configuration(format!(
            "{}: 'jobs' must be a number greater than 0, found '{}'",
            CONFIG_FILE, value
          )))
        }
      },
      None => None,
    };

    let overviews = config_value(text, "overviews").map(|v| parse_flag("overviews", &v)).transpose()?;
    let progress = config_value(text, "progress").map(|v| parse_flag("progress", &v)).transpose()?;

    let overview_resampling = match config_value(text, "overview_resampling") {
      Some(value) => {
        let method = value.to_ascii_uppercase();
        if !RESAMPLING_METHODS.contains(&method.as_str()) {
          return Err(ClassifyError::configuration(format!(
            "{}: unknown 'overview_resampling' method '{}'",
            CONFIG_FILE, value
          )));
        }
        Some(method)
      }
      None => None,
    };

    Ok(Settings { jobs, overviews, overview_resampling, progress })
  }

  /// Reads settings from `path`; a missing file yields the defaults.
  pub fn load<P: AsRef<Path>>(path: P) -> Result<Settings> {
    let path = path.as_ref();
    if !path.exists() {
      return Ok(Settings::default());
    }
    let text = fs::read_to_string(path)?;
    Settings::parse(&text)
  }
}
