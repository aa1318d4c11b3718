use std::collections::HashMap;
use std::fs;
use std::path::{
  Path,
  PathBuf
};

use anyhow::{
  Context,
  anyhow,
  bail
};
use tracing::{
  debug,
  info,
  trace,
  warn
};

use crate::layout::DEFAULT_HOUR_HEIGHT;
use crate::navigation::ViewMode;
use crate::store::DEFAULT_STORAGE_KEY;

pub const RC_ENV_VAR: &str =
  "CALGRIDRC";
pub const RC_FILE_NAME: &str =
  ".calgridrc";

const KEY_DATA: &str = "data.location";
const KEY_STORAGE: &str =
  "storage.key";
const KEY_HOUR_HEIGHT: &str =
  "week.hour_height";
const KEY_VIEW: &str = "calendar.view";
const KEY_COLOR: &str = "color";

/// Every setting calgrid reads, with
/// its built-in value.
const DEFAULTS: [(&str, &str); 5] = [
  (KEY_DATA, "~/.calgrid"),
  (KEY_STORAGE, DEFAULT_STORAGE_KEY),
  (KEY_HOUR_HEIGHT, "48"),
  (KEY_VIEW, "month"),
  (KEY_COLOR, "on")
];

/// One meaningful line of an rc file.
#[derive(Debug, Clone, PartialEq, Eq)]
enum RcLine<'a> {
  Include(&'a str),
  Setting {
    key: &'a str,
    value: &'a str
  }
}

/// calgridrc settings layered over the
/// built-in defaults.
#[derive(Debug, Clone)]
pub struct Config {
  values: HashMap<String, String>,
  pub loaded_files: Vec<PathBuf>
}

impl Default for Config {
  fn default() -> Self {
    Self {
      values: DEFAULTS
        .iter()
        .map(|(key, value)| {
          (
            (*key).to_string(),
            (*value).to_string()
          )
        })
        .collect(),
      loaded_files: Vec::new()
    }
  }
}

impl Config {
  /// Reads the rc file picked by
  /// `locate_rc`, if any.
  #[tracing::instrument]
  pub fn load(
    explicit: Option<&Path>
  ) -> anyhow::Result<Self> {
    let mut cfg = Self::default();
    let located = locate_rc(
      explicit,
      std::env::var(RC_ENV_VAR).ok(),
      dirs::home_dir()
    );

    match located {
      | Some(path) => {
        info!(rc = %path.display(), "reading calgridrc");
        cfg.read_file(&path, &mut Vec::new())?;
      }
      | None => {
        debug!("no calgridrc; built-in settings only");
      }
    }

    Ok(cfg)
  }

  /// `--rc key=value` pairs. Keys
  /// calgrid does not read are dropped
  /// with a warning.
  pub fn apply_overrides<I>(
    &mut self,
    overrides: I
  ) where
    I: IntoIterator<
      Item = (String, String)
    >
  {
    for (key, value) in overrides {
      if !is_known_key(&key) {
        warn!(key = %key, "ignoring unknown --rc key");
        continue;
      }
      debug!(key = %key, value = %value, "override");
      self.values.insert(key, value);
    }
  }

  pub fn get(
    &self,
    key: &str
  ) -> Option<&str> {
    self
      .values
      .get(key)
      .map(String::as_str)
  }

  pub fn storage_key(&self) -> String {
    match self.get(KEY_STORAGE) {
      | Some(key)
        if !key.trim().is_empty() =>
      {
        key.trim().to_string()
      }
      | _ => {
        DEFAULT_STORAGE_KEY.to_string()
      }
    }
  }

  /// Non-numeric or non-positive
  /// values fall back to the default.
  pub fn hour_height(&self) -> f64 {
    let raw = self
      .get(KEY_HOUR_HEIGHT)
      .unwrap_or_default();
    match raw.trim().parse::<f64>() {
      | Ok(value)
        if value.is_finite()
          && value > 0.0 =>
      {
        value
      }
      | _ => {
        warn!(
          value = %raw,
          "invalid week.hour_height; \
           using default"
        );
        DEFAULT_HOUR_HEIGHT
      }
    }
  }

  pub fn initial_view(&self) -> ViewMode {
    let raw = self
      .get(KEY_VIEW)
      .unwrap_or_default();
    ViewMode::from_key(raw)
      .unwrap_or_else(|| {
        warn!(
          value = %raw,
          "unknown calendar.view; \
           using month"
        );
        ViewMode::Month
      })
  }

  /// Whether terminal output may use
  /// ANSI colour.
  pub fn color(
    &self
  ) -> anyhow::Result<bool> {
    let raw = self
      .get(KEY_COLOR)
      .unwrap_or("on");
    parse_switch(raw).ok_or_else(|| {
      anyhow!(
        "invalid color setting: {raw}"
      )
    })
  }

  /// Resolves and creates the store
  /// directory. `explicit` is the
  /// `--data` flag.
  #[tracing::instrument(skip(self))]
  pub fn data_dir(
    &self,
    explicit: Option<&Path>
  ) -> anyhow::Result<PathBuf> {
    let dir = match explicit {
      | Some(path) => path.to_path_buf(),
      | None => {
        let raw = self
          .get(KEY_DATA)
          .unwrap_or("~/.calgrid");
        home_relative(
          Path::new(raw),
          dirs::home_dir().as_deref()
        )
      }
    };

    if !dir.is_dir() {
      info!(dir = %dir.display(), "creating data directory");
      fs::create_dir_all(&dir)
        .with_context(|| {
          format!(
            "failed to create {}",
            dir.display()
          )
        })?;
    }
    Ok(dir)
  }

  /// `chain` holds the files currently
  /// being read, outermost first.
  fn read_file(
    &mut self,
    path: &Path,
    chain: &mut Vec<PathBuf>
  ) -> anyhow::Result<()> {
    let path = home_relative(
      path,
      dirs::home_dir().as_deref()
    );
    if chain.contains(&path) {
      bail!(
        "include cycle through {}",
        path.display()
      );
    }

    let text = fs::read_to_string(&path)
      .with_context(|| {
        format!(
          "failed to read {}",
          path.display()
        )
      })?;
    self.loaded_files.push(path.clone());
    chain.push(path.clone());

    for (idx, raw) in
      text.lines().enumerate()
    {
      let line = parse_line(raw)
        .with_context(|| {
          format!(
            "{}:{}",
            path.display(),
            idx + 1
          )
        })?;
      match line {
        | None => {}
        | Some(RcLine::Include(target)) => {
          let target = include_target(
            &path, target
          );
          if target.is_file() {
            self.read_file(&target, chain)?;
          } else {
            warn!(include = %target.display(), "missing include skipped");
          }
        }
        | Some(RcLine::Setting {
          key,
          value
        }) => {
          trace!(key, value, "setting");
          self.values.insert(
            key.to_string(),
            value.to_string()
          );
        }
      }
    }

    chain.pop();
    Ok(())
  }
}

/// `--calrc` wins, then `$CALGRIDRC`
/// (`/dev/null` disables the rc file),
/// then `~/.calgridrc` if it exists.
fn locate_rc(
  explicit: Option<&Path>,
  env_value: Option<String>,
  home: Option<PathBuf>
) -> Option<PathBuf> {
  if let Some(path) = explicit {
    return Some(path.to_path_buf());
  }
  match env_value.as_deref() {
    | Some("/dev/null") => None,
    | Some(value)
      if !value.is_empty() =>
    {
      Some(PathBuf::from(value))
    }
    | _ => home
      .map(|dir| dir.join(RC_FILE_NAME))
      .filter(|path| path.is_file())
  }
}

/// `Ok(None)` for blank and comment
/// lines. Text after `#` is dropped.
fn parse_line(
  raw: &str
) -> anyhow::Result<Option<RcLine<'_>>> {
  let line = raw
    .split('#')
    .next()
    .unwrap_or_default()
    .trim();
  if line.is_empty() {
    return Ok(None);
  }

  if let Some(target) =
    line.strip_prefix("include ")
  {
    let target = target.trim();
    if target.is_empty() {
      bail!("include without a path");
    }
    return Ok(Some(RcLine::Include(
      target
    )));
  }

  match line.split_once('=') {
    | Some((key, value))
      if !key.trim().is_empty() =>
    {
      Ok(Some(RcLine::Setting {
        key: key.trim(),
        value: value.trim()
      }))
    }
    | _ => {
      bail!(
        "expected `key = value`, got \
         {line:?}"
      )
    }
  }
}

fn include_target(
  from_file: &Path,
  target: &str
) -> PathBuf {
  let target = home_relative(
    Path::new(target),
    dirs::home_dir().as_deref()
  );
  if target.is_absolute() {
    return target;
  }
  from_file
    .parent()
    .unwrap_or_else(|| Path::new("."))
    .join(target)
}

/// Replaces a leading `~` component
/// with `home`.
fn home_relative(
  path: &Path,
  home: Option<&Path>
) -> PathBuf {
  match (path.strip_prefix("~"), home)
  {
    | (Ok(rest), Some(home)) => {
      home.join(rest)
    }
    | _ => path.to_path_buf()
  }
}

fn is_known_key(key: &str) -> bool {
  DEFAULTS
    .iter()
    .any(|(known, _)| *known == key)
}

fn parse_switch(raw: &str) -> Option<bool> {
  match raw
    .trim()
    .to_ascii_lowercase()
    .as_str()
  {
    | "on" | "yes" | "y" | "true"
    | "1" => Some(true),
    | "off" | "no" | "n" | "false"
    | "0" => Some(false),
    | _ => None
  }
}
