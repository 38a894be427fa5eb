use crate::error::{IngestError, Result};
use std::path::{Component, Path};
use std::str::FromStr;

/// How a local file path is turned into an object key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum KeyScheme {
    /// `<root dir name>/<path relative to root>`
    #[default]
    DirName,
    /// `<path relative to root>`
    Relative,
}

impl FromStr for KeyScheme {
    type Err = IngestError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "dir-name" | "dir_name" | "dirname" => Ok(KeyScheme::DirName),
            "relative" => Ok(KeyScheme::Relative),
            other => Err(IngestError::Config(format!(
                "Unknown key scheme '{}', expected 'dir-name' or 'relative'",
                other
            ))),
        }
    }
}

/// Computes the key prefix the scheme needs for `root`, if any.
///
/// Paths without a final component (`.`, `/`) are canonicalized first so
/// `DirName` still gets the real directory name.
pub fn key_prefix(root: &Path, scheme: KeyScheme) -> Result<Option<String>> {
    match scheme {
        KeyScheme::Relative => Ok(None),
        KeyScheme::DirName => {
            if let Some(name) = root.file_name() {
                return Ok(Some(name.to_string_lossy().into_owned()));
            }
            let canonical = root.canonicalize()?;
            canonical
                .file_name()
                .map(|name| Some(name.to_string_lossy().into_owned()))
                .ok_or_else(|| {
                    IngestError::InvalidArgument(format!(
                        "Cannot derive a key prefix from '{}'",
                        root.display()
                    ))
                })
        }
    }
}

/// Builds the object key for `file`, which must live under `root`.
/// Keys always use `/` separators.
pub fn object_key(prefix: Option<&str>, root: &Path, file: &Path) -> Result<String> {
    let relative = file.strip_prefix(root).map_err(|_| {
        IngestError::InvalidArgument(format!(
            "'{}' is not under '{}'",
            file.display(),
            root.display()
        ))
    })?;

    let mut parts: Vec<String> = prefix.map(|p| vec![p.to_string()]).unwrap_or_default();
    for component in relative.components() {
        match component {
            Component::Normal(part) => parts.push(part.to_string_lossy().into_owned()),
            Component::CurDir => {}
            _ => {
                return Err(IngestError::InvalidArgument(format!(
                    "Unsupported path component in '{}'",
                    relative.display()
                )));
            }
        }
    }

    if parts.is_empty() {
        return Err(IngestError::InvalidArgument(format!(
            "'{}' does not name a file under '{}'",
            file.display(),
            root.display()
        )));
    }

    Ok(parts.join("/"))
}
