//! Template path confinement.

use std::path::{Component, Path, PathBuf};

use crate::error::TemplateError;

/// Absolute, lexically normalized form of `path`.
///
/// `.` and `..` are collapsed without touching the filesystem, so the result
/// is stable whether or not the file exists.
pub(crate) fn normalize(path: &Path) -> PathBuf {
    let absolute = std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf());
    let mut out = PathBuf::new();
    for component in absolute.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if !out.pop() {
                    out.push(component);
                }
            }
            other => out.push(other),
        }
    }
    out
}

/// Resolve a directive location to a canonical path inside `root`.
///
/// Absolute locations and locations that already start with the root as it
/// was written (`written_root`) are used as they are. Anything else is taken
/// relative to `root`, never to the working directory. `root` must already
/// be normalized.
pub(crate) fn locate(
    root: &Path,
    written_root: &Path,
    location: &str,
) -> Result<PathBuf, TemplateError> {
    let path = Path::new(location);
    let rooted = path.is_absolute()
        || (!written_root.as_os_str().is_empty() && path.starts_with(written_root));

    let candidate = if rooted {
        normalize(path)
    } else {
        normalize(&root.join(path))
    };

    if candidate.starts_with(root) {
        Ok(candidate)
    } else {
        Err(TemplateError::OutsideRoot {
            location: location.to_owned(),
            root: root.to_path_buf(),
        })
    }
}
