//! Module resolution for `require` specifiers

use std::ffi::OsString;
use std::path::{Component, Path, PathBuf};

use tracing::debug;

use crate::error::ResolveError;

/// Resolves specifiers against a requesting directory, trying the bare
/// path first and then each extension appended to it
#[derive(Debug, Clone)]
pub struct Resolver {
    extensions: Vec<String>,
}

impl Resolver {
    pub fn new(extensions: Vec<String>) -> Self {
        Self { extensions }
    }

    /// Paths tried for `request` from `context`, in order
    pub fn candidates(&self, request: &str, context: &Path) -> Vec<PathBuf> {
        let base = normalize_path(&context.join(request));
        let mut candidates = Vec::with_capacity(self.extensions.len() + 1);
        candidates.push(base.clone());
        for ext in &self.extensions {
            // Appended, not swapped: `./a.b` with `.js` is `./a.b.js`
            let mut name = OsString::from(base.as_os_str());
            name.push(ext);
            candidates.push(PathBuf::from(name));
        }
        candidates
    }

    /// Resolve `request` to the first candidate that is an existing file
    pub fn resolve(&self, request: &str, context: &Path) -> Result<PathBuf, ResolveError> {
        let attempted = self.candidates(request, context);
        if let Some(found) = attempted.iter().find(|candidate| candidate.is_file()) {
            debug!(request, resolved = %found.display(), "resolved");
            return Ok(found.clone());
        }

        Err(ResolveError {
            request: request.to_string(),
            context: context.to_path_buf(),
            attempted,
        })
    }
}

/// Collapse `.` and `..` components without touching the file system
pub fn normalize_path(path: &Path) -> PathBuf {
    let mut normalized = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => match normalized.components().next_back() {
                Some(Component::Normal(_)) => {
                    normalized.pop();
                }
                Some(Component::RootDir) | Some(Component::Prefix(_)) => {}
                _ => normalized.push(".."),
            },
            other => normalized.push(other.as_os_str()),
        }
    }
    normalized
}

/// Module id of `path`: root-relative, `./`-prefixed, `/`-separated
pub fn module_id(root: &Path, path: &Path) -> String {
    let relative = pathdiff::diff_paths(path, root).unwrap_or_else(|| path.to_path_buf());
    let segments: Vec<String> = relative
        .components()
        .map(|component| component.as_os_str().to_string_lossy().into_owned())
        .collect();
    format!("./{}", segments.join("/"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn resolver() -> Resolver {
        Resolver::new(vec![".js".to_string(), ".json".to_string()])
    }

    #[test]
    fn test_bare_path_wins() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("data"), "x").unwrap();
        fs::write(dir.path().join("data.js"), "y").unwrap();

        let resolved = resolver().resolve("./data", dir.path()).unwrap();
        assert_eq!(resolved, dir.path().join("data"));
    }

    #[test]
    fn test_extensions_tried_in_order() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("config.json"), "{}").unwrap();
        fs::write(dir.path().join("title.js"), "").unwrap();

        assert_eq!(
            resolver().resolve("./config", dir.path()).unwrap(),
            dir.path().join("config.json")
        );
        assert_eq!(
            resolver().resolve("./title", dir.path()).unwrap(),
            dir.path().join("title.js")
        );
    }

    #[test]
    fn test_directory_is_not_a_module() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir(dir.path().join("lib")).unwrap();
        fs::write(dir.path().join("lib.js"), "").unwrap();

        assert_eq!(
            resolver().resolve("./lib", dir.path()).unwrap(),
            dir.path().join("lib.js")
        );
    }

    #[test]
    fn test_missing_module_lists_attempts() {
        let dir = tempfile::tempdir().unwrap();
        let err = resolver().resolve("./missing", dir.path()).unwrap_err();

        assert_eq!(
            err.attempted,
            vec![
                dir.path().join("missing"),
                dir.path().join("missing.js"),
                dir.path().join("missing.json"),
            ]
        );
        assert_eq!(
            err.to_string(),
            format!("No Module, Error: can't resolve ./missing in {}", dir.path().display())
        );
    }

    #[test]
    fn test_normalize_path() {
        assert_eq!(normalize_path(Path::new("/a/b/../c/./d.js")), PathBuf::from("/a/c/d.js"));
        assert_eq!(normalize_path(Path::new("/../a")), PathBuf::from("/a"));
        assert_eq!(normalize_path(Path::new("../a/../../b")), PathBuf::from("../../b"));
    }

    #[test]
    fn test_module_id() {
        let root = Path::new("/project");
        assert_eq!(module_id(root, Path::new("/project/src/index.js")), "./src/index.js");
        assert_eq!(module_id(root, Path::new("/project/a.js")), "./a.js");
        assert_eq!(module_id(root, Path::new("/shared/b.js")), "./../shared/b.js");
    }
}
