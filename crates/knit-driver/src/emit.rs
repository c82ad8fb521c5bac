//! Bundle rendering and asset output

use std::fs;
use std::path::{Component, Path, PathBuf};

use indexmap::IndexMap;
use tracing::debug;

use crate::chunk::Chunk;
use crate::compilation::Module;
use crate::error::{BuildError, ConfigError};
use crate::transform::{quote, RUNTIME_REQUIRE};

const NAME_PLACEHOLDER: &str = "[name]";

pub fn render_filename(template: &str, chunk_name: &str) -> String {
    template.replace(NAME_PLACEHOLDER, chunk_name)
}

/// A relative path that stays below the directory it is joined to
fn stays_inside(filename: &str) -> bool {
    let mut named = false;
    for component in Path::new(filename).components() {
        match component {
            Component::Normal(_) => named = true,
            Component::CurDir => {}
            _ => return false,
        }
    }
    named
}

/// Bundle text for `chunk`: the module table, the caching runtime require
/// and a wrapper that requires the entry module.
pub fn render_chunk(chunk: &Chunk, registry: &IndexMap<String, Module>) -> String {
    let mut out = String::new();
    out.push_str("(() => {\n");
    out.push_str("  var __knit_modules__ = {\n");
    for module in chunk.modules.iter().filter_map(|id| registry.get(id)) {
        out.push_str(&format!(
            "    {}: (module, exports, {RUNTIME_REQUIRE}) => {{\n",
            quote(&module.id)
        ));
        out.push_str(&module.source);
        if !module.source.ends_with('\n') {
            out.push('\n');
        }
        out.push_str("    },\n");
    }
    out.push_str("  };\n");
    out.push_str(&format!(
        r#"  var __knit_module_cache__ = {{}};
  function {RUNTIME_REQUIRE}(moduleId) {{
    var cachedModule = __knit_module_cache__[moduleId];
    if (cachedModule !== undefined) {{
      return cachedModule.exports;
    }}
    var module = (__knit_module_cache__[moduleId] = {{ exports: {{}} }});
    __knit_modules__[moduleId](module, module.exports, {RUNTIME_REQUIRE});
    return module.exports;
  }}
  (() => {{
    {RUNTIME_REQUIRE}({});
  }})();
}})();
"#,
        quote(&chunk.entry_module)
    ));
    out
}

/// Asset name to bundle text, one asset per chunk
pub fn render_assets(
    chunks: &[Chunk],
    registry: &IndexMap<String, Module>,
    filename: &str,
) -> Result<IndexMap<String, String>, ConfigError> {
    let mut assets = IndexMap::new();
    let mut owners: IndexMap<String, &str> = IndexMap::new();
    for chunk in chunks {
        let name = render_filename(filename, &chunk.name);
        if !stays_inside(&name) {
            return Err(ConfigError::UnsafeFilename {
                filename: name,
                chunk: chunk.name.clone(),
            });
        }
        if let Some(first) = owners.get(&name) {
            return Err(ConfigError::FilenameConflict {
                filename: name,
                first: first.to_string(),
                second: chunk.name.clone(),
            });
        }
        owners.insert(name.clone(), &chunk.name);
        assets.insert(name, render_chunk(chunk, registry));
    }
    Ok(assets)
}

/// Write every asset under `output_dir`, all or nothing.
///
/// Assets are written to temporary siblings first and renamed into place
/// once every write succeeded. On failure the temporaries and any asset
/// already renamed are removed.
pub fn write_assets(
    output_dir: &Path,
    assets: &IndexMap<String, String>,
) -> Result<Vec<PathBuf>, BuildError> {
    let mut staged: Vec<(PathBuf, PathBuf)> = Vec::with_capacity(assets.len());
    for (name, text) in assets {
        let target = output_dir.join(name);
        let temp = temp_sibling(&target);
        let written = target
            .parent()
            .map_or(Ok(()), fs::create_dir_all)
            .and_then(|()| fs::write(&temp, text));
        if let Err(source) = written {
            // `temp` may exist after a partial write
            let _ = fs::remove_file(&temp);
            discard(&staged, &[]);
            return Err(BuildError::Emit { path: target, source });
        }
        staged.push((temp, target));
    }

    let mut moved: Vec<PathBuf> = Vec::with_capacity(staged.len());
    for (index, (temp, target)) in staged.iter().enumerate() {
        if let Err(source) = fs::rename(temp, target) {
            discard(&staged[index..], &moved);
            return Err(BuildError::Emit {
                path: target.clone(),
                source,
            });
        }
        debug!(asset = %target.display(), "asset written");
        moved.push(target.clone());
    }
    Ok(moved)
}

fn temp_sibling(target: &Path) -> PathBuf {
    let name = target
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();
    target.with_file_name(format!(".{name}.knit-tmp"))
}

fn discard(staged: &[(PathBuf, PathBuf)], moved: &[PathBuf]) {
    for (temp, _) in staged {
        let _ = fs::remove_file(temp);
    }
    for target in moved {
        let _ = fs::remove_file(target);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn registry() -> IndexMap<String, Module> {
        [("./title.js", "module.exports = 'title';"), ("./index.js", "console.log(__knit_require__(\"./title.js\"));\n")]
            .into_iter()
            .map(|(id, source)| {
                (
                    id.to_string(),
                    Module {
                        id: id.to_string(),
                        path: PathBuf::from(id),
                        source: source.to_string(),
                        dependencies: Default::default(),
                        entries: vec!["main".to_string()],
                    },
                )
            })
            .collect()
    }

    fn chunk(name: &str) -> Chunk {
        Chunk {
            name: name.to_string(),
            entry_module: "./index.js".to_string(),
            modules: vec!["./title.js".to_string(), "./index.js".to_string()],
        }
    }

    #[test]
    fn test_render_filename() {
        assert_eq!(render_filename("[name].js", "main"), "main.js");
        assert_eq!(render_filename("js/[name]/[name].bundle.js", "app"), "js/app/app.bundle.js");
        assert_eq!(render_filename("bundle.js", "app"), "bundle.js");
    }

    #[test]
    fn test_render_chunk() {
        let text = render_chunk(&chunk("main"), &registry());
        let expected = r#"(() => {
  var __knit_modules__ = {
    "./title.js": (module, exports, __knit_require__) => {
module.exports = 'title';
    },
    "./index.js": (module, exports, __knit_require__) => {
console.log(__knit_require__("./title.js"));
    },
  };
  var __knit_module_cache__ = {};
  function __knit_require__(moduleId) {
    var cachedModule = __knit_module_cache__[moduleId];
    if (cachedModule !== undefined) {
      return cachedModule.exports;
    }
    var module = (__knit_module_cache__[moduleId] = { exports: {} });
    __knit_modules__[moduleId](module, module.exports, __knit_require__);
    return module.exports;
  }
  (() => {
    __knit_require__("./index.js");
  })();
})();
"#;
        assert_eq!(text, expected);
    }

    #[test]
    fn test_rendered_bundle_parses() {
        let text = render_chunk(&chunk("main"), &registry());
        assert!(knit_parser::parse_module(&text).is_ok());
    }

    #[test]
    fn test_filename_outside_output_dir() {
        for (entry, template) in [("../x", "[name].js"), ("main", "/tmp/[name].js"), ("", "[name]")] {
            let err = render_assets(&[chunk(entry)], &registry(), template).unwrap_err();
            assert!(
                matches!(&err, ConfigError::UnsafeFilename { chunk, .. } if chunk == entry),
                "{} with {}: {:?}",
                entry,
                template,
                err
            );
        }

        let assets = render_assets(&[chunk("app")], &registry(), "./js/[name].js").unwrap();
        assert!(assets.contains_key("./js/app.js"));
    }

    #[test]
    fn test_filename_conflict() {
        let chunks = vec![chunk("a"), chunk("b")];
        let err = render_assets(&chunks, &registry(), "bundle.js").unwrap_err();
        assert!(matches!(
            err,
            ConfigError::FilenameConflict { filename, first, second }
                if filename == "bundle.js" && first == "a" && second == "b"
        ));
    }

    #[test]
    fn test_write_assets_creates_directories() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("dist");
        let assets: IndexMap<String, String> = [
            ("main.js".to_string(), "one".to_string()),
            ("nested/other.js".to_string(), "two".to_string()),
        ]
        .into_iter()
        .collect();

        let written = write_assets(&out, &assets).unwrap();
        assert_eq!(written, vec![out.join("main.js"), out.join("nested/other.js")]);
        assert_eq!(fs::read_to_string(out.join("nested/other.js")).unwrap(), "two");

        let leftovers: Vec<_> = fs::read_dir(&out)
            .unwrap()
            .filter_map(|entry| entry.ok())
            .filter(|entry| entry.file_name().to_string_lossy().ends_with(".knit-tmp"))
            .collect();
        assert!(leftovers.is_empty());
    }

    #[test]
    fn test_failed_write_leaves_nothing_behind() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("dist");
        fs::create_dir_all(&out).unwrap();
        // A regular file where a directory is needed
        fs::write(out.join("blocked"), "").unwrap();
        let assets: IndexMap<String, String> = [
            ("main.js".to_string(), "one".to_string()),
            ("blocked/other.js".to_string(), "two".to_string()),
        ]
        .into_iter()
        .collect();

        let err = write_assets(&out, &assets).unwrap_err();
        assert!(matches!(err, BuildError::Emit { .. }));

        let mut names: Vec<String> = fs::read_dir(&out)
            .unwrap()
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        assert_eq!(names, vec!["blocked"]);
    }
}
