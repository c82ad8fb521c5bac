//! Loader registry and the built-in loaders

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use knit_loader::{Content, Invocation, Loader, LoaderContext, LoaderError, LoaderObject, LoaderResult};

/// Loader implementations by name, per compiler
#[derive(Clone, Default)]
pub struct LoaderRegistry {
    loaders: HashMap<String, Arc<dyn Loader>>,
}

impl LoaderRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry holding `raw-loader` and `json-loader`
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        registry.register("raw-loader", Arc::new(RawLoader));
        registry.register("json-loader", Arc::new(JsonLoader));
        registry
    }

    /// Register `loader` under `name`, replacing any previous one
    pub fn register(&mut self, name: impl Into<String>, loader: Arc<dyn Loader>) {
        self.loaders.insert(name.into(), loader);
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn Loader>> {
        self.loaders.get(name).cloned()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.loaders.contains_key(name)
    }

    /// Fresh loader objects for `names`, in the given order
    pub fn chain(&self, names: &[String]) -> Result<Vec<LoaderObject>, LoaderError> {
        names
            .iter()
            .map(|name| {
                self.get(name)
                    .map(|loader| LoaderObject::new(name.clone(), loader))
                    .ok_or_else(|| LoaderError::NotFound { name: name.clone() })
            })
            .collect()
    }
}

impl fmt::Debug for LoaderRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<&String> = self.loaders.keys().collect();
        names.sort();
        f.debug_struct("LoaderRegistry").field("loaders", &names).finish()
    }
}

fn first_text(args: Vec<Option<Content>>) -> String {
    args.into_iter().next().flatten().map(Content::into_text).unwrap_or_default()
}

/// Exports the content as a string
pub struct RawLoader;

impl Loader for RawLoader {
    fn normal(&self, _ctx: &mut LoaderContext, args: Vec<Option<Content>>) -> LoaderResult {
        let literal = serde_json::to_string(&first_text(args)).map_err(|e| LoaderError::msg(e.to_string()))?;
        Ok(Invocation::value(format!("module.exports = {literal};\n")))
    }
}

/// Validates JSON content and exports it
pub struct JsonLoader;

impl Loader for JsonLoader {
    fn normal(&self, ctx: &mut LoaderContext, args: Vec<Option<Content>>) -> LoaderResult {
        let text = first_text(args);
        let value: serde_json::Value = serde_json::from_str(&text).map_err(|e| {
            LoaderError::msg(format!("{} is not valid JSON: {e}", ctx.resource_path().display()))
        })?;
        Ok(Invocation::value(format!("module.exports = {value};\n")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use knit_loader::{run_loaders, RunOptions};
    use std::fs;

    fn run(name: &str, content: &str) -> Result<String, LoaderError> {
        let dir = tempfile::tempdir().unwrap();
        let resource = dir.path().join("resource");
        fs::write(&resource, content).unwrap();

        let registry = LoaderRegistry::with_builtins();
        let output = run_loaders(RunOptions {
            resource,
            context: dir.path().to_path_buf(),
            loaders: registry.chain(&[name.to_string()])?,
        })?;
        Ok(output.into_content()?.into_text())
    }

    #[test]
    fn test_raw_loader_quotes_content() {
        let output = run("raw-loader", "say \"hi\"\n").unwrap();
        assert_eq!(output, "module.exports = \"say \\\"hi\\\"\\n\";\n");
    }

    #[test]
    fn test_json_loader_exports_value() {
        let output = run("json-loader", "{ \"name\": \"knit\" }").unwrap();
        assert_eq!(output, "module.exports = {\"name\":\"knit\"};\n");
    }

    #[test]
    fn test_json_loader_rejects_invalid_json() {
        let err = run("json-loader", "{ oops").unwrap_err();
        assert!(err.root_cause().to_string().contains("is not valid JSON"));
    }

    #[test]
    fn test_unknown_loader() {
        let registry = LoaderRegistry::with_builtins();
        let err = registry.chain(&["raw-loader".to_string(), "nope".to_string()]).unwrap_err();
        assert!(matches!(err, LoaderError::NotFound { name } if name == "nope"));
    }
}
