//! Build summary

use std::path::PathBuf;

use indexmap::IndexMap;
use serde::Serialize;

use crate::chunk::Chunk;
use crate::compilation::Module;

/// What a successful build produced
#[derive(Debug, Clone, Serialize)]
pub struct Stats {
    /// Entry name to entry module id
    pub entries: IndexMap<String, String>,
    pub modules: Vec<Module>,
    pub chunks: Vec<Chunk>,
    /// Asset names in chunk order
    pub files: Vec<String>,
    /// Asset name to bundle text
    pub assets: IndexMap<String, String>,
    #[serde(skip)]
    pub output_path: PathBuf,
}

impl Stats {
    pub fn to_json(&self) -> serde_json::Result<serde_json::Value> {
        serde_json::to_value(self)
    }

    /// One line per written asset, for terminal output
    pub fn summary(&self) -> String {
        let mut out = format!(
            "{} module(s), {} chunk(s) -> {}\n",
            self.modules.len(),
            self.chunks.len(),
            self.output_path.display()
        );
        for (name, text) in &self.assets {
            out.push_str(&format!("  {name}  {} bytes\n", text.len()));
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_to_json_shape() {
        let stats = Stats {
            entries: [("main".to_string(), "./index.js".to_string())].into_iter().collect(),
            modules: vec![Module {
                id: "./index.js".to_string(),
                path: PathBuf::from("/project/index.js"),
                source: "1;".to_string(),
                dependencies: Default::default(),
                entries: vec!["main".to_string()],
            }],
            chunks: vec![Chunk {
                name: "main".to_string(),
                entry_module: "./index.js".to_string(),
                modules: vec!["./index.js".to_string()],
            }],
            files: vec!["main.js".to_string()],
            assets: [("main.js".to_string(), "bundle".to_string())].into_iter().collect(),
            output_path: PathBuf::from("/project/dist"),
        };

        assert_eq!(
            stats.to_json().unwrap(),
            json!({
                "entries": { "main": "./index.js" },
                "modules": [{
                    "id": "./index.js",
                    "source": "1;",
                    "dependencies": [],
                    "entries": ["main"]
                }],
                "chunks": [{
                    "name": "main",
                    "entryModule": "./index.js",
                    "modules": ["./index.js"]
                }],
                "files": ["main.js"],
                "assets": { "main.js": "bundle" }
            })
        );
        assert!(stats.summary().starts_with("1 module(s), 1 chunk(s) -> /project/dist\n"));
    }
}
