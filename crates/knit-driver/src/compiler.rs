//! The compiler: configuration, loaders and hooks shared by every run

use std::sync::Arc;

use knit_loader::{Loader, LoaderRunner, RunOptions, RunOutput};
use tracing::info;

use crate::compilation::Compilation;
use crate::config::{BuildOptions, Config};
use crate::emit::{render_assets, write_assets};
use crate::error::{BuildError, ConfigError};
use crate::hooks::{builtin_plugin, Hooks, Plugin};
use crate::loaders::LoaderRegistry;
use crate::resolver::{module_id, Resolver};
use crate::rules::{InlineRequest, RuleSet};
use crate::stats::Stats;

pub struct Compiler {
    options: BuildOptions,
    rules: RuleSet,
    loaders: LoaderRegistry,
    runner: LoaderRunner,
    pub hooks: Hooks,
}

impl Compiler {
    /// Validate `config`, compile its rules and apply its plugins
    pub fn new(config: Config) -> Result<Self, BuildError> {
        let options = BuildOptions::from_config(&config)?;
        let rules = RuleSet::compile(&config.module.rules)?;
        let runner = LoaderRunner::new().map_err(BuildError::Runtime)?;

        let mut compiler = Self {
            options,
            rules,
            loaders: LoaderRegistry::with_builtins(),
            runner,
            hooks: Hooks::default(),
        };
        for name in &config.plugins {
            let plugin = builtin_plugin(name)?;
            compiler.apply_plugin(plugin.as_ref());
        }
        Ok(compiler)
    }

    pub fn options(&self) -> &BuildOptions {
        &self.options
    }

    pub fn register_loader(&mut self, name: impl Into<String>, loader: Arc<dyn Loader>) {
        self.loaders.register(name, loader);
    }

    pub fn apply_plugin(&mut self, plugin: &dyn Plugin) {
        plugin.apply(self);
    }

    /// Build every entry and write one asset per chunk.
    ///
    /// Nothing is written when any module fails to build.
    pub fn run(&mut self) -> Result<Stats, BuildError> {
        if self.options.entries.is_empty() {
            return Err(ConfigError::NoEntries.into());
        }
        self.hooks.run.call();
        info!(root = %self.options.root.display(), entries = self.options.entries.len(), "build started");

        let mut compilation = Compilation::new(&self.options, &self.rules, &self.loaders, &self.runner);
        for (name, request) in &self.options.entries {
            compilation.add_entry(name, request)?;
        }
        let chunks = compilation.chunks();
        let (entries, modules) = compilation.into_parts();
        let assets = render_assets(&chunks, &modules, &self.options.filename)?;

        self.hooks.emit.call();
        write_assets(&self.options.output_path, &assets)?;
        self.hooks.done.call();

        info!(
            modules = modules.len(),
            assets = assets.len(),
            output = %self.options.output_path.display(),
            "build finished"
        );
        Ok(Stats {
            entries,
            modules: modules.into_values().collect(),
            chunks,
            files: assets.keys().cloned().collect(),
            assets,
            output_path: self.options.output_path.clone(),
        })
    }

    /// Run the loader chain configured for `request` from the root, without
    /// building a graph
    pub fn run_loaders(&self, request: &str) -> Result<RunOutput, BuildError> {
        let inline = InlineRequest::parse(request);
        let resolver = Resolver::new(self.options.extensions.clone());
        let path = resolver.resolve(&inline.resource, &self.options.root)?;
        let id = module_id(&self.options.root, &path);

        let names = self.rules.loaders_for(&inline, &path);
        let loaders = self
            .loaders
            .chain(&names)
            .map_err(|source| BuildError::from_loader(&id, source))?;
        self.runner
            .run(RunOptions {
                resource: path,
                context: self.options.root.clone(),
                loaders,
            })
            .map_err(|source| BuildError::from_loader(&id, source))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Entry;
    use std::cell::RefCell;
    use std::fs;
    use std::path::Path;
    use std::rc::Rc;

    fn config(dir: &Path, entry: &str) -> Config {
        Config {
            context: Some(dir.to_path_buf()),
            entry: Entry::Single(entry.to_string()),
            ..Config::default()
        }
    }

    #[test]
    fn test_hooks_fire_in_order() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("index.js"), "console.log(1);").unwrap();

        let events = Rc::new(RefCell::new(Vec::new()));
        let mut compiler = Compiler::new(config(dir.path(), "./index.js")).unwrap();
        for (hook, name) in [
            (&mut compiler.hooks.done, "done"),
            (&mut compiler.hooks.emit, "emit"),
            (&mut compiler.hooks.run, "run"),
        ] {
            let events = Rc::clone(&events);
            hook.tap("Recorder", move || events.borrow_mut().push(name));
        }

        compiler.run().unwrap();
        assert_eq!(*events.borrow(), vec!["run", "emit", "done"]);
        assert!(dir.path().join("dist/main.js").is_file());
    }

    #[test]
    fn test_emit_not_fired_on_failure() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("index.js"), "require('./missing');").unwrap();

        let events = Rc::new(RefCell::new(Vec::new()));
        let mut compiler = Compiler::new(config(dir.path(), "./index.js")).unwrap();
        let recorded = Rc::clone(&events);
        compiler.hooks.emit.tap("Recorder", move || recorded.borrow_mut().push("emit"));

        assert!(matches!(compiler.run(), Err(BuildError::Resolution(_))));
        assert!(events.borrow().is_empty());
        assert!(!dir.path().join("dist").exists());
    }

    #[test]
    fn test_entry_name_cannot_escape_output() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("app")).unwrap();
        fs::write(dir.path().join("app/index.js"), "console.log(1);").unwrap();

        let mut config = config(&dir.path().join("app"), "./index.js");
        config.entry = Entry::Named(
            [("../escape".to_string(), "./index.js".to_string())].into_iter().collect(),
        );
        let mut compiler = Compiler::new(config).unwrap();

        assert!(matches!(
            compiler.run(),
            Err(BuildError::Config(ConfigError::UnsafeFilename { chunk, .. })) if chunk == "../escape"
        ));
        assert!(!dir.path().join("app/escape.js").exists());
    }

    #[test]
    fn test_no_entries() {
        let dir = tempfile::tempdir().unwrap();
        let mut compiler = Compiler::new(Config {
            context: Some(dir.path().to_path_buf()),
            ..Config::default()
        })
        .unwrap();
        assert!(matches!(compiler.run(), Err(BuildError::Config(ConfigError::NoEntries))));
    }

    #[test]
    fn test_unknown_plugin() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = config(dir.path(), "./index.js");
        config.plugins = vec!["log".to_string(), "nope".to_string()];
        assert!(matches!(
            Compiler::new(config),
            Err(BuildError::Config(ConfigError::UnknownPlugin(name))) if name == "nope"
        ));
    }

    #[test]
    fn test_run_loaders_uses_rules() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("data.json"), "[1, 2]").unwrap();
        let mut config = config(dir.path(), "./index.js");
        config.module.rules = vec![crate::config::RuleConfig {
            test: "\\.json$".to_string(),
            loader: Some("json-loader".to_string()),
            uses: None,
            enforce: None,
        }];

        let compiler = Compiler::new(config).unwrap();
        let output = compiler.run_loaders("./data").unwrap();
        assert_eq!(output.resource_buffer.as_deref(), Some(&b"[1, 2]"[..]));
        assert_eq!(output.into_content().unwrap().into_text(), "module.exports = [1,2];\n");
    }
}
