//! One build session: the module graph walk and its registry

use std::collections::HashSet;
use std::path::PathBuf;

use indexmap::{IndexMap, IndexSet};
use knit_loader::{LoaderRunner, RunOptions};
use serde::Serialize;
use tracing::{debug, info};

use crate::chunk::{assemble_chunks, Chunk};
use crate::config::BuildOptions;
use crate::error::BuildError;
use crate::loaders::LoaderRegistry;
use crate::resolver::{module_id, Resolver};
use crate::rules::{InlineRequest, RuleSet};
use crate::transform::{transform_module, Dependency};

/// A built module. One exists per resolved path and build.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Module {
    pub id: String,
    #[serde(skip)]
    pub path: PathBuf,
    /// Loader output with requires rewritten
    pub source: String,
    pub dependencies: IndexSet<String>,
    /// Names of the entries that reach this module, in discovery order
    pub entries: Vec<String>,
}

struct Frame {
    module: Module,
    pending: std::vec::IntoIter<Dependency>,
}

/// Entries, module registry and chunks of a single `run`
pub struct Compilation<'a> {
    options: &'a BuildOptions,
    rules: &'a RuleSet,
    loaders: &'a LoaderRegistry,
    runner: &'a LoaderRunner,
    resolver: Resolver,
    entries: IndexMap<String, String>,
    modules: IndexMap<String, Module>,
}

impl<'a> Compilation<'a> {
    pub(crate) fn new(
        options: &'a BuildOptions,
        rules: &'a RuleSet,
        loaders: &'a LoaderRegistry,
        runner: &'a LoaderRunner,
    ) -> Self {
        Self {
            resolver: Resolver::new(options.extensions.clone()),
            options,
            rules,
            loaders,
            runner,
            entries: IndexMap::new(),
            modules: IndexMap::new(),
        }
    }

    /// Entry name to entry module id
    pub fn entries(&self) -> &IndexMap<String, String> {
        &self.entries
    }

    /// Module registry in insertion order: every module follows the
    /// modules it requires, except along cycles
    pub fn modules(&self) -> &IndexMap<String, Module> {
        &self.modules
    }

    pub fn chunks(&self) -> Vec<Chunk> {
        assemble_chunks(&self.entries, &self.modules)
    }

    /// Resolve the entry `request` from the root and build its graph
    pub fn add_entry(&mut self, name: &str, request: &str) -> Result<(), BuildError> {
        let root = &self.options.root;
        let inline = InlineRequest::parse(request);
        let path = self.resolver.resolve(&inline.resource, root)?;
        let id = module_id(root, &path);
        info!(entry = name, module = %id, "building entry");

        self.entries.insert(name.to_string(), id.clone());
        self.build_graph(
            name,
            Dependency {
                request: request.to_string(),
                path,
                id,
            },
        )
    }

    /// Depth-first walk from `start`. Modules are transformed when first
    /// reached and registered once all their dependencies are.
    fn build_graph(&mut self, entry: &str, start: Dependency) -> Result<(), BuildError> {
        if self.modules.contains_key(&start.id) {
            self.claim(entry, &start.id);
            return Ok(());
        }

        let mut in_progress = HashSet::new();
        in_progress.insert(start.id.clone());
        let mut stack = vec![self.open(entry, &start)?];

        while let Some(frame) = stack.last_mut() {
            match frame.pending.next() {
                Some(dep) => {
                    if self.modules.contains_key(&dep.id) {
                        self.claim(entry, &dep.id);
                    } else if in_progress.contains(&dep.id) {
                        debug!(module = %dep.id, "cyclic require of a module still being built");
                    } else {
                        in_progress.insert(dep.id.clone());
                        let frame = self.open(entry, &dep)?;
                        stack.push(frame);
                    }
                }
                None => {
                    if let Some(Frame { module, .. }) = stack.pop() {
                        in_progress.remove(&module.id);
                        debug!(module = %module.id, dependencies = module.dependencies.len(), "module built");
                        self.modules.insert(module.id.clone(), module);
                    }
                }
            }
        }
        Ok(())
    }

    /// Run loaders and the require transform for one module
    fn open(&self, entry: &str, dep: &Dependency) -> Result<Frame, BuildError> {
        let root = &self.options.root;
        let inline = InlineRequest::parse(&dep.request);
        let names = self.rules.loaders_for(&inline, &dep.path);
        debug!(module = %dep.id, loaders = ?names, "building module");

        let loaders = self
            .loaders
            .chain(&names)
            .map_err(|source| BuildError::from_loader(&dep.id, source))?;
        let content = self
            .runner
            .run(RunOptions {
                resource: dep.path.clone(),
                context: root.clone(),
                loaders,
            })
            .and_then(|output| output.into_content())
            .map_err(|source| BuildError::from_loader(&dep.id, source))?;

        let transformed = transform_module(&content.into_text(), &dep.path, &self.resolver, root)?;
        let module = Module {
            id: dep.id.clone(),
            path: dep.path.clone(),
            source: transformed.source,
            dependencies: transformed.dependencies.iter().map(|d| d.id.clone()).collect(),
            entries: vec![entry.to_string()],
        };

        Ok(Frame {
            module,
            pending: transformed.dependencies.into_iter(),
        })
    }

    /// Add `entry` as an owner of the registered module `id` and of
    /// everything it requires.
    fn claim(&mut self, entry: &str, id: &str) {
        let mut queue = vec![id.to_string()];
        while let Some(id) = queue.pop() {
            // Modules still on the build stack already belong to `entry`
            let Some(module) = self.modules.get_mut(&id) else {
                continue;
            };
            if module.entries.iter().any(|owner| owner == entry) {
                continue;
            }
            module.entries.push(entry.to_string());
            queue.extend(module.dependencies.iter().cloned());
        }
    }

    pub(crate) fn into_parts(self) -> (IndexMap<String, String>, IndexMap<String, Module>) {
        (self.entries, self.modules)
    }
}
