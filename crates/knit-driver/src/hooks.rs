//! Lifecycle hooks and plugins

use std::fmt;

use tracing::info;

use crate::compiler::Compiler;
use crate::error::ConfigError;

type Listener = Box<dyn FnMut()>;

/// Named listeners called in registration order
#[derive(Default)]
pub struct SyncHook {
    taps: Vec<(String, Listener)>,
}

impl SyncHook {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn tap(&mut self, name: impl Into<String>, listener: impl FnMut() + 'static) {
        self.taps.push((name.into(), Box::new(listener)));
    }

    pub fn call(&mut self) {
        for (_, listener) in &mut self.taps {
            listener();
        }
    }

    pub fn tap_names(&self) -> impl Iterator<Item = &str> {
        self.taps.iter().map(|(name, _)| name.as_str())
    }

    pub fn len(&self) -> usize {
        self.taps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.taps.is_empty()
    }
}

impl fmt::Debug for SyncHook {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.tap_names()).finish()
    }
}

/// Build lifecycle: `run` before building, `emit` before writing
/// assets, `done` after writing them
#[derive(Debug, Default)]
pub struct Hooks {
    pub run: SyncHook,
    pub emit: SyncHook,
    pub done: SyncHook,
}

pub trait Plugin {
    fn apply(&self, compiler: &mut Compiler);
}

/// Logs each lifecycle boundary
pub struct LogPlugin;

impl Plugin for LogPlugin {
    fn apply(&self, compiler: &mut Compiler) {
        compiler.hooks.run.tap("LogPlugin", || info!("build starting"));
        compiler.hooks.emit.tap("LogPlugin", || info!("writing assets"));
        compiler.hooks.done.tap("LogPlugin", || info!("build finished"));
    }
}

/// Plugin registered under `name` in configuration files
pub fn builtin_plugin(name: &str) -> Result<Box<dyn Plugin>, ConfigError> {
    match name {
        "log" => Ok(Box::new(LogPlugin)),
        other => Err(ConfigError::UnknownPlugin(other.to_string())),
    }
}
