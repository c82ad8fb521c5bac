//! Knit driver library
//!
//! The bundling pipeline: configuration, resolution, loader selection,
//! the module graph walk, chunk assembly and bundle output. The `knit`
//! binary is a thin command-line layer over [`Compiler`].

pub mod chunk;
pub mod compilation;
pub mod compiler;
pub mod config;
pub mod emit;
pub mod error;
pub mod hooks;
pub mod loaders;
pub mod resolver;
pub mod rules;
pub mod stats;
pub mod transform;

pub use chunk::Chunk;
pub use compilation::{Compilation, Module};
pub use compiler::Compiler;
pub use config::{BuildOptions, Config, Entry};
pub use error::{BuildError, ConfigError, ResolveError};
pub use hooks::{Hooks, LogPlugin, Plugin, SyncHook};
pub use loaders::LoaderRegistry;
pub use resolver::Resolver;
pub use stats::Stats;
