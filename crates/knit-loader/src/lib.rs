//! # Knit Loader
//!
//! Runs a resource through a chain of loaders. Pitch stages run front to
//! back and may short-circuit the chain; normal stages run back to front
//! over the resource content or the short-circuit value.
//!
//! Loaders may answer synchronously, through a [`CompletionHandle`], or
//! with a deferred future; the runner treats all three the same way.

mod content;
mod context;
mod error;
mod loader;
mod runner;

pub use content::Content;
pub use context::{CompletionHandle, LoaderContext};
pub use error::{LoaderError, Phase};
pub use loader::{Completion, DeferredCompletion, Invocation, Loader, LoaderObject, LoaderResult};
pub use runner::{run_loaders, FsReader, LoaderRunner, ResourceReader, RunOptions, RunOutput};

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::sync::Arc;

    /// Loader with every stage left at its default
    pub struct PassThrough;

    impl Loader for PassThrough {}

    #[test]
    fn test_run_loaders_reads_from_disk() {
        let mut file = std::env::temp_dir();
        file.push(format!("knit-loader-{}.txt", std::process::id()));
        std::fs::File::create(&file)
            .and_then(|mut f| f.write_all(b"on disk"))
            .unwrap();

        let output = run_loaders(RunOptions {
            resource: file.clone(),
            context: std::env::temp_dir(),
            loaders: vec![LoaderObject::new("pass", Arc::new(PassThrough))],
        })
        .unwrap();
        std::fs::remove_file(&file).unwrap();

        assert_eq!(output.resource_buffer.as_deref(), Some(&b"on disk"[..]));
        assert_eq!(output.into_content().unwrap(), Content::Text("on disk".to_string()));
    }

    #[test]
    fn test_new_loader_object_is_fresh() {
        let object = LoaderObject::new("pass", Arc::new(PassThrough));
        assert!(!object.pitch_executed());
        assert!(!object.normal_executed());
        assert_eq!(object.request(), "pass");
    }
}
