//! Per-run loader context: the loader list, the moving index and the
//! request views derived from them.

use std::path::{Path, PathBuf};

use serde_json::{Map, Value};
use tokio::sync::oneshot;

use crate::{Completion, Content, LoaderError, LoaderObject};

/// State shared by every loader invocation of one pipeline run
pub struct LoaderContext {
    resource_path: PathBuf,
    root_context: PathBuf,
    pub(crate) loaders: Vec<LoaderObject>,
    pub(crate) loader_index: isize,
    pub(crate) pending: Option<oneshot::Receiver<Completion>>,
    /// Data slot handed out while no loader is active
    idle_data: Map<String, Value>,
}

impl LoaderContext {
    pub(crate) fn new(resource_path: PathBuf, root_context: PathBuf, loaders: Vec<LoaderObject>) -> Self {
        Self {
            resource_path,
            root_context,
            loaders,
            loader_index: 0,
            pending: None,
            idle_data: Map::new(),
        }
    }

    pub fn resource_path(&self) -> &Path {
        &self.resource_path
    }

    /// Directory the build resolves module ids against
    pub fn root_context(&self) -> &Path {
        &self.root_context
    }

    /// Position of the active loader; `-1` once the normal phase is done
    pub fn loader_index(&self) -> isize {
        self.loader_index
    }

    pub fn loaders(&self) -> &[LoaderObject] {
        &self.loaders
    }

    /// Every loader request followed by the resource, joined with `!`
    pub fn request(&self) -> String {
        self.join_with_resource(&self.loaders)
    }

    /// Loaders after the active one, then the resource
    pub fn remaining_request(&self) -> String {
        self.join_with_resource(self.loaders_from(self.loader_index + 1))
    }

    /// The active loader onwards, then the resource
    pub fn current_request(&self) -> String {
        self.join_with_resource(self.loaders_from(self.loader_index))
    }

    /// Loaders before the active one; no resource
    pub fn previous_request(&self) -> String {
        let end = self.clamp_index(self.loader_index);
        join_requests(&self.loaders[..end], None)
    }

    /// Data slot of the active loader, shared between its pitch and normal
    pub fn data(&self) -> &Map<String, Value> {
        match self.active_index() {
            Some(index) => &self.loaders[index].data,
            None => &self.idle_data,
        }
    }

    pub fn data_mut(&mut self) -> &mut Map<String, Value> {
        match self.active_index() {
            Some(index) => &mut self.loaders[index].data,
            None => &mut self.idle_data,
        }
    }

    /// Switches the active call to asynchronous completion.
    ///
    /// The runner ignores whatever the loader returns and waits for the
    /// handle instead. Calling this again replaces the earlier handle.
    pub fn async_callback(&mut self) -> CompletionHandle {
        let (sender, receiver) = oneshot::channel();
        self.pending = Some(receiver);
        CompletionHandle { sender }
    }

    pub(crate) fn active_index(&self) -> Option<usize> {
        usize::try_from(self.loader_index)
            .ok()
            .filter(|&index| index < self.loaders.len())
    }

    fn clamp_index(&self, index: isize) -> usize {
        // Clamped into 0..=len, so the cast is lossless
        index.clamp(0, self.loaders.len() as isize) as usize
    }

    fn loaders_from(&self, start: isize) -> &[LoaderObject] {
        &self.loaders[self.clamp_index(start)..]
    }

    fn join_with_resource(&self, loaders: &[LoaderObject]) -> String {
        let resource = self.resource_path.to_string_lossy();
        join_requests(loaders, Some(&*resource))
    }
}

fn join_requests(loaders: &[LoaderObject], resource: Option<&str>) -> String {
    loaders
        .iter()
        .map(LoaderObject::request)
        .chain(resource)
        .collect::<Vec<_>>()
        .join("!")
}

/// One-shot completion for an asynchronous loader call.
///
/// Consumed by `complete`; dropping it uncalled fails the run with
/// [`LoaderError::CallbackDropped`].
#[must_use = "the pipeline waits until this handle is completed"]
pub struct CompletionHandle {
    sender: oneshot::Sender<Completion>,
}

impl CompletionHandle {
    pub fn complete(self, result: Completion) {
        // A closed receiver means the run was already abandoned
        let _ = self.sender.send(result);
    }

    pub fn succeed(self, content: impl Into<Content>) {
        self.complete(Ok(vec![Some(content.into())]))
    }

    pub fn fail(self, error: LoaderError) {
        self.complete(Err(error))
    }
}
