//! The `Loader` trait and the per-run loader objects built from it

use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use serde_json::{Map, Value};

use crate::{Content, LoaderContext, LoaderError};

/// Values a loader settles with; `None` entries are "absent".
pub type Completion = Result<Vec<Option<Content>>, LoaderError>;

pub type DeferredCompletion = Pin<Box<dyn Future<Output = Completion>>>;

/// What a loader call hands back to the runner.
///
/// Callers that take a completion handle through
/// [`LoaderContext::async_callback`] can return anything here; the
/// handle's result replaces it.
pub enum Invocation {
    Immediate(Vec<Option<Content>>),
    Deferred(DeferredCompletion),
}

pub type LoaderResult = Result<Invocation, LoaderError>;

impl Invocation {
    /// No value. From a pitch this means "keep pitching".
    pub fn none() -> Self {
        Invocation::Immediate(Vec::new())
    }

    pub fn value(content: impl Into<Content>) -> Self {
        Invocation::Immediate(vec![Some(content.into())])
    }

    pub fn deferred<F>(future: F) -> Self
    where
        F: Future<Output = Completion> + 'static,
    {
        Invocation::Deferred(Box::pin(future))
    }
}

impl fmt::Debug for Invocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Invocation::Immediate(values) => f.debug_tuple("Immediate").field(values).finish(),
            Invocation::Deferred(_) => f.write_str("Deferred(..)"),
        }
    }
}

/// A content transform.
///
/// `normal` receives the values produced by the loader after it in the
/// chain (or the resource itself) and produces values for the loader
/// before it. `pitch` runs earlier, front to back; returning any value
/// from it skips the rest of the chain and the resource read.
pub trait Loader {
    fn normal(&self, ctx: &mut LoaderContext, args: Vec<Option<Content>>) -> LoaderResult {
        let _ = ctx;
        Ok(Invocation::Immediate(args))
    }

    fn pitch(&self, ctx: &mut LoaderContext, remaining_request: &str, previous_request: &str) -> LoaderResult {
        let _ = (ctx, remaining_request, previous_request);
        Ok(Invocation::none())
    }

    /// Whether `normal` wants its first argument as bytes
    fn raw(&self) -> bool {
        false
    }
}

/// One entry of a loader chain, with its state for a single run
pub struct LoaderObject {
    pub(crate) request: String,
    pub(crate) loader: Arc<dyn Loader>,
    pub(crate) data: Map<String, Value>,
    pub(crate) pitch_executed: bool,
    pub(crate) normal_executed: bool,
}

impl LoaderObject {
    pub fn new(request: impl Into<String>, loader: Arc<dyn Loader>) -> Self {
        Self {
            request: request.into(),
            loader,
            data: Map::new(),
            pitch_executed: false,
            normal_executed: false,
        }
    }

    pub fn request(&self) -> &str {
        &self.request
    }

    pub fn pitch_executed(&self) -> bool {
        self.pitch_executed
    }

    pub fn normal_executed(&self) -> bool {
        self.normal_executed
    }
}

impl fmt::Debug for LoaderObject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoaderObject")
            .field("request", &self.request)
            .field("raw", &self.loader.raw())
            .field("pitch_executed", &self.pitch_executed)
            .field("normal_executed", &self.normal_executed)
            .finish()
    }
}
