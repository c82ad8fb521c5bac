//! Pitch/normal driver.
//!
//! The run is a loop over [`Step`] values instead of mutually recursive
//! callbacks, so chain length never grows the call stack. Every loader
//! call, synchronous or not, is settled through [`LoaderRunner::settle`].

use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio::runtime::{Builder, Runtime};
use tracing::debug;

use crate::{Completion, Content, Invocation, LoaderContext, LoaderError, LoaderObject, LoaderResult, Phase};

/// Source of resource bytes
pub trait ResourceReader {
    fn read(&self, path: &Path) -> io::Result<Vec<u8>>;
}

/// Reads resources from the file system
#[derive(Debug, Default, Clone, Copy)]
pub struct FsReader;

impl ResourceReader for FsReader {
    fn read(&self, path: &Path) -> io::Result<Vec<u8>> {
        std::fs::read(path)
    }
}

pub struct RunOptions {
    /// Absolute path of the resource the chain transforms
    pub resource: PathBuf,
    /// Root directory of the build
    pub context: PathBuf,
    /// Chain in pitch order
    pub loaders: Vec<LoaderObject>,
}

#[derive(Debug)]
pub struct RunOutput {
    /// Values produced by the first loader's normal stage
    pub result: Vec<Option<Content>>,
    /// Raw resource bytes, if the resource was read at all
    pub resource_buffer: Option<Vec<u8>>,
}

impl RunOutput {
    pub fn into_content(self) -> Result<Content, LoaderError> {
        self.result
            .into_iter()
            .next()
            .flatten()
            .ok_or(LoaderError::NoResult)
    }
}

enum Step {
    Pitch,
    ReadResource,
    Normal(Vec<Option<Content>>),
}

/// Runs loader chains on a current-thread runtime that waits out
/// asynchronous loaders.
pub struct LoaderRunner<R = FsReader> {
    runtime: Runtime,
    reader: R,
}

impl LoaderRunner<FsReader> {
    pub fn new() -> Result<Self, LoaderError> {
        Self::with_reader(FsReader)
    }
}

impl<R: ResourceReader> LoaderRunner<R> {
    pub fn with_reader(reader: R) -> Result<Self, LoaderError> {
        let runtime = Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(LoaderError::Runtime)?;
        Ok(Self { runtime, reader })
    }

    pub fn run(&self, options: RunOptions) -> Result<RunOutput, LoaderError> {
        let RunOptions { resource, context, loaders } = options;
        let mut ctx = LoaderContext::new(resource, context, loaders);
        let mut resource_buffer = None;
        let mut step = Step::Pitch;

        loop {
            step = match step {
                Step::Pitch => self.pitch_step(&mut ctx)?,
                Step::ReadResource => {
                    let bytes = self.read_resource(ctx.resource_path())?;
                    resource_buffer = Some(bytes.clone());
                    ctx.loader_index = ctx.loaders.len() as isize - 1;
                    Step::Normal(vec![Some(Content::Binary(bytes))])
                }
                Step::Normal(args) => match ctx.active_index() {
                    Some(index) => self.normal_step(&mut ctx, index, args)?,
                    None => return Ok(RunOutput { result: args, resource_buffer }),
                },
            };
        }
    }

    fn pitch_step(&self, ctx: &mut LoaderContext) -> Result<Step, LoaderError> {
        let Some(index) = ctx.active_index() else {
            return Ok(Step::ReadResource);
        };

        let object = &mut ctx.loaders[index];
        if object.pitch_executed {
            ctx.loader_index += 1;
            return Ok(Step::Pitch);
        }
        object.pitch_executed = true;
        let loader = Arc::clone(&object.loader);
        let request = object.request.clone();

        let remaining = ctx.remaining_request();
        let previous = ctx.previous_request();
        debug!(loader = %request, index, "pitch");

        let result = loader.pitch(ctx, &remaining, &previous);
        let values = self
            .settle(ctx, result)
            .map_err(|source| in_loader(request.clone(), Phase::Pitch, source))?;

        if values.iter().any(Option::is_some) {
            debug!(loader = %request, "pitch returned a value, turning back");
            ctx.loader_index -= 1;
            Ok(Step::Normal(values))
        } else {
            ctx.loader_index += 1;
            Ok(Step::Pitch)
        }
    }

    fn normal_step(
        &self,
        ctx: &mut LoaderContext,
        index: usize,
        mut args: Vec<Option<Content>>,
    ) -> Result<Step, LoaderError> {
        let object = &mut ctx.loaders[index];
        if object.normal_executed {
            ctx.loader_index -= 1;
            return Ok(Step::Normal(args));
        }
        object.normal_executed = true;
        let loader = Arc::clone(&object.loader);
        let request = object.request.clone();

        let raw = loader.raw();
        if let Some(first) = args.first_mut() {
            *first = first.take().map(|content| content.coerce(raw));
        }
        debug!(loader = %request, index, raw, "normal");

        let result = loader.normal(ctx, args);
        let values = self
            .settle(ctx, result)
            .map_err(|source| in_loader(request, Phase::Normal, source))?;

        ctx.loader_index -= 1;
        Ok(Step::Normal(values))
    }

    /// Collapses the three calling conventions into one wait.
    ///
    /// A completion handle taken during the call wins over the returned
    /// value; a returned error wins over both.
    fn settle(&self, ctx: &mut LoaderContext, result: LoaderResult) -> Completion {
        let pending = ctx.pending.take();
        let invocation = match (result?, pending) {
            (_, Some(receiver)) => Invocation::deferred(async move {
                receiver
                    .await
                    .unwrap_or_else(|_| Err(LoaderError::CallbackDropped))
            }),
            (invocation, None) => invocation,
        };

        match invocation {
            Invocation::Immediate(values) => Ok(values),
            Invocation::Deferred(future) => self.runtime.block_on(future),
        }
    }

    fn read_resource(&self, path: &Path) -> Result<Vec<u8>, LoaderError> {
        debug!(resource = %path.display(), "reading resource");
        self.reader.read(path).map_err(|source| LoaderError::ResourceRead {
            path: path.to_path_buf(),
            source,
        })
    }
}

/// Runs one chain with a fresh runner reading from the file system
pub fn run_loaders(options: RunOptions) -> Result<RunOutput, LoaderError> {
    LoaderRunner::new()?.run(options)
}

fn in_loader(request: String, phase: Phase, source: LoaderError) -> LoaderError {
    LoaderError::Loader {
        request,
        phase,
        source: Box::new(source),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Loader;
    use std::cell::{Cell, RefCell};
    use std::rc::Rc;
    use std::time::Duration;

    type Log = Rc<RefCell<Vec<String>>>;

    struct MemoryReader {
        content: Option<&'static str>,
        reads: Rc<Cell<usize>>,
    }

    impl ResourceReader for MemoryReader {
        fn read(&self, path: &Path) -> io::Result<Vec<u8>> {
            self.reads.set(self.reads.get() + 1);
            match self.content {
                Some(content) => Ok(content.as_bytes().to_vec()),
                None => Err(io::Error::new(io::ErrorKind::NotFound, path.display().to_string())),
            }
        }
    }

    fn runner(content: Option<&'static str>) -> (LoaderRunner<MemoryReader>, Rc<Cell<usize>>) {
        let reads = Rc::new(Cell::new(0));
        let reader = MemoryReader { content, reads: Rc::clone(&reads) };
        (LoaderRunner::with_reader(reader).unwrap(), reads)
    }

    fn options(loaders: Vec<LoaderObject>) -> RunOptions {
        RunOptions {
            resource: PathBuf::from("/src/title.js"),
            context: PathBuf::from("/src"),
            loaders,
        }
    }

    /// Appends its name to the content and records every call
    struct Recording {
        name: &'static str,
        log: Log,
        pitch_value: Option<&'static str>,
    }

    impl Loader for Recording {
        fn pitch(&self, _ctx: &mut LoaderContext, _remaining: &str, _previous: &str) -> LoaderResult {
            self.log.borrow_mut().push(format!("pitch:{}", self.name));
            Ok(match self.pitch_value {
                Some(value) => Invocation::value(value),
                None => Invocation::none(),
            })
        }

        fn normal(&self, _ctx: &mut LoaderContext, args: Vec<Option<Content>>) -> LoaderResult {
            self.log.borrow_mut().push(format!("normal:{}", self.name));
            let text = args.into_iter().next().flatten().map(Content::into_text).unwrap_or_default();
            Ok(Invocation::value(format!("{}[{}]", text, self.name)))
        }
    }

    fn chain(names: &[&'static str], log: &Log, fuse_at: Option<&str>) -> Vec<LoaderObject> {
        names
            .iter()
            .map(|&name| {
                let loader = Recording {
                    name,
                    log: Rc::clone(log),
                    pitch_value: (fuse_at == Some(name)).then_some("fused"),
                };
                LoaderObject::new(name, Arc::new(loader))
            })
            .collect()
    }

    const ORDERED: [&str; 8] = ["O1", "O2", "I1", "I2", "N1", "N2", "P1", "P2"];

    #[test]
    fn test_pitch_ascends_then_normal_descends() {
        let log = Log::default();
        let (runner, reads) = runner(Some("src"));

        let output = runner.run(options(chain(&ORDERED, &log, None))).unwrap();

        let expected: Vec<String> = ORDERED
            .iter()
            .map(|name| format!("pitch:{}", name))
            .chain(ORDERED.iter().rev().map(|name| format!("normal:{}", name)))
            .collect();
        assert_eq!(*log.borrow(), expected);
        assert_eq!(reads.get(), 1);
        assert_eq!(output.resource_buffer.as_deref(), Some(&b"src"[..]));
        assert_eq!(
            output.into_content().unwrap(),
            Content::Text("src[P2][P1][N2][N1][I2][I1][O2][O1]".to_string())
        );
    }

    #[test]
    fn test_pitch_value_fuses_the_chain() {
        let log = Log::default();
        let (runner, reads) = runner(Some("src"));

        let output = runner.run(options(chain(&ORDERED, &log, Some("I2")))).unwrap();

        assert_eq!(
            *log.borrow(),
            vec![
                "pitch:O1", "pitch:O2", "pitch:I1", "pitch:I2",
                "normal:I1", "normal:O2", "normal:O1",
            ]
        );
        assert_eq!(reads.get(), 0);
        assert!(output.resource_buffer.is_none());
        assert_eq!(output.into_content().unwrap(), Content::Text("fused[I1][O2][O1]".to_string()));
    }

    #[test]
    fn test_fuse_at_first_loader_skips_every_normal() {
        let log = Log::default();
        let (runner, _) = runner(Some("src"));

        let output = runner.run(options(chain(&["A", "B"], &log, Some("A")))).unwrap();

        assert_eq!(*log.borrow(), vec!["pitch:A"]);
        assert_eq!(output.into_content().unwrap(), Content::Text("fused".to_string()));
    }

    #[test]
    fn test_empty_chain_returns_resource_bytes() {
        let (runner, reads) = runner(Some("plain"));
        let output = runner.run(options(Vec::new())).unwrap();

        assert_eq!(reads.get(), 1);
        assert_eq!(output.result, vec![Some(Content::Binary(b"plain".to_vec()))]);
    }

    struct Threaded;

    impl Loader for Threaded {
        fn normal(&self, ctx: &mut LoaderContext, _args: Vec<Option<Content>>) -> LoaderResult {
            let handle = ctx.async_callback();
            std::thread::spawn(move || {
                std::thread::sleep(Duration::from_millis(20));
                handle.succeed("from handle");
            });
            // Ignored: the handle decides the result
            Ok(Invocation::value("returned"))
        }
    }

    #[test]
    fn test_completion_handle_supplies_the_result() {
        let (runner, _) = runner(Some("src"));
        let loaders = vec![LoaderObject::new("threaded", Arc::new(Threaded))];

        let output = runner.run(options(loaders)).unwrap();
        assert_eq!(output.into_content().unwrap(), Content::Text("from handle".to_string()));
    }

    struct Deferred;

    impl Loader for Deferred {
        fn normal(&self, _ctx: &mut LoaderContext, args: Vec<Option<Content>>) -> LoaderResult {
            let text = args.into_iter().next().flatten().map(Content::into_text).unwrap_or_default();
            Ok(Invocation::deferred(async move {
                tokio::time::sleep(Duration::from_millis(5)).await;
                Ok(vec![Some(Content::Text(text.to_uppercase()))])
            }))
        }
    }

    #[test]
    fn test_deferred_result_is_awaited() {
        let (runner, _) = runner(Some("abc"));
        let loaders = vec![LoaderObject::new("deferred", Arc::new(Deferred))];

        let output = runner.run(options(loaders)).unwrap();
        assert_eq!(output.into_content().unwrap(), Content::Text("ABC".to_string()));
    }

    struct Forgetful;

    impl Loader for Forgetful {
        fn normal(&self, ctx: &mut LoaderContext, _args: Vec<Option<Content>>) -> LoaderResult {
            let _handle = ctx.async_callback();
            Ok(Invocation::none())
        }
    }

    #[test]
    fn test_dropped_handle_fails_the_run() {
        let (runner, _) = runner(Some("src"));
        let loaders = vec![LoaderObject::new("forgetful", Arc::new(Forgetful))];

        let err = runner.run(options(loaders)).unwrap_err();
        assert!(matches!(err.root_cause(), LoaderError::CallbackDropped));
    }

    struct Failing {
        via_handle: bool,
    }

    impl Loader for Failing {
        fn normal(&self, ctx: &mut LoaderContext, _args: Vec<Option<Content>>) -> LoaderResult {
            if self.via_handle {
                ctx.async_callback().fail(LoaderError::msg("handle says no"));
                return Ok(Invocation::none());
            }
            Err(LoaderError::msg("boom"))
        }
    }

    #[test]
    fn test_loader_error_aborts_remaining_stages() {
        let log = Log::default();
        let (runner, _) = runner(Some("src"));
        let mut loaders = chain(&["first"], &log, None);
        loaders.push(LoaderObject::new("fail-loader", Arc::new(Failing { via_handle: false })));

        let err = runner.run(options(loaders)).unwrap_err();

        assert_eq!(err.to_string(), "normal phase of fail-loader failed: boom");
        assert_eq!(*log.borrow(), vec!["pitch:first"]);
    }

    #[test]
    fn test_error_through_completion_handle() {
        let (runner, _) = runner(Some("src"));
        let loaders = vec![LoaderObject::new("fail-loader", Arc::new(Failing { via_handle: true }))];

        let err = runner.run(options(loaders)).unwrap_err();
        assert_eq!(err.root_cause().to_string(), "handle says no");
    }

    #[test]
    fn test_unreadable_resource_fails_before_normal_phase() {
        let log = Log::default();
        let (runner, _) = runner(None);

        let err = runner.run(options(chain(&["A"], &log, None))).unwrap_err();

        assert!(matches!(err, LoaderError::ResourceRead { .. }));
        assert_eq!(*log.borrow(), vec!["pitch:A"]);
    }

    struct KindRecorder {
        raw: bool,
        seen: Rc<RefCell<Vec<(bool, bool)>>>,
    }

    impl Loader for KindRecorder {
        fn normal(&self, _ctx: &mut LoaderContext, args: Vec<Option<Content>>) -> LoaderResult {
            let is_binary = args.first().and_then(Option::as_ref).map_or(false, Content::is_binary);
            self.seen.borrow_mut().push((self.raw, is_binary));
            // Always hand text onwards
            let text = args.into_iter().next().flatten().map(Content::into_text).unwrap_or_default();
            Ok(Invocation::value(text))
        }

        fn raw(&self) -> bool {
            self.raw
        }
    }

    #[test]
    fn test_first_argument_follows_raw_flag() {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let loader = |raw| LoaderObject::new(
            if raw { "raw" } else { "text" },
            Arc::new(KindRecorder { raw, seen: Rc::clone(&seen) }),
        );
        let (runner, _) = runner(Some("bytes"));

        // Normal order: text, raw, text
        runner.run(options(vec![loader(false), loader(true), loader(false)])).unwrap();

        assert_eq!(*seen.borrow(), vec![(false, false), (true, true), (false, false)]);
    }

    struct ViewRecorder {
        seen: Rc<RefCell<Vec<String>>>,
    }

    impl Loader for ViewRecorder {
        fn pitch(&self, ctx: &mut LoaderContext, remaining: &str, previous: &str) -> LoaderResult {
            assert_eq!(remaining, ctx.remaining_request());
            assert_eq!(previous, ctx.previous_request());
            let mut seen = self.seen.borrow_mut();
            seen.push(ctx.request());
            seen.push(ctx.remaining_request());
            seen.push(ctx.current_request());
            seen.push(ctx.previous_request());
            ctx.data_mut().insert("pitched".into(), serde_json::Value::Bool(true));
            Ok(Invocation::none())
        }

        fn normal(&self, ctx: &mut LoaderContext, args: Vec<Option<Content>>) -> LoaderResult {
            let pitched = ctx.data().get("pitched").cloned().unwrap_or_default();
            self.seen.borrow_mut().push(format!("data:{}", pitched));
            Ok(Invocation::Immediate(args))
        }
    }

    #[test]
    fn test_request_views_track_the_index() {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let loaders = vec![
            LoaderObject::new("a", Arc::new(crate::tests::PassThrough)),
            LoaderObject::new("b", Arc::new(ViewRecorder { seen: Rc::clone(&seen) })),
            LoaderObject::new("c", Arc::new(crate::tests::PassThrough)),
        ];
        let (runner, _) = runner(Some("src"));

        runner.run(options(loaders)).unwrap();

        assert_eq!(
            *seen.borrow(),
            vec![
                "a!b!c!/src/title.js",
                "c!/src/title.js",
                "b!c!/src/title.js",
                "a",
                "data:true",
            ]
        );
    }

    #[test]
    fn test_long_chain_runs_iteratively() {
        let loaders = (0..3_000)
            .map(|i| LoaderObject::new(format!("pass-{}", i), Arc::new(crate::tests::PassThrough)))
            .collect();
        let (runner, _) = runner(Some("deep"));

        let output = runner.run(options(loaders)).unwrap();
        assert_eq!(output.into_content().unwrap(), Content::Text("deep".to_string()));
    }

    #[test]
    fn test_missing_result_is_an_error() {
        let output = RunOutput { result: vec![None], resource_buffer: None };
        assert!(matches!(output.into_content(), Err(LoaderError::NoResult)));
    }
}
