//! Fan-out of log events to the registered sinks

use super::{
    error::{LoggerError, Result},
    log_level::LogLevel,
    log_record::LogRecord,
    metrics::DispatchMetrics,
    reporter::ReportTarget,
    trace::ErrorTrace,
    LogConfig,
};
use crate::render::{RenderCapability, Renderable, Rule, TextRenderer};
use crate::sinks::{CallbackSink, ConsoleSink, Event, RotatingFileSink, Sink, SinkKind};
use arc_swap::ArcSwap;
use parking_lot::{Mutex, RwLock};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

/// Default timeout used by [`SinkDispatcher::shutdown`] callers that have no
/// better value
pub const DEFAULT_SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(5);

/// How often one event may follow a sink that keeps being replaced
const MAX_REDELIVERIES: usize = 8;

type SinkSlot = Arc<Mutex<Sink>>;

#[derive(Clone)]
struct Registry {
    console: SinkSlot,
    file: Option<SinkSlot>,
    callback: Option<SinkSlot>,
}

impl Registry {
    fn slot(&self, kind: SinkKind) -> Option<&SinkSlot> {
        match kind {
            SinkKind::Console => Some(&self.console),
            SinkKind::RotatingFile => self.file.as_ref(),
            SinkKind::Callback => self.callback.as_ref(),
        }
    }

    /// Registered slots in delivery order: console, file, callback
    fn slots(&self) -> impl Iterator<Item = (SinkKind, &SinkSlot)> {
        SinkKind::ALL
            .into_iter()
            .filter_map(move |kind| self.slot(kind).map(|slot| (kind, slot)))
    }

    /// Install `slot` for its kind and hand back the one it replaces
    fn replace(&mut self, kind: SinkKind, slot: Option<SinkSlot>) -> Option<SinkSlot> {
        match kind {
            SinkKind::Console => slot.map(|slot| std::mem::replace(&mut self.console, slot)),
            SinkKind::RotatingFile => std::mem::replace(&mut self.file, slot),
            SinkKind::Callback => std::mem::replace(&mut self.callback, slot),
        }
    }
}

struct DispatcherInner {
    registry: ArcSwap<Registry>,
    renderer: Arc<dyn RenderCapability>,
    min_level: RwLock<LogLevel>,
    metrics: DispatchMetrics,
    /// Serializes registry writers; readers never take it
    update_lock: Mutex<()>,
}

fn panic_message(panic_info: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = panic_info.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = panic_info.downcast_ref::<String>() {
        s.clone()
    } else {
        "Unknown panic".to_string()
    }
}

impl DispatcherInner {
    /// Per-sink panic isolation: one sink panicking must not keep the event
    /// from the others
    fn emit_isolated(&self, kind: SinkKind, slot: &SinkSlot, event: &Event) -> Result<()> {
        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            slot.lock().emit(event, self.renderer.as_ref())
        }));

        match result {
            Ok(result) => result,
            Err(panic_info) => Err(LoggerError::sink_panicked(
                kind.as_str(),
                panic_message(panic_info.as_ref()),
            )),
        }
    }

    fn dispatch(&self, event: &Event) {
        let snapshot = self.registry.load_full();
        for (kind, slot) in snapshot.slots() {
            self.deliver(kind, slot, event);
        }
    }

    fn deliver(&self, kind: SinkKind, slot: &SinkSlot, event: &Event) {
        let mut slot = Arc::clone(slot);
        for _ in 0..MAX_REDELIVERIES {
            match self.emit_isolated(kind, &slot, event) {
                Ok(()) => {
                    self.metrics.record_delivered();
                    return;
                }
                Err(e) if e.is_closed_sink() => {
                    // The sink was swapped out after our snapshot was taken;
                    // hand the event to whatever is registered for the kind now
                    let current = self.registry.load();
                    match current.slot(kind) {
                        Some(next) if !Arc::ptr_eq(next, &slot) => {
                            self.metrics.record_rerouted();
                            slot = Arc::clone(next);
                        }
                        _ => return,
                    }
                }
                Err(e) => {
                    self.metrics.record_failed();
                    self.report(kind, &e);
                    return;
                }
            }
        }
        eprintln!(
            "[WARN] {} sink was replaced {} times while delivering one event",
            kind, MAX_REDELIVERIES
        );
    }
}

impl ReportTarget for DispatcherInner {
    /// Show an internal error as an error record in every sink except the
    /// one it came from
    fn report(&self, origin: SinkKind, error: &LoggerError) {
        let event = Event::Record(LogRecord::new(
            LogLevel::Error,
            format!("[{}] {}", origin, error),
        ));

        let snapshot = self.registry.load_full();
        let mut shown = false;
        for (kind, slot) in snapshot.slots() {
            if kind == origin {
                continue;
            }
            match self.emit_isolated(kind, slot, &event) {
                Ok(()) => shown = true,
                Err(e) => eprintln!("[LOGGER ERROR] {} sink failed while reporting an error: {}", kind, e),
            }
        }

        if !shown {
            eprintln!("[LOGGER ERROR] {}", error);
        }
    }
}

/// Multi-sink log dispatcher
///
/// Holds a console sink, at most one rotating file sink and at most one
/// callback sink. Every event is rendered by each sink on its own: styled
/// for the console and the callback, as plain timestamped lines for the
/// file. Clones share the same sinks.
///
/// # Example
///
/// ```
/// use rust_rotating_logger::prelude::*;
///
/// let dir = tempfile::tempdir().unwrap();
/// let logger = SinkDispatcher::builder()
///     .console(ConsoleSink::with_colors(false).with_writer(std::io::sink()))
///     .build();
///
/// logger
///     .set_file_sink(dir.path().join("app.txt"), &LogConfig::default())
///     .unwrap();
/// logger.header("Start", 0);
/// logger.info("ready");
/// logger.flush().unwrap();
///
/// let text = std::fs::read_to_string(dir.path().join("app.txt")).unwrap();
/// assert!(text.contains("START"));
/// assert!(text.contains("| INFO | ready"));
/// ```
#[derive(Clone)]
pub struct SinkDispatcher {
    inner: Arc<DispatcherInner>,
}

impl SinkDispatcher {
    /// Dispatcher with a colored stdout console and the default renderer
    #[must_use]
    pub fn new() -> Self {
        Self::with_parts(ConsoleSink::new(), Arc::new(TextRenderer::new()), LogLevel::Info)
    }

    #[must_use]
    pub fn builder() -> DispatcherBuilder {
        DispatcherBuilder::new()
    }

    fn with_parts(console: ConsoleSink, renderer: Arc<dyn RenderCapability>, min_level: LogLevel) -> Self {
        let registry = Registry {
            console: Arc::new(Mutex::new(Sink::Console(console))),
            file: None,
            callback: None,
        };

        Self {
            inner: Arc::new(DispatcherInner {
                registry: ArcSwap::from_pointee(registry),
                renderer,
                min_level: RwLock::new(min_level),
                metrics: DispatchMetrics::new(),
                update_lock: Mutex::new(()),
            }),
        }
    }

    /// Install `sink`, replacing the sink of the same kind.
    ///
    /// The replaced sink is closed only after the new registry is visible, so
    /// an emit racing with the swap reaches one of the two.
    pub fn register(&self, sink: impl Into<Sink>) {
        let sink = sink.into();
        let kind = sink.kind();

        if let Some(reporter) = sink.reporter() {
            let target: Arc<dyn ReportTarget> = self.inner.clone();
            reporter.connect(Arc::downgrade(&target), kind);
        }

        let replaced = self.swap(kind, Some(Arc::new(Mutex::new(sink))));
        if let Some(old) = replaced {
            Self::close_slot(kind, &old);
        }
    }

    /// Remove the file or callback sink. The console can only be replaced,
    /// so unregistering it returns `false`, as does a kind with no sink.
    pub fn unregister(&self, kind: SinkKind) -> bool {
        if kind == SinkKind::Console {
            return false;
        }
        match self.swap(kind, None) {
            Some(old) => {
                Self::close_slot(kind, &old);
                true
            }
            None => false,
        }
    }

    fn swap(&self, kind: SinkKind, slot: Option<SinkSlot>) -> Option<SinkSlot> {
        let _guard = self.inner.update_lock.lock();
        let mut next = Registry::clone(&self.inner.registry.load());
        let replaced = next.replace(kind, slot);
        self.inner.registry.store(Arc::new(next));
        replaced
    }

    fn close_slot(kind: SinkKind, slot: &SinkSlot) {
        let mut sink = slot.lock();
        if let Some(reporter) = sink.reporter() {
            reporter.disconnect();
        }
        if let Err(e) = sink.close() {
            eprintln!("[LOGGER ERROR] Failed to close replaced {} sink: {}", kind, e);
        }
    }

    pub fn registered_kinds(&self) -> Vec<SinkKind> {
        self.inner
            .registry
            .load()
            .slots()
            .map(|(kind, _)| kind)
            .collect()
    }

    pub fn set_min_level(&self, level: LogLevel) {
        *self.inner.min_level.write() = level;
    }

    pub fn min_level(&self) -> LogLevel {
        *self.inner.min_level.read()
    }

    #[inline]
    pub fn is_enabled(&self, level: LogLevel) -> bool {
        level >= self.min_level()
    }

    /// Deliver a record to every sink, unless it is below the minimum level
    pub fn emit(&self, record: LogRecord) {
        if !self.is_enabled(record.level) {
            self.inner.metrics.record_filtered();
            return;
        }
        self.inner.metrics.record_emitted();
        self.inner.dispatch(&Event::Record(record));
    }

    pub fn log(&self, level: LogLevel, message: impl AsRef<str>) {
        if !self.is_enabled(level) {
            self.inner.metrics.record_filtered();
            return;
        }
        self.emit(LogRecord::new(level, message));
    }

    #[inline]
    pub fn trace(&self, message: impl AsRef<str>) {
        self.log(LogLevel::Trace, message);
    }

    #[inline]
    pub fn debug(&self, message: impl AsRef<str>) {
        self.log(LogLevel::Debug, message);
    }

    #[inline]
    pub fn info(&self, message: impl AsRef<str>) {
        self.log(LogLevel::Info, message);
    }

    #[inline]
    pub fn warn(&self, message: impl AsRef<str>) {
        self.log(LogLevel::Warn, message);
    }

    #[inline]
    pub fn error(&self, message: impl AsRef<str>) {
        self.log(LogLevel::Error, message);
    }

    #[inline]
    pub fn fatal(&self, message: impl AsRef<str>) {
        self.log(LogLevel::Fatal, message);
    }

    /// Log `Kind: message` at error level with the error's trace attached
    pub fn exception<E: std::error::Error + ?Sized>(&self, error: &E) {
        if !self.is_enabled(LogLevel::Error) {
            self.inner.metrics.record_filtered();
            return;
        }
        let trace = ErrorTrace::capture(error);
        self.emit(LogRecord::new(LogLevel::Error, trace.headline()).with_trace(trace));
    }

    /// Send an arbitrary renderable to every sink; not subject to the level filter
    pub fn print(&self, renderable: impl Into<Renderable>) {
        self.inner.metrics.record_emitted();
        self.inner.dispatch(&Event::Renderable(renderable.into()));
    }

    /// Horizontal divider made of `characters`, with an optional title
    pub fn rule(&self, title: impl Into<String>, characters: &str) {
        self.print(Rule::new(title).with_characters(characters));
    }

    /// Banner around `title`, which is upper-cased.
    ///
    /// * 0: a `═` line, the title centered on blanks, another `═` line
    /// * 1: a `═` rule carrying the title, then the title as an info record
    /// * 2: the same with a `─` rule
    /// * 3: a bold info record `<<< TITLE >>>`
    ///
    /// Other levels emit nothing.
    pub fn header(&self, title: impl AsRef<str>, level: u8) {
        let title = title.as_ref().to_uppercase();
        match level {
            0 => self.print(Renderable::Group(vec![
                Rule::new("").with_characters("═").into(),
                Rule::new(title).with_characters(" ").into(),
                Rule::new("").with_characters("═").into(),
            ])),
            1 => {
                self.rule(title.clone(), "═");
                self.info(title);
            }
            2 => {
                self.rule(title.clone(), "─");
                self.info(title);
            }
            3 => {
                if self.is_enabled(LogLevel::Info) {
                    self.emit(LogRecord::new(LogLevel::Info, format!("<<< {} >>>", title)).emphasized());
                } else {
                    self.inner.metrics.record_filtered();
                }
            }
            _ => {}
        }
    }

    /// Info record `[name] text`
    pub fn attr(&self, name: impl std::fmt::Display, text: impl std::fmt::Display) {
        self.info(format!("[{}] {}", name, text));
    }

    /// Info record `name: text` with `name` right-aligned to `align`
    /// columns and its first characters replaced by `front`
    pub fn attr_align(
        &self,
        name: impl std::fmt::Display,
        text: impl std::fmt::Display,
        front: &str,
        align: usize,
    ) {
        self.info(format!("{}: {}", align_name(&name.to_string(), front, align), text));
    }

    /// Install a rotating file sink for `path` configured by `config`
    ///
    /// # Errors
    ///
    /// Returns the sink's construction error; the current file sink, if
    /// any, stays in place in that case.
    pub fn set_file_sink(&self, path: impl Into<PathBuf>, config: &LogConfig) -> Result<()> {
        let sink = RotatingFileSink::from_config(path, config)?;
        self.register(sink);
        Ok(())
    }

    /// Install a callback sink receiving the styled renderable of every event
    pub fn set_callback(&self, callback: impl Fn(Renderable) + Send + Sync + 'static) {
        self.register(CallbackSink::new(callback));
    }

    /// Canonical path of the active file sink
    pub fn log_file(&self) -> Option<PathBuf> {
        let registry = self.inner.registry.load_full();
        let slot = registry.file.as_ref()?;
        let sink = slot.lock();
        match &*sink {
            Sink::RotatingFile(file) => Some(file.path().to_path_buf()),
            _ => None,
        }
    }

    pub fn renderer(&self) -> &dyn RenderCapability {
        self.inner.renderer.as_ref()
    }

    pub fn metrics(&self) -> &DispatchMetrics {
        &self.inner.metrics
    }

    /// Flush every sink, returning the first failure
    pub fn flush(&self) -> Result<()> {
        let snapshot = self.inner.registry.load_full();
        let mut first_error = None;
        for (_, slot) in snapshot.slots() {
            if let Err(e) = slot.lock().flush() {
                first_error.get_or_insert(e);
            }
        }
        match first_error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    /// Wait for pending backups, then flush and close every sink.
    ///
    /// Returns `true` if everything finished within `timeout`. Later events
    /// are dropped.
    pub fn shutdown(&self, timeout: Duration) -> bool {
        let snapshot = self.inner.registry.load_full();
        let mut clean = true;

        if let Some(slot) = &snapshot.file {
            if let Sink::RotatingFile(file) = &*slot.lock() {
                if !file.wait_for_backups(timeout) {
                    eprintln!(
                        "[WARN] Backups did not finish within {:?}. Some archives may be missing.",
                        timeout
                    );
                    clean = false;
                }
            }
        }

        for (kind, slot) in snapshot.slots() {
            if let Err(e) = slot.lock().close() {
                eprintln!("[LOGGER ERROR] Failed to close {} sink during shutdown: {}", kind, e);
                clean = false;
            }
        }
        clean
    }
}

impl Default for SinkDispatcher {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for SinkDispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SinkDispatcher")
            .field("sinks", &self.registered_kinds())
            .field("min_level", &self.min_level())
            .finish()
    }
}

fn align_name(name: &str, front: &str, align: usize) -> String {
    let padded = format!("{:>width$}", name, width = align);
    if front.is_empty() {
        return padded;
    }
    let skip = front.chars().count();
    let mut aligned = front.to_string();
    aligned.extend(padded.chars().skip(skip));
    aligned
}

/// Builder for constructing a [`SinkDispatcher`] with a fluent API
///
/// # Example
/// ```
/// use rust_rotating_logger::prelude::*;
/// use std::sync::Arc;
///
/// let logger = SinkDispatcher::builder()
///     .min_level(LogLevel::Debug)
///     .renderer(Arc::new(TextRenderer::new().with_level(false)))
///     .console(ConsoleSink::with_colors(false))
///     .callback(CallbackSink::new(|renderable| {
///         let _html_source = renderable.to_plain(80);
///     }))
///     .build();
///
/// assert_eq!(logger.registered_kinds(), vec![SinkKind::Console, SinkKind::Callback]);
/// ```
pub struct DispatcherBuilder {
    min_level: LogLevel,
    renderer: Arc<dyn RenderCapability>,
    console: ConsoleSink,
    file: Option<RotatingFileSink>,
    callback: Option<CallbackSink>,
}

impl DispatcherBuilder {
    pub fn new() -> Self {
        Self {
            min_level: LogLevel::Info,
            renderer: Arc::new(TextRenderer::new()),
            console: ConsoleSink::new(),
            file: None,
            callback: None,
        }
    }

    #[must_use = "builder methods return a new value"]
    pub fn min_level(mut self, level: LogLevel) -> Self {
        self.min_level = level;
        self
    }

    #[must_use = "builder methods return a new value"]
    pub fn renderer(mut self, renderer: Arc<dyn RenderCapability>) -> Self {
        self.renderer = renderer;
        self
    }

    #[must_use = "builder methods return a new value"]
    pub fn console(mut self, console: ConsoleSink) -> Self {
        self.console = console;
        self
    }

    #[must_use = "builder methods return a new value"]
    pub fn file(mut self, file: RotatingFileSink) -> Self {
        self.file = Some(file);
        self
    }

    #[must_use = "builder methods return a new value"]
    pub fn callback(mut self, callback: CallbackSink) -> Self {
        self.callback = Some(callback);
        self
    }

    pub fn build(self) -> SinkDispatcher {
        let dispatcher = SinkDispatcher::with_parts(self.console, self.renderer, self.min_level);
        if let Some(file) = self.file {
            dispatcher.register(file);
        }
        if let Some(callback) = self.callback {
            dispatcher.register(callback);
        }
        dispatcher
    }
}

impl Default for DispatcherBuilder {
    fn default() -> Self {
        Self::new()
    }
}
