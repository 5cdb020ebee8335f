//! Logging bootstrap: console output plus rotating JSON files, routed per
//! target prefix according to the `logging` config sections.

use crate::config::{LogSection, LoggingConfig};
use file_rotate::{
    compression::Compression,
    suffix::{AppendTimestamp, FileLimit},
    ContentLimit, FileRotate,
};
use parking_lot::Mutex;
use std::io::{self, IsTerminal, Write};
use std::path::Path;
use std::sync::Arc;
use tracing::level_filters::LevelFilter;
use tracing::Metadata;
use tracing_subscriber::filter::{FilterFn, Targets};
use tracing_subscriber::fmt::{self, time::UtcTime, MakeWriter};
use tracing_subscriber::layer::{Filter, SubscriberExt};
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{Layer, Registry};

const FALLBACK_SECTION: &str = "default";
const DEFAULT_MAX_SIZE_MB: u64 = 100;

type BoxedLayer = Box<dyn Layer<Registry> + Send + Sync>;

/// Unknown names log at info.
fn level_filter(name: &str) -> LevelFilter {
    match name.trim().to_ascii_lowercase().as_str() {
        "off" | "none" => LevelFilter::OFF,
        "error" => LevelFilter::ERROR,
        "warn" | "warning" => LevelFilter::WARN,
        "debug" => LevelFilter::DEBUG,
        "trace" => LevelFilter::TRACE,
        _ => LevelFilter::INFO,
    }
}

/// True when `target` is `subsystem` itself or one of its modules.
fn owned_by(target: &str, subsystem: &str) -> bool {
    target
        .strip_prefix(subsystem)
        .is_some_and(|rest| rest.is_empty() || rest.starts_with("::"))
}

#[derive(Clone, Copy)]
enum Output {
    Console,
    File,
}

fn section_level(section: &LogSection, output: Output) -> LevelFilter {
    match output {
        Output::Console => level_filter(&section.console_level),
        Output::File if section.has_file() => level_filter(&section.file_level),
        Output::File => LevelFilter::OFF,
    }
}

/// Size-rotated log file shared by every layer writing to it.
#[derive(Clone)]
struct RotatingFile(Arc<Mutex<FileRotate<AppendTimestamp>>>);

impl RotatingFile {
    fn open(path: &Path, max_bytes: usize) -> io::Result<Self> {
        if let Some(dir) = path.parent() {
            std::fs::create_dir_all(dir)?;
        }
        let rotate = FileRotate::new(
            path,
            AppendTimestamp::default(FileLimit::Age(chrono::Duration::days(1))),
            ContentLimit::BytesSurpassed(max_bytes),
            Compression::None,
            #[cfg(unix)]
            None,
        );
        Ok(Self(Arc::new(Mutex::new(rotate))))
    }
}

impl Write for RotatingFile {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.0.lock().flush()
    }
}

/// Writer for a single event. Without a file the bytes are dropped.
struct FileSink(Option<RotatingFile>);

impl Write for FileSink {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.as_mut().map_or(Ok(buf.len()), |file| file.write(buf))
    }

    fn flush(&mut self) -> io::Result<()> {
        self.0.as_mut().map_or(Ok(()), |file| file.flush())
    }
}

/// Chooses the log file for an event from its target.
#[derive(Clone, Default)]
struct FileRoutes {
    fallback: Option<RotatingFile>,
    /// Longest prefix first.
    subsystems: Vec<(String, RotatingFile)>,
}

impl FileRoutes {
    fn route(&self, target: &str) -> Option<RotatingFile> {
        self.subsystems
            .iter()
            .find(|(name, _)| owned_by(target, name))
            .map(|(_, file)| file.clone())
            .or_else(|| self.fallback.clone())
    }

    fn has_any(&self) -> bool {
        self.fallback.is_some() || !self.subsystems.is_empty()
    }
}

impl<'a> MakeWriter<'a> for FileRoutes {
    type Writer = FileSink;

    fn make_writer(&'a self) -> FileSink {
        FileSink(self.fallback.clone())
    }

    fn make_writer_for(&'a self, meta: &Metadata<'_>) -> FileSink {
        FileSink(self.route(meta.target()))
    }
}

/// Opens the section's file under `base_dir`. Failures are printed and leave
/// the section without file output, since no subscriber exists yet.
fn open_section_file(name: &str, section: &LogSection, base_dir: &Path) -> Option<RotatingFile> {
    if !section.has_file() {
        return None;
    }
    // An absolute `file` replaces `base_dir` entirely.
    let path = base_dir.join(section.file.trim());
    let max_bytes = section
        .max_size_mb
        .unwrap_or(DEFAULT_MAX_SIZE_MB)
        .saturating_mul(1024 * 1024);

    match RotatingFile::open(&path, usize::try_from(max_bytes).unwrap_or(usize::MAX)) {
        Ok(file) => Some(file),
        Err(e) => {
            eprintln!("log file for '{name}' unavailable at {}: {e}", path.display());
            None
        }
    }
}

/// Logging sections split into the fallback and the per-subsystem entries.
struct LogPlan<'a> {
    fallback: Option<&'a LogSection>,
    /// Longest prefix first, so nested subsystems win over their parents.
    subsystems: Vec<(&'a str, &'a LogSection)>,
}

impl<'a> LogPlan<'a> {
    fn new(cfg: &'a LoggingConfig) -> Self {
        let mut subsystems: Vec<_> = cfg
            .iter()
            .filter(|(name, _)| name.as_str() != FALLBACK_SECTION)
            .map(|(name, section)| (name.as_str(), section))
            .collect();
        subsystems.sort_by(|a, b| b.0.len().cmp(&a.0.len()).then_with(|| a.0.cmp(b.0)));

        Self {
            fallback: cfg.get(FALLBACK_SECTION),
            subsystems,
        }
    }

    /// Levels for targets that have their own section; all other targets are off.
    fn targets(&self, output: Output) -> Targets {
        self.subsystems
            .iter()
            .fold(Targets::new().with_default(LevelFilter::OFF), |targets, (name, section)| {
                targets.with_target(*name, section_level(section, output))
            })
    }

    /// Passes events up to `max` whose target has no section of its own.
    fn fallback_filter(
        &self,
        max: LevelFilter,
    ) -> FilterFn<impl Fn(&Metadata<'_>) -> bool + Send + Sync + 'static> {
        let claimed: Vec<String> = self.subsystems.iter().map(|(name, _)| name.to_string()).collect();
        FilterFn::new(move |meta: &Metadata<'_>| {
            *meta.level() <= max && !claimed.iter().any(|name| owned_by(meta.target(), name))
        })
    }

    fn file_routes(&self, base_dir: &Path) -> FileRoutes {
        FileRoutes {
            fallback: self
                .fallback
                .and_then(|section| open_section_file(FALLBACK_SECTION, section, base_dir)),
            subsystems: self
                .subsystems
                .iter()
                .filter_map(|(name, section)| {
                    open_section_file(name, section, base_dir).map(|file| (name.to_string(), file))
                })
                .collect(),
        }
    }

    fn layers(&self, base_dir: &Path, ansi: bool) -> Vec<BoxedLayer> {
        let routes = self.file_routes(base_dir);
        let mut layers = vec![console_layer(ansi, self.targets(Output::Console))];
        if routes.has_any() {
            layers.push(json_file_layer(routes.clone(), self.targets(Output::File)));
        }

        if let Some(fallback) = self.fallback {
            let console = section_level(fallback, Output::Console);
            if console != LevelFilter::OFF {
                layers.push(console_layer(ansi, self.fallback_filter(console)));
            }
            let file = section_level(fallback, Output::File);
            if file != LevelFilter::OFF && routes.fallback.is_some() {
                layers.push(json_file_layer(routes, self.fallback_filter(file)));
            }
        }
        layers
    }
}

fn console_layer<F>(ansi: bool, filter: F) -> BoxedLayer
where
    F: Filter<Registry> + Send + Sync + 'static,
{
    fmt::layer()
        .with_ansi(ansi)
        .with_target(true)
        .with_timer(UtcTime::rfc_3339())
        .with_filter(filter)
        .boxed()
}

fn json_file_layer<F>(routes: FileRoutes, filter: F) -> BoxedLayer
where
    F: Filter<Registry> + Send + Sync + 'static,
{
    fmt::layer()
        .json()
        .with_ansi(false)
        .with_target(true)
        .with_timer(UtcTime::rfc_3339())
        .with_writer(routes)
        .with_filter(filter)
        .boxed()
}

/// Installs the global subscriber. Relative log files resolve against
/// `base_dir` (normally `server.home_dir`). Calling it twice keeps the first
/// subscriber.
pub fn init_logging_from_config(cfg: &LoggingConfig, base_dir: &Path) {
    // Route `log` records from dependencies through tracing.
    let _ = tracing_log::LogTracer::init();

    if cfg.is_empty() {
        let _ = tracing_subscriber::fmt()
            .with_target(true)
            .with_timer(UtcTime::rfc_3339())
            .try_init();
        return;
    }

    let layers = LogPlan::new(cfg).layers(base_dir, io::stdout().is_terminal());
    let _ = Registry::default().with(layers).try_init();
}
