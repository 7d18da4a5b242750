//! Logging initialization
//!
//! Sets up tracing with:
//! - stderr output, always
//! - an append-mode log file when `settings.log_file` is set
//! - syslog (and therefore the journal) when `settings.enable_syslog` is set
//! - environment-based filtering via RUST_LOG, default `memory_monitor=info`
//!
//! Set `LOG_FORMAT=json` for structured JSON output on stderr and the log file.

use std::ffi::CString;
use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::path::Path;
use std::sync::{Mutex, Once};

use tracing::{Level, Metadata};
use tracing_subscriber::{
    fmt::{self, MakeWriter},
    layer::SubscriberExt,
    util::SubscriberInitExt,
    EnvFilter, Layer, Registry,
};

/// Log sink options resolved from configuration
#[derive(Debug, Clone, Copy, Default)]
pub struct LogOptions<'a> {
    pub log_file: Option<&'a Path>,
    pub enable_syslog: bool,
}

type BoxedLayer = Box<dyn Layer<Registry> + Send + Sync + 'static>;

/// Initialize tracing for the daemon
pub fn init_tracing(crate_name: &str, options: LogOptions<'_>) -> anyhow::Result<()> {
    let directive = format!("{}=info", crate_name);
    let filter = EnvFilter::from_default_env().add_directive(directive.parse()?);

    let use_json = std::env::var("LOG_FORMAT")
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    let mut layers: Vec<BoxedLayer> = vec![fmt_layer(io::stderr, use_json)];
    let mut file_error = None;

    if let Some(path) = options.log_file {
        match open_log_file(path) {
            Ok(file) => layers.push(fmt_layer(Mutex::new(file), use_json)),
            Err(e) => file_error = Some((path, e)),
        }
    }

    if options.enable_syslog {
        layers.push(
            fmt::layer()
                .with_writer(SyslogMakeWriter::new())
                .with_ansi(false)
                .without_time()
                .with_target(false)
                .boxed(),
        );
    }

    tracing_subscriber::registry()
        .with(layers)
        .with(filter)
        .try_init()?;

    if let Some((path, e)) = file_error {
        tracing::warn!(
            "Cannot write to {}: {}, logging to stderr only",
            path.display(),
            e
        );
    }

    Ok(())
}

fn fmt_layer<W>(writer: W, json: bool) -> BoxedLayer
where
    W: for<'w> MakeWriter<'w> + Send + Sync + 'static,
{
    if json {
        fmt::layer().json().with_writer(writer).boxed()
    } else {
        fmt::layer().with_writer(writer).with_ansi(false).boxed()
    }
}

fn open_log_file(path: &Path) -> io::Result<File> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    OpenOptions::new().create(true).append(true).open(path)
}

// ============================================================================
// Syslog sink
// ============================================================================

static OPENLOG: Once = Once::new();

/// Hands out one [`SyslogWriter`] per event, at the event's priority
struct SyslogMakeWriter;

impl SyslogMakeWriter {
    fn new() -> Self {
        OPENLOG.call_once(|| unsafe {
            libc::openlog(c"memory-monitor".as_ptr(), libc::LOG_PID, libc::LOG_DAEMON);
        });
        Self
    }
}

impl<'a> MakeWriter<'a> for SyslogMakeWriter {
    type Writer = SyslogWriter;

    fn make_writer(&'a self) -> Self::Writer {
        SyslogWriter::new(libc::LOG_INFO)
    }

    fn make_writer_for(&'a self, meta: &Metadata<'_>) -> Self::Writer {
        SyslogWriter::new(syslog_priority(meta.level()))
    }
}

fn syslog_priority(level: &Level) -> libc::c_int {
    match *level {
        Level::ERROR => libc::LOG_ERR,
        Level::WARN => libc::LOG_WARNING,
        Level::INFO => libc::LOG_INFO,
        _ => libc::LOG_DEBUG,
    }
}

/// Buffers one formatted event and submits it to syslog when dropped
struct SyslogWriter {
    priority: libc::c_int,
    buf: Vec<u8>,
}

impl SyslogWriter {
    fn new(priority: libc::c_int) -> Self {
        Self {
            priority,
            buf: Vec::new(),
        }
    }
}

impl Write for SyslogWriter {
    fn write(&mut self, data: &[u8]) -> io::Result<usize> {
        self.buf.extend_from_slice(data);
        Ok(data.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl Drop for SyslogWriter {
    fn drop(&mut self) {
        let line = String::from_utf8_lossy(&self.buf);
        let line = line.trim_end().replace('\0', " ");
        if line.is_empty() {
            return;
        }
        if let Ok(message) = CString::new(line) {
            unsafe {
                libc::syslog(self.priority, c"%s".as_ptr(), message.as_ptr());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_syslog_priority_mapping() {
        assert_eq!(syslog_priority(&Level::ERROR), libc::LOG_ERR);
        assert_eq!(syslog_priority(&Level::WARN), libc::LOG_WARNING);
        assert_eq!(syslog_priority(&Level::INFO), libc::LOG_INFO);
        assert_eq!(syslog_priority(&Level::TRACE), libc::LOG_DEBUG);
    }

    #[test]
    fn test_open_log_file_creates_parent() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("monitor.log");

        let mut file = open_log_file(&path).unwrap();
        writeln!(file, "line").unwrap();

        assert_eq!(std::fs::read_to_string(&path).unwrap(), "line\n");
    }

    // Global subscriber initialization can only happen once per process,
    // so init_tracing itself is exercised by the binary, not here.
}
