use anyhow::Result;
use sqlite_facade::{Database, DatabaseConfig, Value};
use std::io;
use std::sync::{Arc, Mutex, OnceLock};

const TRACE_TARGET: &str = "sqlite_facade::trace";

/// Log sink shared between the subscriber and the assertions.
#[derive(Clone, Default)]
struct SharedBuffer(Arc<Mutex<Vec<u8>>>);

impl SharedBuffer {
    fn contents(&self) -> String {
        let bytes = self.0.lock().map(|b| b.clone()).unwrap_or_default();
        String::from_utf8_lossy(&bytes).into_owned()
    }
}

impl io::Write for SharedBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        if let Ok(mut inner) = self.0.lock() {
            inner.extend_from_slice(buf);
        }
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

fn captured_logs() -> &'static SharedBuffer {
    static LOGS: OnceLock<SharedBuffer> = OnceLock::new();
    LOGS.get_or_init(|| {
        let buffer = SharedBuffer::default();
        let writer = buffer.clone();
        tracing_subscriber::fmt()
            .with_writer(move || writer.clone())
            .with_max_level(tracing::Level::DEBUG)
            .with_ansi(false)
            .try_init()
            .expect("no other global subscriber in this test binary");
        buffer
    })
}

fn traced_lines_containing(marker: &str) -> usize {
    captured_logs()
        .contents()
        .lines()
        .filter(|line| line.contains(TRACE_TARGET) && line.contains(marker))
        .count()
}

#[tokio::test]
async fn verbose_database_logs_each_statement_on_the_trace_target() -> Result<()> {
    captured_logs();
    let db = Database::open(DatabaseConfig::in_memory().with_verbose(true)).await?;

    let row = db.fetch_one("SELECT 'verbose-marker' AS tag", ()).await?;
    assert_eq!(
        row.and_then(|r| r.get("tag").and_then(Value::as_str).map(str::to_string)),
        Some("verbose-marker".to_string())
    );
    assert!(traced_lines_containing("verbose-marker") >= 1);
    Ok(())
}

#[tokio::test]
async fn quiet_database_does_not_trace() -> Result<()> {
    captured_logs();
    let db = Database::open(DatabaseConfig::in_memory()).await?;

    let row = db.fetch_one("SELECT 'quiet-marker' AS tag", ()).await?;
    assert!(row.is_some());
    // the statement still shows up in the regular debug log, just not as a trace
    assert!(captured_logs().contents().contains("quiet-marker"));
    assert_eq!(traced_lines_containing("quiet-marker"), 0);
    Ok(())
}
