use async_trait::async_trait;
use futures::channel::mpsc as row_channel;
use futures::future::BoxFuture;
use futures::{Future, FutureExt, Stream, StreamExt};
use rusqlite::Connection;
use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::path::{Path, PathBuf};
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use tracing::{debug, error, info};

use crate::config::DatabaseConfig;
use crate::error::{Error, Result};
use crate::executor::{Executor, RunResult};
use crate::value::{Params, Row};

/// Async handle to one SQLite database.
///
/// Wraps a `tokio_rusqlite::Connection`: the SQLite handle lives on that
/// crate's background thread and every operation runs there as a closure,
/// one at a time in submission order. The handle is released by
/// [`close`](Self::close) or when the last clone of the inner connection is
/// dropped.
pub struct Database {
    conn: tokio_rusqlite::Connection,
    path: PathBuf,
}

impl Database {
    /// Open (or create) the database described by `config`.
    pub async fn open(config: DatabaseConfig) -> Result<Self> {
        let conn =
            tokio_rusqlite::Connection::open_with_flags(&config.path, config.mode.flags()).await?;

        let verbose = config.verbose;
        let foreign_keys = config.foreign_keys;
        run_on(&conn, move |conn| {
            if verbose {
                conn.trace(Some(trace_statement));
            }
            conn.pragma_update(None, "foreign_keys", foreign_keys)?;
            Ok(())
        })
        .await?;

        info!(
            path = %config.path.display(),
            mode = ?config.mode,
            verbose = config.verbose,
            "database opened"
        );
        Ok(Self {
            conn,
            path: config.path,
        })
    }

    /// Shorthand for a private in-memory database with default settings.
    pub async fn open_in_memory() -> Result<Self> {
        Self::open(DatabaseConfig::in_memory()).await
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Run `f` against the raw connection on the connection thread.
    ///
    /// A panic inside `f` comes back as [`Error::JobPanicked`]; the
    /// connection keeps serving later calls.
    pub async fn call<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&mut Connection) -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        run_on(&self.conn, f).await
    }

    /// Run one statement, discarding any rows it yields.
    pub async fn execute(&self, sql: &str, params: impl Into<Params>) -> Result<RunResult> {
        let sql = sql.to_string();
        let params = params.into();
        debug!(sql = %sql, "execute");
        self.call(move |conn| {
            if !is_blank(&sql) {
                let mut stmt = conn.prepare(&sql)?;
                params.bind_to(&mut stmt)?;
                let mut rows = stmt.raw_query();
                while rows.next()?.is_some() {}
            }
            Ok(RunResult {
                last_id: conn.last_insert_rowid(),
                changes: conn.changes(),
            })
        })
        .await
    }

    /// Run a semicolon-separated script. No parameters, no rows.
    pub async fn execute_batch(&self, sql: &str) -> Result<()> {
        let sql = sql.to_string();
        debug!(sql = %sql, "execute_batch");
        self.call(move |conn| Ok(conn.execute_batch(&sql)?)).await
    }

    /// First row of the result, or `None` when there is none.
    pub async fn fetch_one(&self, sql: &str, params: impl Into<Params>) -> Result<Option<Row>> {
        let sql = sql.to_string();
        let params = params.into();
        debug!(sql = %sql, "fetch_one");
        self.call(move |conn| {
            if is_blank(&sql) {
                return Ok(None);
            }
            let mut stmt = conn.prepare(&sql)?;
            params.bind_to(&mut stmt)?;
            let columns = column_names(&stmt);
            let mut rows = stmt.raw_query();
            match rows.next()? {
                Some(row) => Ok(Some(Row::from_sqlite(row, &columns)?)),
                None => Ok(None),
            }
        })
        .await
    }

    pub async fn fetch_all(&self, sql: &str, params: impl Into<Params>) -> Result<Vec<Row>> {
        let sql = sql.to_string();
        let params = params.into();
        debug!(sql = %sql, "fetch_all");
        self.call(move |conn| {
            let mut result = Vec::new();
            if is_blank(&sql) {
                return Ok(result);
            }
            let mut stmt = conn.prepare(&sql)?;
            params.bind_to(&mut stmt)?;
            let columns = column_names(&stmt);
            let mut rows = stmt.raw_query();
            while let Some(row) = rows.next()? {
                result.push(Row::from_sqlite(row, &columns)?);
            }
            Ok(result)
        })
        .await
    }

    /// Stream the rows of a query.
    ///
    /// The query is queued on the connection thread when the stream is first
    /// polled. The scan then runs to completion on that thread, pushing rows
    /// into an unbounded buffer, so a slow consumer holds the unread rest of
    /// the result in memory. A failing scan yields its error as the last item.
    pub fn stream(&self, sql: &str, params: impl Into<Params>) -> RowStream {
        let (tx, rx) = row_channel::unbounded();
        let sql = sql.to_string();
        let params = params.into();
        debug!(sql = %sql, "stream");

        let conn = self.conn.clone();
        let job = async move { run_on(&conn, move |conn| scan(conn, &sql, &params, &tx)).await };
        RowStream {
            rx,
            job: Some(job.boxed()),
            outcome: None,
        }
    }

    /// Call `on_row` for every row, in result order, then resolve with the
    /// number of rows delivered. Rows are buffered as in [`stream`](Self::stream).
    pub async fn for_each_row<F>(
        &self,
        sql: &str,
        params: impl Into<Params>,
        mut on_row: F,
    ) -> Result<u64>
    where
        F: FnMut(Row),
    {
        let mut rows = self.stream(sql, params);
        let mut count = 0;
        while let Some(row) = rows.next().await {
            on_row(row?);
            count += 1;
        }
        Ok(count)
    }

    /// Close the connection once every job queued before this call has run.
    ///
    /// Closing twice is a no-op. Later operations fail with [`Error::Closed`].
    pub async fn close(&self) -> Result<()> {
        if let Err(err) = self.conn.clone().close().await {
            error!(error = %err, "failed to close database");
            return Err(err.into());
        }
        info!(path = %self.path.display(), "database closed");
        Ok(())
    }
}

impl std::fmt::Debug for Database {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Database")
            .field("path", &self.path)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl Executor for Database {
    async fn execute(&self, sql: &str, params: Params) -> Result<RunResult> {
        Database::execute(self, sql, params).await
    }

    async fn fetch_one(&self, sql: &str, params: Params) -> Result<Option<Row>> {
        Database::fetch_one(self, sql, params).await
    }

    async fn fetch_all(&self, sql: &str, params: Params) -> Result<Vec<Row>> {
        Database::fetch_all(self, sql, params).await
    }
}

/// Rows produced by [`Database::stream`].
pub struct RowStream {
    rx: row_channel::UnboundedReceiver<Row>,
    job: Option<BoxFuture<'static, Result<()>>>,
    outcome: Option<Result<()>>,
}

impl Stream for RowStream {
    type Item = Result<Row>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.get_mut();
        if let Some(job) = this.job.as_mut() {
            if let Poll::Ready(outcome) = job.as_mut().poll(cx) {
                this.job = None;
                this.outcome = Some(outcome);
            }
        }
        match this.rx.poll_next_unpin(cx) {
            Poll::Ready(Some(row)) => Poll::Ready(Some(Ok(row))),
            // the buffer drains before the job reports back; wait for its outcome
            Poll::Ready(None) if this.job.is_some() => Poll::Pending,
            Poll::Ready(None) => Poll::Ready(this.outcome.take().and_then(Result::err).map(Err)),
            Poll::Pending => Poll::Pending,
        }
    }
}

/// Runs `f` on the connection thread, turning a panic into an error so the
/// thread survives it.
async fn run_on<F, T>(conn: &tokio_rusqlite::Connection, f: F) -> Result<T>
where
    F: FnOnce(&mut Connection) -> Result<T> + Send + 'static,
    T: Send + 'static,
{
    let outcome = conn
        .call(move |conn| Ok(panic::catch_unwind(AssertUnwindSafe(|| f(conn)))))
        .await?;
    match outcome {
        Ok(result) => result,
        Err(payload) => {
            let message = panic_message(payload.as_ref());
            error!(panic = %message, "database job panicked");
            Err(Error::JobPanicked(message))
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "non-string panic payload".to_string()
    }
}

fn trace_statement(sql: &str) {
    debug!(target: "sqlite_facade::trace", "{sql}");
}

/// True when `sql` holds no statement: only whitespace, `;` and comments.
/// SQLite prepares such text to a null statement that must not be stepped.
fn is_blank(sql: &str) -> bool {
    fn skip(s: &str) -> &str {
        s.trim_start_matches(|c: char| c.is_whitespace() || c == ';')
    }

    let mut rest = skip(sql);
    loop {
        if let Some(after) = rest.strip_prefix("--") {
            rest = after.split_once('\n').map_or("", |(_, tail)| tail);
        } else if let Some(after) = rest.strip_prefix("/*") {
            rest = after.split_once("*/").map_or("", |(_, tail)| tail);
        } else {
            return rest.is_empty();
        }
        rest = skip(rest);
    }
}

fn column_names(stmt: &rusqlite::Statement<'_>) -> Arc<[String]> {
    stmt.column_names().into_iter().map(String::from).collect()
}

fn scan(
    conn: &Connection,
    sql: &str,
    params: &Params,
    tx: &row_channel::UnboundedSender<Row>,
) -> Result<()> {
    if is_blank(sql) {
        return Ok(());
    }
    let mut stmt = conn.prepare(sql)?;
    params.bind_to(&mut stmt)?;
    let columns = column_names(&stmt);
    let mut rows = stmt.raw_query();
    while let Some(row) = rows.next()? {
        if tx.unbounded_send(Row::from_sqlite(row, &columns)?).is_err() {
            // receiver dropped
            break;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::is_blank;

    #[test]
    fn blank_sql_is_detected() {
        assert!(is_blank(""));
        assert!(is_blank("  \n\t"));
        assert!(is_blank(";;"));
        assert!(is_blank("-- just a note"));
        assert!(is_blank("/* block */ -- line\n ;"));
        assert!(is_blank("/* unterminated"));
    }

    #[test]
    fn statements_are_not_blank() {
        assert!(!is_blank("SELECT 1"));
        assert!(!is_blank("-- note\nSELECT 1"));
        assert!(!is_blank("/* a */ DELETE FROM t"));
        assert!(!is_blank("  ;  VACUUM"));
    }
}
