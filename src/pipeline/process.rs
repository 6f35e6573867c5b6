//! External process handling: spawn, line-wise output, termination.

use std::path::Path;
use std::process::{ExitStatus, Stdio};
use std::time::Duration;

use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::{Child, ChildStderr, ChildStdout, Command};

use crate::error::SearchError;

/// Upper bound on the post-kill stderr drain. The process has already been
/// signaled by the time the drain runs, so its pipes close shortly.
const STDERR_DRAIN_TIMEOUT: Duration = Duration::from_secs(2);

/// Finite, single-pass reader over a pipe's decoded lines.
pub(crate) struct LineReader<R> {
    reader: BufReader<R>,
    buf: Vec<u8>,
}

impl<R: AsyncRead + Unpin> LineReader<R> {
    pub(crate) fn new(inner: R) -> Self {
        Self {
            reader: BufReader::new(inner),
            buf: Vec::new(),
        }
    }

    /// Next complete line, decoded as UTF-8 with the terminator stripped.
    ///
    /// Empty lines are skipped. A trailing partial line with no terminator
    /// at stream end is discarded rather than yielded as a truncated record.
    pub(crate) async fn next_line(&mut self) -> std::io::Result<Option<String>> {
        loop {
            self.buf.clear();
            let n = self.reader.read_until(b'\n', &mut self.buf).await?;
            if n == 0 {
                return Ok(None);
            }
            if self.buf.last().copied() != Some(b'\n') {
                return Ok(None);
            }
            self.buf.pop();
            if self.buf.last().copied() == Some(b'\r') {
                self.buf.pop();
            }
            if self.buf.is_empty() {
                continue;
            }
            return Ok(Some(String::from_utf8_lossy(&self.buf).into_owned()));
        }
    }
}

/// A spawned search process with line access to both output pipes.
pub(crate) struct SearchProcess {
    child: Child,
    pub(crate) stdout: LineReader<ChildStdout>,
    stderr: LineReader<ChildStderr>,
}

impl SearchProcess {
    /// Spawn `argv` with null stdin and piped stdout/stderr in `cwd`.
    ///
    /// # Errors
    /// Returns `SearchError::Spawn` if the process cannot be started.
    pub(crate) fn spawn(argv: &[String], cwd: &Path) -> Result<Self, SearchError> {
        let (cmd, rest) = argv.split_first().ok_or(SearchError::Pipe("argv"))?;
        let mut child = Command::new(cmd)
            .args(rest)
            .current_dir(cwd)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| SearchError::Spawn {
                command: cmd.clone(),
                source,
            })?;

        let stdout = child.stdout.take().ok_or(SearchError::Pipe("stdout"))?;
        let stderr = child.stderr.take().ok_or(SearchError::Pipe("stderr"))?;

        Ok(Self {
            child,
            stdout: LineReader::new(stdout),
            stderr: LineReader::new(stderr),
        })
    }

    /// Signal the process to stop. Does not wait for exit; pair with
    /// [`Self::wait`] to confirm termination.
    pub(crate) fn kill(&mut self) {
        if let Err(e) = self.child.start_kill() {
            log::debug!("kill signal failed (process likely exited): {e}");
        }
    }

    /// Await process exit.
    pub(crate) async fn wait(&mut self) -> Option<ExitStatus> {
        match self.child.wait().await {
            Ok(status) => Some(status),
            Err(e) => {
                log::debug!("wait on search process failed: {e}");
                None
            }
        }
    }

    /// Surface remaining stderr lines through the log, with a hard time
    /// bound. Must run only after the process exited or was signaled,
    /// otherwise a still-running producer could hold the drain open.
    ///
    /// When `suppress_transient` is set (volatile queries), lines matching
    /// the half-typed-pattern signature are demoted to debug.
    pub(crate) async fn drain_stderr(&mut self, suppress_transient: bool) {
        let stderr = &mut self.stderr;
        let drain = async {
            while let Ok(Some(line)) = stderr.next_line().await {
                if suppress_transient && is_transient_pattern_error(&line) {
                    log::debug!("search stderr (transient): {line}");
                } else {
                    log::error!("search stderr: {line}");
                }
            }
        };
        if tokio::time::timeout(STDERR_DRAIN_TIMEOUT, drain).await.is_err() {
            log::debug!("stderr drain timed out");
        }
    }
}

/// Heuristic for stderr produced by a pattern that is still being typed.
fn is_transient_pattern_error(line: &str) -> bool {
    let lowered = line.to_ascii_lowercase();
    lowered.contains("regex parse error")
        || lowered.contains("regular expression")
        || lowered.contains("parse error")
}
