#![allow(dead_code)]

use std::collections::{BTreeMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use caesium_console::engine::SnapshotSource;
use caesium_console::errors::{ConsoleError, Result};
use caesium_console::events::{EventFilter, EventTransport};
use caesium_console::logs::{LogResponse, LogSink, LogSource};
use caesium_console::model::{Atom, JobDag, JobRun};
use caesium_console::types::{BoxFuture, ByteStream};
use futures_util::StreamExt;
use futures_util::stream;
use tokio::sync::mpsc;
use tokio::time::Instant;

/// What happens after the scripted chunks of a stream are delivered.
#[derive(Debug, Clone)]
pub enum StreamTail {
    /// The body ends cleanly.
    Close,
    /// The body fails with a transport error.
    Error(String),
    /// The body stays open forever.
    Hang,
}

/// One scripted connection attempt.
#[derive(Debug)]
pub enum Connection {
    /// Opening fails with a transport error.
    Refuse(String),
    /// The stream yields `chunks` and then behaves as `tail` says.
    Stream { chunks: Vec<Vec<u8>>, tail: StreamTail },
    /// Chunks are pushed by the test through the paired sender.
    Live(mpsc::UnboundedReceiver<Vec<u8>>),
}

impl Connection {
    pub fn chunks(chunks: Vec<Vec<u8>>, tail: StreamTail) -> Self {
        Connection::Stream { chunks, tail }
    }

    /// A live connection and the sender that feeds it.
    pub fn live() -> (Self, mpsc::UnboundedSender<Vec<u8>>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Connection::Live(rx), tx)
    }
}

fn scripted_stream(chunks: Vec<Vec<u8>>, tail: StreamTail) -> ByteStream {
    let head = stream::iter(chunks.into_iter().map(Ok::<_, ConsoleError>));
    match tail {
        StreamTail::Close => head.boxed(),
        StreamTail::Error(msg) => head
            .chain(stream::once(async move { Err(ConsoleError::Transport(msg)) }))
            .boxed(),
        StreamTail::Hang => head.chain(stream::pending()).boxed(),
    }
}

fn live_stream(rx: mpsc::UnboundedReceiver<Vec<u8>>) -> ByteStream {
    stream::unfold(rx, |mut rx| async move {
        let chunk = rx.recv().await?;
        Some((Ok::<_, ConsoleError>(chunk), rx))
    })
    .boxed()
}

/// Event transport that plays back one `Connection` per `open` call.
///
/// Once the script is exhausted, further connections hang without data so a
/// reconnecting client does not spin.
#[derive(Debug, Default)]
pub struct FakeEventTransport {
    script: Mutex<VecDeque<Connection>>,
    opens: AtomicUsize,
    filters: Mutex<Vec<EventFilter>>,
    open_times: Mutex<Vec<Instant>>,
}

impl FakeEventTransport {
    pub fn new(script: Vec<Connection>) -> Self {
        Self {
            script: Mutex::new(script.into()),
            ..Self::default()
        }
    }

    pub fn push(&self, connection: Connection) {
        self.script.lock().unwrap().push_back(connection);
    }

    /// Number of `open` calls so far.
    pub fn open_count(&self) -> usize {
        self.opens.load(Ordering::SeqCst)
    }

    pub fn filters(&self) -> Vec<EventFilter> {
        self.filters.lock().unwrap().clone()
    }

    /// Tokio clock reading at each `open` call.
    pub fn open_times(&self) -> Vec<Instant> {
        self.open_times.lock().unwrap().clone()
    }
}

impl EventTransport for FakeEventTransport {
    fn open<'a>(&'a self, filter: &'a EventFilter) -> BoxFuture<'a, Result<ByteStream>> {
        self.opens.fetch_add(1, Ordering::SeqCst);
        self.open_times.lock().unwrap().push(Instant::now());
        self.filters.lock().unwrap().push(filter.clone());
        let next = self.script.lock().unwrap().pop_front();

        Box::pin(async move {
            match next {
                Some(Connection::Refuse(msg)) => Err(ConsoleError::Transport(msg)),
                Some(Connection::Stream { chunks, tail }) => Ok(scripted_stream(chunks, tail)),
                Some(Connection::Live(rx)) => Ok(live_stream(rx)),
                None => Ok(scripted_stream(Vec::new(), StreamTail::Hang)),
            }
        })
    }
}

/// Scripted answer to one log request.
#[derive(Debug)]
pub enum LogScript {
    Reject { status: u16, body: String },
    Fail(String),
    Stream { chunks: Vec<Vec<u8>>, tail: StreamTail },
}

/// Log source that answers each request from a script and records the
/// `(job, run, task)` triples it was asked for.
#[derive(Debug, Default)]
pub struct FakeLogSource {
    script: Mutex<VecDeque<LogScript>>,
    requests: Mutex<Vec<(String, String, String)>>,
}

impl FakeLogSource {
    pub fn new(script: Vec<LogScript>) -> Self {
        Self {
            script: Mutex::new(script.into()),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn requests(&self) -> Vec<(String, String, String)> {
        self.requests.lock().unwrap().clone()
    }
}

impl LogSource for FakeLogSource {
    fn open_logs<'a>(
        &'a self,
        job_id: &'a str,
        run_id: &'a str,
        task_id: &'a str,
    ) -> BoxFuture<'a, Result<LogResponse>> {
        self.requests.lock().unwrap().push((
            job_id.to_string(),
            run_id.to_string(),
            task_id.to_string(),
        ));
        let next = self.script.lock().unwrap().pop_front();

        Box::pin(async move {
            match next {
                Some(LogScript::Reject { status, body }) => Ok(LogResponse::Rejected { status, body }),
                Some(LogScript::Fail(msg)) => Err(ConsoleError::Transport(msg)),
                Some(LogScript::Stream { chunks, tail }) => {
                    Ok(LogResponse::Stream(scripted_stream(chunks, tail)))
                }
                None => Ok(LogResponse::Stream(scripted_stream(Vec::new(), StreamTail::Close))),
            }
        })
    }
}

/// Sink that keeps everything written to it; clones share the buffers.
#[derive(Debug, Clone, Default)]
pub struct RecordingSink {
    text: Arc<Mutex<String>>,
    diagnostics: Arc<Mutex<Vec<String>>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn text(&self) -> String {
        self.text.lock().unwrap().clone()
    }

    pub fn diagnostics(&self) -> Vec<String> {
        self.diagnostics.lock().unwrap().clone()
    }
}

impl LogSink for RecordingSink {
    fn write(&mut self, text: &str) {
        self.text.lock().unwrap().push_str(text);
    }

    fn diagnostic(&mut self, line: &str) {
        self.diagnostics.lock().unwrap().push(line.to_string());
    }
}

/// Snapshot source backed by in-memory values.
///
/// Run answers are consumed in order; the last one is repeated forever.
#[derive(Debug, Default)]
pub struct FakeSnapshotSource {
    runs: Mutex<VecDeque<std::result::Result<JobRun, String>>>,
    dag: Mutex<Option<JobDag>>,
    atoms: Mutex<BTreeMap<String, Atom>>,
    run_fetches: AtomicUsize,
}

impl FakeSnapshotSource {
    pub fn new(run: JobRun) -> Self {
        let source = Self::default();
        source.push_run(run);
        source
    }

    pub fn with_dag(self, dag: JobDag) -> Self {
        *self.dag.lock().unwrap() = Some(dag);
        self
    }

    pub fn with_atom(self, atom: Atom) -> Self {
        self.atoms.lock().unwrap().insert(atom.id.clone(), atom);
        self
    }

    pub fn push_run(&self, run: JobRun) {
        self.runs.lock().unwrap().push_back(Ok(run));
    }

    /// Queue a failed fetch answered with HTTP 500 and `message`.
    pub fn push_failure(&self, message: &str) {
        self.runs.lock().unwrap().push_back(Err(message.to_string()));
    }

    pub fn run_fetches(&self) -> usize {
        self.run_fetches.load(Ordering::SeqCst)
    }
}

impl SnapshotSource for FakeSnapshotSource {
    fn fetch_run<'a>(&'a self, _job_id: &'a str, _run_id: &'a str) -> BoxFuture<'a, Result<JobRun>> {
        self.run_fetches.fetch_add(1, Ordering::SeqCst);
        let answer = {
            let mut runs = self.runs.lock().unwrap();
            if runs.len() > 1 {
                runs.pop_front()
            } else {
                runs.front().cloned()
            }
        };

        Box::pin(async move {
            match answer {
                Some(Ok(run)) => Ok(run),
                Some(Err(message)) => Err(ConsoleError::Api {
                    status: 500,
                    message,
                }),
                None => Err(ConsoleError::Api {
                    status: 404,
                    message: "run not found".to_string(),
                }),
            }
        })
    }

    fn fetch_dag<'a>(&'a self, job_id: &'a str) -> BoxFuture<'a, Result<JobDag>> {
        let dag = self.dag.lock().unwrap().clone();
        Box::pin(async move {
            dag.ok_or_else(|| ConsoleError::Api {
                status: 404,
                message: format!("no dag for job {job_id}"),
            })
        })
    }

    fn fetch_atoms<'a>(&'a self, _dag: &'a JobDag) -> BoxFuture<'a, Result<BTreeMap<String, Atom>>> {
        let atoms = self.atoms.lock().unwrap().clone();
        Box::pin(async move { Ok(atoms) })
    }
}
