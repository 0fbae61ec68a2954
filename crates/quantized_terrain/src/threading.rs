//! Bounded worker pool with typed message passing.
//!
//! ```text
//!  submit() ──► ThreadPool::spawn(job) ──► worker-0 ┐
//!                                          worker-1 ├─► handler(task)
//!                                          worker-N ┘        │
//!                                                            ▼
//!  caller ◄──────── reply channel ◄──────── Completion { id, result }
//! ```
//!
//! Workers belong to a dedicated rayon pool sized at construction, kept apart
//! from the global pool that batch work runs on. Each task is moved into
//! exactly one job; the caller and the worker share only the reply channel.
//! A panicking handler is caught and reported as [`WorkerFailure`]; the pool
//! keeps serving.
//!
//! # Usage
//!
//! ```ignore
//! let pool = WorkerPool::new("tile", 4, |n: u32| n * 2)?;
//!
//! let (id, reply) = pool.submit(21);
//!
//! // Poll without blocking
//! if let Ok(done) = reply.try_recv() {
//!     assert_eq!(done.id, id);
//!     assert_eq!(done.result.unwrap(), 42);
//! }
//! ```

use std::any::Any;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;

use crossbeam_channel::{Receiver, Sender};
use rayon::{ThreadPool, ThreadPoolBuildError, ThreadPoolBuilder};

/// Unique identifier for a submitted task.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct TaskId(u64);

impl TaskId {
  fn next() -> Self {
    static COUNTER: AtomicU64 = AtomicU64::new(0);
    Self(COUNTER.fetch_add(1, Ordering::Relaxed))
  }

  pub fn get(self) -> u64 {
    self.0
  }
}

/// A task panicked inside its handler.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WorkerFailure {
  pub worker: String,
  pub message: String,
}

impl fmt::Display for WorkerFailure {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{} panicked: {}", self.worker, self.message)
  }
}

impl std::error::Error for WorkerFailure {}

/// Result of one task.
#[derive(Debug)]
pub struct Completion<R> {
  pub id: TaskId,
  pub result: Result<R, WorkerFailure>,
}

type Handler<T, R> = Arc<dyn Fn(T) -> R + Send + Sync>;

/// `threads` named rayon workers running one handler.
///
/// Dropping the pool blocks until every task already submitted has finished.
pub struct WorkerPool<T, R> {
  name: String,
  pool: ThreadPool,
  handler: Handler<T, R>,
  queued: Arc<AtomicUsize>,
  // Each spawned job holds a clone; `drained` disconnects once all are gone.
  alive: Option<Sender<()>>,
  drained: Receiver<()>,
}

impl<T: Send + 'static, R: Send + 'static> WorkerPool<T, R> {
  /// Start `threads` workers (at least one) named `{name}-{index}`.
  pub fn new<F>(name: &str, threads: usize, handler: F) -> Result<Self, ThreadPoolBuildError>
  where
    F: Fn(T) -> R + Send + Sync + 'static,
  {
    let prefix = name.to_string();
    let pool = ThreadPoolBuilder::new()
      .num_threads(threads.max(1))
      .thread_name(move |index| format!("{prefix}-{index}"))
      .build()?;
    let (alive, drained) = crossbeam_channel::bounded(0);

    Ok(Self {
      name: name.to_string(),
      pool,
      handler: Arc::new(handler),
      queued: Arc::new(AtomicUsize::new(0)),
      alive: Some(alive),
      drained,
    })
  }

  /// Queue a task with its own reply channel.
  pub fn submit(&self, task: T) -> (TaskId, Receiver<Completion<R>>) {
    let (reply, receiver) = crossbeam_channel::bounded(1);
    let id = self.submit_with_reply(task, reply);
    (id, receiver)
  }

  /// Queue a task whose completion goes to a shared channel.
  pub fn submit_with_reply(&self, task: T, reply: Sender<Completion<R>>) -> TaskId {
    let id = TaskId::next();
    let handler = Arc::clone(&self.handler);
    let queued = Arc::clone(&self.queued);
    let alive = self.alive.clone();
    let pool_name = self.name.clone();

    queued.fetch_add(1, Ordering::Relaxed);
    self.pool.spawn(move || {
      queued.fetch_sub(1, Ordering::Relaxed);
      let worker = thread::current().name().map_or(pool_name, str::to_string);

      let result = panic::catch_unwind(AssertUnwindSafe(|| handler(task))).map_err(|payload| {
        let failure = WorkerFailure {
          worker: worker.clone(),
          message: panic_message(payload.as_ref()),
        };
        tracing::warn!(worker = %worker, task = id.get(), "{failure}");
        failure
      });
      if reply.send(Completion { id, result }).is_err() {
        tracing::trace!(worker = %worker, task = id.get(), "completion dropped, receiver gone");
      }
      drop(alive);
    });
    id
  }

  pub fn threads(&self) -> usize {
    self.pool.current_num_threads()
  }

  /// Tasks waiting for a free worker.
  pub fn queued(&self) -> usize {
    self.queued.load(Ordering::Relaxed)
  }
}

impl<T, R> Drop for WorkerPool<T, R> {
  fn drop(&mut self) {
    self.alive.take();
    // Never receives a value; returns once the last job drops its sender.
    let _ = self.drained.recv();
    tracing::trace!(pool = %self.name, "worker pool drained");
  }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
  if let Some(s) = payload.downcast_ref::<&str>() {
    (*s).to_string()
  } else if let Some(s) = payload.downcast_ref::<String>() {
    s.clone()
  } else {
    "unknown panic payload".to_string()
  }
}

// =============================================================================
// Tests
// =============================================================================
