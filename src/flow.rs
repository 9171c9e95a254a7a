//! Cooperative, resumable execution.
//!
//! Decoding a file and building its scene are written as ordinary `async`
//! code that calls [`checkpoint`] at fine grained points (after each block,
//! each child, each batch of vertices). A [`Job`] wraps such a future and
//! exposes a poll style "make progress, report done or not" interface that
//! an external scheduler can drive under its own time budget.
//!
//! # User-facing types
//!
//! - [`Job<'a, T>`] is a resumable unit of work yielding a `T`
//! - [`Step<T>`] is what a single [`Job::advance`] call reports
//! - [`StepQueue<'a, T>`] is a small reference driver for tests and tools
//!
//! # Contract
//!
//! 1. A job never assumes it runs to completion in one `advance`
//! 2. Between two steps nothing but the job's own state changes
//! 3. Dropping a job cancels it; partial output is discarded with it
//!
//! Jobs are single threaded (`!Send`). Parallelism across files happens one
//! level up, see [`crate::resources::load_nifs`].

use std::{
    collections::VecDeque,
    fmt::Debug,
    future::Future,
    pin::Pin,
    task::{self, Poll},
};

use futures::{FutureExt, future::LocalBoxFuture};
use instant::{Duration, Instant};
use log::{debug, trace};

/// Outcome of advancing a [`Job`] by one step.
#[derive(Debug, PartialEq, Eq)]
pub enum Step<T> {
    /// A checkpoint was reached, more work remains.
    Pending,
    /// The job finished with this value.
    Ready(T),
    /// The job already finished on an earlier step.
    Spent,
}

impl<T> Step<T> {
    pub fn is_pending(&self) -> bool {
        matches!(self, Step::Pending)
    }

    pub fn ready(self) -> Option<T> {
        match self {
            Step::Ready(value) => Some(value),
            _ => None,
        }
    }
}

pub struct Job<'a, T> {
    future: Option<LocalBoxFuture<'a, T>>,
    steps: usize,
}

impl<'a, T> Job<'a, T> {
    pub fn new(future: impl Future<Output = T> + 'a) -> Self {
        Self {
            future: Some(future.boxed_local()),
            steps: 0,
        }
    }

    /// A job that completes on its first step.
    pub fn ready(value: T) -> Self
    where
        T: 'a,
    {
        Self::new(futures::future::ready(value))
    }

    /// Runs the job until its next checkpoint or until it completes.
    pub fn advance(&mut self) -> Step<T> {
        let Some(future) = self.future.as_mut() else {
            return Step::Spent;
        };
        let mut cx = task::Context::from_waker(futures::task::noop_waker_ref());
        self.steps += 1;
        match future.as_mut().poll(&mut cx) {
            Poll::Pending => Step::Pending,
            Poll::Ready(value) => {
                self.future = None;
                Step::Ready(value)
            }
        }
    }

    /// Advances until the job completes. `None` if it had already completed.
    pub fn run_to_completion(mut self) -> Option<T> {
        loop {
            match self.advance() {
                Step::Pending => continue,
                Step::Ready(value) => return Some(value),
                Step::Spent => return None,
            }
        }
    }

    pub fn is_done(&self) -> bool {
        self.future.is_none()
    }

    /// Number of times the job has been advanced.
    pub fn steps(&self) -> usize {
        self.steps
    }

    /// Transforms the result without adding a step.
    pub fn map<U>(self, f: impl FnOnce(T) -> U + 'a) -> Job<'a, U>
    where
        T: 'a,
    {
        match self.future {
            Some(future) => Job {
                future: Some(future.map(f).boxed_local()),
                steps: self.steps,
            },
            None => Job {
                future: None,
                steps: self.steps,
            },
        }
    }
}

impl<T> Debug for Job<'_, T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Job")
            .field("steps", &self.steps)
            .field("done", &self.is_done())
            .finish()
    }
}

/// Suspension point: completes on the second poll.
#[derive(Debug, Default)]
#[must_use = "a checkpoint does nothing unless awaited"]
pub struct Checkpoint {
    yielded: bool,
}

impl Future for Checkpoint {
    type Output = ();

    fn poll(mut self: Pin<&mut Self>, cx: &mut task::Context<'_>) -> Poll<()> {
        if self.yielded {
            Poll::Ready(())
        } else {
            self.yielded = true;
            // keeps ordinary executors (block_on) moving
            cx.waker().wake_by_ref();
            Poll::Pending
        }
    }
}

pub fn checkpoint() -> Checkpoint {
    Checkpoint::default()
}

/// Identifies a job pushed onto a [`StepQueue`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct JobId(pub usize);

/// Round robin driver that advances queued jobs until a time budget is used
/// up. Callers with their own frame scheduler drive [`Job::advance`]
/// directly instead.
pub struct StepQueue<'a, T> {
    jobs: VecDeque<(JobId, Job<'a, T>)>,
    next_id: usize,
}

impl<'a, T> Default for StepQueue<'a, T> {
    fn default() -> Self {
        Self {
            jobs: VecDeque::new(),
            next_id: 0,
        }
    }
}

impl<'a, T> StepQueue<'a, T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, job: Job<'a, T>) -> JobId {
        let id = JobId(self.next_id);
        self.next_id += 1;
        self.jobs.push_back((id, job));
        id
    }

    /// Cancels a queued job. Its partial output is dropped.
    pub fn cancel(&mut self, id: JobId) -> bool {
        let before = self.jobs.len();
        self.jobs.retain(|(queued, _)| *queued != id);
        self.jobs.len() != before
    }

    pub fn len(&self) -> usize {
        self.jobs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.jobs.is_empty()
    }

    /// Advances jobs in turn, at least one step, until `budget` has elapsed
    /// or the queue is empty. Returns the jobs that finished.
    pub fn run_for(&mut self, budget: Duration) -> Vec<(JobId, T)> {
        let start = Instant::now();
        let mut finished = Vec::new();
        let mut steps = 0usize;
        while let Some((id, mut job)) = self.jobs.pop_front() {
            steps += 1;
            match job.advance() {
                Step::Pending => self.jobs.push_back((id, job)),
                Step::Ready(value) => finished.push((id, value)),
                Step::Spent => {}
            }
            if start.elapsed() >= budget {
                break;
            }
        }
        trace!(
            "step queue: {} steps, {} finished, {} queued",
            steps,
            finished.len(),
            self.jobs.len()
        );
        finished
    }

    /// Drives every queued job to completion.
    pub fn run_all(&mut self) -> Vec<(JobId, T)> {
        let mut finished = Vec::new();
        while !self.is_empty() {
            finished.extend(self.run_for(Duration::MAX));
        }
        finished
    }
}

/// Installs `env_logger` as the `log` backend. Safe to call more than once.
pub fn init_logging() {
    if let Err(e) = env_logger::try_init() {
        // some logger is installed already, so this still gets out
        debug!("Could not initialize logger: {}", e);
    };
}
