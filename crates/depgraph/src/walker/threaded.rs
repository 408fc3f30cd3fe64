//! Concurrent walker bounded by a pluggable limiter
//!
//! Each node gets a pending-dependency counter. When a callback returns, the
//! counters of its dependents are decremented under one mutex, and every
//! dependent that reaches zero is spawned onto a rayon scope. The scope
//! returning is the completion signal for the whole walk.

use super::{Schedule, Walker};
use crate::graph::{Graph, Node};
use crate::limiter::{Limiter, Unbounded};
use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::{Mutex, PoisonError};

/// Runs eligible nodes in parallel, at most as many as the limiter allows
///
/// Callbacks run on the rayon global pool unless a dedicated pool is
/// configured with [`ThreadedWalker::with_threads`]. The global pool has one
/// thread per CPU, so blocking callbacks that should overlap beyond that need
/// a dedicated pool at least as large as the limiter. A panicking callback
/// counts as a failed node; siblings keep running and the first panic is
/// re-raised once every dispatched node has finished.
pub struct ThreadedWalker<L: Limiter = Unbounded> {
    limiter: L,
    pool: Option<rayon::ThreadPool>,
}

impl<L: Limiter> ThreadedWalker<L> {
    /// Create a walker running on the rayon global pool
    pub fn new(limiter: L) -> Self {
        Self {
            limiter,
            pool: None,
        }
    }

    /// Create a walker running on a dedicated pool of `threads` threads
    pub fn with_threads(limiter: L, threads: usize) -> Result<Self, rayon::ThreadPoolBuildError> {
        let pool = build_pool(threads)?;
        Ok(Self {
            limiter,
            pool: Some(pool),
        })
    }

    /// Like [`ThreadedWalker::with_threads`], falling back to the global pool
    /// if the dedicated one cannot be built
    pub(crate) fn sized(limiter: L, threads: usize) -> Self {
        let pool = build_pool(threads)
            .inspect_err(|e| {
                log::warn!("Could not build a {threads}-thread pool, using the global pool: {e}");
            })
            .ok();
        Self { limiter, pool }
    }

    /// Number of threads callbacks can run on
    pub fn threads(&self) -> usize {
        self.pool
            .as_ref()
            .map_or_else(rayon::current_num_threads, rayon::ThreadPool::current_num_threads)
    }

    /// The limiter bounding this walker
    pub fn limiter(&self) -> &L {
        &self.limiter
    }
}

impl<L: Limiter> Walker for ThreadedWalker<L> {
    fn walk<N, F>(&self, graph: &Graph<N>, callback: F) -> bool
    where
        N: Node + Send + Sync,
        F: Fn(&N) -> bool + Sync,
    {
        let schedule = Schedule::new(graph);
        let ready = schedule.ready();
        let Schedule {
            nodes,
            pending,
            dependents,
        } = schedule;
        let total = nodes.len();

        let run = Run {
            nodes,
            dependents,
            callback: &callback,
            limiter: &self.limiter,
            state: Mutex::new(RunState {
                pending,
                completed: 0,
                ok: true,
                panics: Vec::new(),
            }),
        };

        match &self.pool {
            Some(pool) => pool.scope(|scope| run.start(scope, &ready)),
            None => rayon::scope(|scope| run.start(scope, &ready)),
        }

        let nodes = run.nodes;
        let state = run
            .state
            .into_inner()
            .unwrap_or_else(PoisonError::into_inner);

        let mut panics = state.panics.into_iter();
        if let Some((idx, payload)) = panics.next() {
            let others = panics.count();
            log::error!(
                "Callback for {:?} panicked ({} other panic(s)); re-raising",
                nodes[idx],
                others
            );
            panic::resume_unwind(payload);
        }

        if state.completed < total {
            log::error!(
                "Walk stalled: {} node(s) are on or behind a dependency cycle",
                total - state.completed
            );
            return false;
        }
        state.ok
    }
}

struct RunState {
    pending: Vec<usize>,
    completed: usize,
    ok: bool,
    panics: Vec<(usize, Box<dyn Any + Send>)>,
}

struct Run<'a, N, F, L: ?Sized> {
    nodes: Vec<&'a N>,
    dependents: Vec<Vec<usize>>,
    callback: &'a F,
    limiter: &'a L,
    state: Mutex<RunState>,
}

impl<'a, N, F, L> Run<'a, N, F, L>
where
    N: Node + Sync,
    F: Fn(&N) -> bool + Sync,
    L: Limiter + ?Sized,
{
    fn start<'s>(&'s self, scope: &rayon::Scope<'s>, ready: &[usize]) {
        for &idx in ready {
            self.dispatch(scope, idx);
        }
    }

    fn dispatch<'s>(&'s self, scope: &rayon::Scope<'s>, idx: usize) {
        log::debug!("Dispatching {:?}", self.nodes[idx]);
        scope.spawn(move |scope| {
            let outcome = {
                let _permit = self.limiter.permit();
                log::trace!("Running {:?}", self.nodes[idx]);
                panic::catch_unwind(AssertUnwindSafe(|| (self.callback)(self.nodes[idx])))
            };
            for next in self.complete(idx, outcome) {
                self.dispatch(scope, next);
            }
        });
    }

    /// Record a finished node and return the dependents it made eligible
    fn complete(&self, idx: usize, outcome: std::thread::Result<bool>) -> Vec<usize> {
        let node = self.nodes[idx];
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);

        match outcome {
            Ok(true) => log::debug!("{node:?} succeeded"),
            Ok(false) => {
                log::warn!("{node:?} failed");
                state.ok = false;
            }
            Err(payload) => {
                log::error!("{node:?} panicked: {}", panic_message(payload.as_ref()));
                state.ok = false;
                state.panics.push((idx, payload));
            }
        }
        state.completed += 1;

        let mut eligible = Vec::new();
        for &dependent in &self.dependents[idx] {
            state.pending[dependent] -= 1;
            if state.pending[dependent] == 0 {
                eligible.push(dependent);
            }
        }
        eligible
    }
}

fn build_pool(threads: usize) -> Result<rayon::ThreadPool, rayon::ThreadPoolBuildError> {
    rayon::ThreadPoolBuilder::new()
        .num_threads(threads.max(1))
        .thread_name(|i| format!("depgraph-walker-{i}"))
        .build()
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message
    } else {
        "non-string panic payload"
    }
}
