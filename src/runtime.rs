//! Runtime abstraction layer for async operations
//!
//! Tile fetches are spawned through this module so the tree code never names
//! a concrete executor. Tokio is used when the `tokio-runtime` feature is on;
//! otherwise every task gets its own thread driven by `futures::executor`.

use futures::future::{abortable, AbortHandle};
use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// A boxed task as accepted by [`AsyncSpawner::spawn_boxed`]
pub type BoxedTask = Pin<Box<dyn Future<Output = ()> + Send + 'static>>;

/// A trait for spawning async tasks (object-safe version)
pub trait AsyncSpawner: Send + Sync + 'static {
    /// Spawn a future and return a handle to it
    fn spawn_boxed(&self, future: BoxedTask) -> Box<dyn AsyncHandle>;
}

/// Handle to a spawned async task
pub trait AsyncHandle: Send + Sync {
    /// Check if the task is finished
    fn is_finished(&self) -> bool;

    /// Cancel the task
    fn cancel(&self);
}

/// Spawns `future` on the global spawner
pub fn spawn<F>(future: F) -> Box<dyn AsyncHandle>
where
    F: Future<Output = ()> + Send + 'static,
{
    runtime().spawn_boxed(Box::pin(future))
}

/// Default spawner implementations
pub mod spawners {
    use super::*;

    #[cfg(feature = "tokio-runtime")]
    pub mod tokio_impl {
        use super::*;
        use ::tokio::runtime::{Builder, Handle, Runtime};
        use ::tokio::task::JoinHandle;
        use once_cell::sync::OnceCell;

        /// Runtime used when the caller is not inside one already
        static FALLBACK: OnceCell<Runtime> = OnceCell::new();

        fn fallback_runtime() -> std::io::Result<&'static Runtime> {
            FALLBACK.get_or_try_init(|| {
                log::debug!("no ambient tokio runtime, starting a private one");
                Builder::new_multi_thread()
                    .worker_threads(2)
                    .thread_name("quadmap-fetch")
                    .enable_all()
                    .build()
            })
        }

        /// Tokio-based async spawner
        ///
        /// Uses the runtime of the calling thread when there is one, so
        /// `reqwest` finds its reactor.
        pub struct TokioSpawner;

        impl AsyncSpawner for TokioSpawner {
            fn spawn_boxed(&self, future: BoxedTask) -> Box<dyn AsyncHandle> {
                if let Ok(handle) = Handle::try_current() {
                    return Box::new(TokioHandle(handle.spawn(future)));
                }
                match fallback_runtime() {
                    Ok(runtime) => Box::new(TokioHandle(runtime.spawn(future))),
                    Err(e) => {
                        log::error!("failed to start tokio runtime: {}", e);
                        ThreadSpawner.spawn_boxed(future)
                    }
                }
            }
        }

        struct TokioHandle(JoinHandle<()>);

        impl AsyncHandle for TokioHandle {
            fn is_finished(&self) -> bool {
                self.0.is_finished()
            }

            fn cancel(&self) {
                self.0.abort();
            }
        }
    }

    /// One OS thread per task, each blocking on its future
    pub struct ThreadSpawner;

    impl AsyncSpawner for ThreadSpawner {
        fn spawn_boxed(&self, future: BoxedTask) -> Box<dyn AsyncHandle> {
            let (task, abort) = abortable(future);
            let finished = Arc::new(AtomicBool::new(false));
            let done = Arc::clone(&finished);
            std::thread::spawn(move || {
                // Err means the task was aborted; either way it is over.
                let _ = futures::executor::block_on(task);
                done.store(true, Ordering::Release);
            });
            Box::new(ThreadHandle { abort, finished })
        }
    }

    struct ThreadHandle {
        abort: AbortHandle,
        finished: Arc<AtomicBool>,
    }

    impl AsyncHandle for ThreadHandle {
        fn is_finished(&self) -> bool {
            self.finished.load(Ordering::Acquire)
        }

        fn cancel(&self) {
            self.abort.abort();
        }
    }
}

/// Global runtime instance
static RUNTIME: std::sync::OnceLock<Box<dyn AsyncSpawner>> = std::sync::OnceLock::new();

/// Initialize the runtime with a specific spawner. Only the first call wins.
pub fn init_runtime(spawner: Box<dyn AsyncSpawner>) -> bool {
    RUNTIME.set(spawner).is_ok()
}

/// Get the global runtime spawner
pub fn runtime() -> &'static dyn AsyncSpawner {
    RUNTIME
        .get_or_init(|| {
            #[cfg(feature = "tokio-runtime")]
            {
                Box::new(spawners::tokio_impl::TokioSpawner)
            }

            #[cfg(not(feature = "tokio-runtime"))]
            {
                Box::new(spawners::ThreadSpawner)
            }
        })
        .as_ref()
}
