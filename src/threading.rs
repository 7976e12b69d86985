//! Thread pool used by the parallel compute primitives.

use std::env;
use std::sync::OnceLock;

/// A wrapper around the Rayon thread pool used to run compute primitives.
///
/// On platforms where threads are not supported (eg. WebAssembly) this runs
/// operations directly on the calling thread.
pub struct ThreadPool {
    /// The wrapped thread pool, or None if we failed to construct one.
    pool: Option<rayon::ThreadPool>,
    num_threads: usize,
}

impl ThreadPool {
    /// Run a function in the thread pool.
    ///
    /// This corresponds to [`rayon::ThreadPool::install`], except on
    /// platforms where threading is not supported, where it just runs `op`
    /// directly.
    pub fn run<R: Send, Op: FnOnce() -> R + Send>(&self, op: Op) -> R {
        if let Some(pool) = self.pool.as_ref() {
            pool.install(op)
        } else {
            op()
        }
    }

    /// Number of workers available to a parallel operation.
    pub fn num_threads(&self) -> usize {
        self.num_threads
    }

    /// Create a thread pool with a given number of threads.
    pub fn with_num_threads(num_threads: usize) -> ThreadPool {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(num_threads)
            .thread_name(|index| format!("ndvec-{}", index))
            .build();

        ThreadPool {
            pool: pool.ok(),
            num_threads: num_threads.max(1),
        }
    }
}

/// Return the [Rayon][rayon] thread pool in which ndvec's parallel
/// primitives execute.
///
/// The pool's size defaults to the number of available logical processors.
/// It can be overridden at the process level by setting the
/// `NDVEC_NUM_THREADS` environment variable, whose value must be a number
/// between 1 and the logical core count.
///
/// [rayon]: https://github.com/rayon-rs/rayon
pub fn thread_pool() -> &'static ThreadPool {
    static THREAD_POOL: OnceLock<ThreadPool> = OnceLock::new();
    THREAD_POOL.get_or_init(|| {
        let logical_cpus = num_cpus::get().max(1);

        let num_threads = if let Some(threads_var) = env::var_os("NDVEC_NUM_THREADS") {
            match threads_var.to_string_lossy().parse::<usize>() {
                Ok(n_threads) => n_threads.clamp(1, logical_cpus),
                Err(_) => logical_cpus,
            }
        } else {
            logical_cpus
        };

        ThreadPool::with_num_threads(num_threads)
    })
}

#[cfg(test)]
mod tests {
    use super::thread_pool;

    #[test]
    fn test_thread_pool_size() {
        let pool = thread_pool();
        assert!(pool.num_threads() >= 1);
        assert!(pool.num_threads() <= num_cpus::get().max(1));
    }

    #[test]
    fn test_run() {
        let total: i32 = thread_pool().run(|| (1..=10).sum());
        assert_eq!(total, 55);
    }
}
