//! Worker pool with priority-scheduled dispatch.
//!
//! A fixed-size pool of named workers shares one min-priority queue keyed by
//! ready time. The single queue unifies immediate work, delayed work and
//! shutdown into one dequeue loop: there is no separate scheduler task to
//! race against.
//!
//! Workers can be configured to terminate themselves after an idle period
//! (`keep_alive`) and are revived transparently by the next submission, so
//! a rarely-used pool costs nothing between bursts.
//!
//! # Example
//!
//! ```
//! use eventide_pool::PoolConfig;
//! use std::time::Duration;
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let pool = PoolConfig::builder()
//!     .name("uploads")
//!     .size(2)
//!     .keep_alive(Duration::from_millis(100))
//!     .build();
//!
//! pool.execute(|| async {
//!     // upload something
//! });
//! pool.terminate().await;
//! # }
//! ```

mod config;
mod pool;

pub use config::{PoolConfig, PoolConfigBuilder};
pub use pool::WorkerPool;
