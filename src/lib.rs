//! Exactly-once side-effect protection for idempotent business processes
//! driven by at-least-once event delivery.
//!
//! A caller wraps each unit of work with a process identifier; concurrent
//! or retried invocations with the same identifier either execute the work
//! exactly once and observe its completion, or observe that the work has
//! already been handled. Persistence is delegated to DynamoDB's strongly
//! consistent conditional updates.
//!
//! # Example
//!
//! ```no_run
//! use dedupe_rs::{Coordinator, Config, PollStrategy, DynamoDbStore};
//! use std::time::Duration;
//! use std::sync::Arc;
//! use uuid::Uuid;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let aws_config = aws_config::load_from_env().await;
//! let dynamodb_client = aws_sdk_dynamodb::Client::new(&aws_config);
//!
//! let store = Arc::new(DynamoDbStore::new(
//!     dynamodb_client,
//!     "dedupe-processes".to_string(),
//! ));
//!
//! let config = Config::new(
//!     Uuid::new_v4(), // processor id
//!     Duration::from_secs(300), // max processing time
//!     Duration::from_secs(86400 * 30), // 30 day TTL
//!     PollStrategy::exponential(
//!         Duration::from_millis(100),
//!         1.5,
//!         Duration::from_secs(15),
//!         Duration::from_secs(60),
//!     ),
//! );
//!
//! let coordinator = Coordinator::new(store, config);
//!
//! let signal_id = Uuid::new_v4();
//! let result = coordinator.protect(signal_id, || async {
//!     // Your processing logic here
//!     Ok::<_, dedupe_rs::Error>("processed".to_string())
//! }).await?;
//!
//! match result {
//!     Some(value) => println!("ran it: {value}"),
//!     None => println!("already handled by someone else"),
//! }
//! # Ok(())
//! # }
//! ```

pub mod classify;
pub mod clock;
pub mod codec;
pub mod coordinator;
pub mod dynamodb;
pub mod error;
pub mod model;
pub mod store;

pub use classify::classify;
pub use clock::{Clock, SystemClock};
pub use coordinator::Coordinator;
pub use dedupe_macros::protect;
pub use dynamodb::DynamoDbStore;
pub use error::Error;
pub use model::{Config, Expiration, PollStrategy, Process, ProcessStatus, Sample, StoreKey};
pub use store::Store;
