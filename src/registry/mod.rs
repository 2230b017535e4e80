//! Source registry and frame fan-out
//!
//! The registry owns every capture source and routes frames from each
//! source's producer to that source's subscribers.
//!
//! # Architecture
//!
//! ```text
//!                         SourceRegistry
//!                  ┌──────────────────────────────┐
//!                  │ sources: RwLock<HashMap<Id,  │
//!                  │   SourceEntry {              │
//!                  │     controller,              │
//!                  │     subscribers: Arc<[Tx]>,  │
//!                  │   }                          │
//!                  │ >>                           │
//!                  └──────────────┬───────────────┘
//!                                 │
//!   [Producer] ──try_send──► output (100) ──► [Distributor]
//!   read/encode                                    │ try_send per subscriber
//!                                 ┌────────────────┼────────────────┐
//!                                 ▼                ▼                ▼
//!                          Subscription     Subscription     Subscription
//!                             (100)            (100)            (100)
//! ```
//!
//! # Backpressure
//!
//! Every queue is bounded and every send is non-blocking. When the output
//! channel is full the producer drops the newest frame; when a subscriber's
//! queue is full that subscriber alone misses the frame. Sequence numbers are
//! assigned before the output send, so drops show up as gaps, never as
//! duplicates or reordering.
//!
//! # Zero-Copy Design
//!
//! `bytes::Bytes` uses reference counting, so all subscribers share the same
//! encoded payload. Fan-out clones the `Frame`, never the image data.

pub mod config;
pub(crate) mod distributor;
pub(crate) mod entry;
pub mod error;
pub mod frame;
pub mod store;
pub mod subscription;

pub use config::RegistryConfig;
pub use error::{ErrorKind, RegistryError};
pub use frame::Frame;
pub use store::SourceRegistry;
pub use subscription::Subscription;
