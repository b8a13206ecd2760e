//! Client for the recordbase record store.
//!
//! Provides:
//! - `Instance`: one connection; `get`, `merge`, `replace`, `close`
//! - `deadline`: per-call millisecond budgets (0 or negative = unbounded)
//! - `convert`: wire pairs ⇄ keyed `Entry` maps
//! - `connection`: dialing, TLS (unverified, see its docs) and bearer tokens
//! - map and serialized views on `Instance`, plus a `blocking` facade
//!
//! ```no_run
//! # async fn demo() -> recordbase_client::Result<()> {
//! use recordbase_client::{Entry, Instance};
//!
//! let db = Instance::connect("tls://127.0.0.1:8500", "$RECORDBASE_AUTH", 1000).await?;
//! db.merge(&Entry::new("jet", "alex").with_attribute("color", "red"), 100).await?;
//! let entry = db.get("jet", "alex", false, 100).await?;
//! assert_eq!(entry.attributes["color"], "red");
//! db.close();
//! # Ok(())
//! # }
//! ```

#![allow(clippy::result_large_err)]

pub mod blocking;
pub mod connection;
pub mod convert;
pub mod deadline;
pub mod error;
pub mod instance;
pub mod views;

pub use deadline::Deadline;
pub use error::{ClientError, Result};
pub use instance::Instance;
pub use recordbase_common::{CodecError, Entry, FileInfo, Format};
pub use recordbase_config::ClientConfig;
