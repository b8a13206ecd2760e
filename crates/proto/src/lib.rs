//! Generated gRPC code for the recordbase protobuf definitions.
//!
//! The server half is generated as well; the client crate's integration
//! tests use it to stand up an in-process store.

/// Record service (Get, Update) and the entry wire messages.
pub mod record {
    tonic::include_proto!("recordbase.v1");
}
