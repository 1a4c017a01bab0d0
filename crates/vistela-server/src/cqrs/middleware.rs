//! Marker traits separating writes from reads
//!
//! Commands change video records and their handlers log at `info`; queries
//! only read.

/// A request that changes state
pub trait Command: std::fmt::Debug + Send + 'static {}

/// A request that only reads state
pub trait Query: std::fmt::Debug + Send + 'static {}
