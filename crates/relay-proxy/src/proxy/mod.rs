//! The forwarding pipeline: target resolution, header sanitization,
//! dispatch and relay.

pub mod correlation;
pub mod forward;
pub mod headers;
pub mod target;
