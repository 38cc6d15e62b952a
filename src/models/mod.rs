//! Data carried through one upload request.
//!
//! Nothing here outlives the request that produced it: parts are classified,
//! resolved into log entries, rendered, and dropped.

pub mod decision;
pub mod part;
