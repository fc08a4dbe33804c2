//! Marker traits separating writes from reads
//!
//! Every mediator request implements exactly one of these. Commands mutate the job
//! store or upload registry; queries only read.

pub trait Command {}

pub trait Query {}
