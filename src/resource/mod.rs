//! The lazy resource set: deferred fetching, incremental caching,
//! index/slice access and the CRUD entry points.

mod producer;
mod set;

pub(crate) use producer::RecordProducer;
pub use set::{Iter, Lookup, Meta, ResourceSet};
