//! Converter Pool: the dispatcher that watches the scratch directory for
//! decoded frame artifacts, and the fixed worker pool that renders each
//! one through the external image-to-text converter (default `chafa`)
//! into the shared frame store.

pub mod dispatcher;
pub mod pool;

pub use dispatcher::{Dispatcher, Job};
pub use pool::ConverterPool;
