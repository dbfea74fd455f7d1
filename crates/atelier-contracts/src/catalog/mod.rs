mod defaults;
mod registry;

pub use registry::{StyleCatalog, StyleDescriptor};
