pub mod blob;
pub mod blob_filter;
pub mod blob_tracer;
pub mod debouncer;
pub mod error;
pub mod eye_pair;
pub mod frame;
pub mod motion_mask;
pub mod settings;
pub mod utils;
