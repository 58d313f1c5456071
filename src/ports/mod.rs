//! Port traits defining external boundaries.
//!
//! The only external system the pipeline talks to is the generative model.
//! Adapter implementations live in `src/adapters/`.

pub mod model;

pub use model::{Fragment, FragmentReceiver, ModelStream, StreamFuture, StreamRequest};
