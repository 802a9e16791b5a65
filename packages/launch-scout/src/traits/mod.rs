//! Trait seams between the pipeline and the outside world.
//!
//! Every network collaborator sits behind one of these traits so the
//! pipeline can be driven entirely by the mocks in [`crate::testing`].

pub mod inference;
pub mod notifier;
pub mod searcher;
pub mod transport;
