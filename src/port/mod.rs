//! Port traits - the seams between the engine and its collaborators

pub mod feed;
pub mod invoker;
pub mod store;
