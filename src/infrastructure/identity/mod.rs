//! Caller identity adapters

mod unix;

pub use unix::UnixIdentityResolver;
