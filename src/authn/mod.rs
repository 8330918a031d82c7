//! Auth*entication* of requests: who is calling
mod identity;

pub use identity::{Identity, RequestContext};
