//! Block and line parsers.

pub(crate) mod block;
pub(crate) mod line;
