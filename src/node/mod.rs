//! Page body codecs, split by node kind. Everything here is a pure function
//! of a `Page` buffer; the algorithms that walk pages via a `Pager` live in
//! `crate::btree`.

pub mod common;
pub mod internal;
pub mod leaf;

pub use common::NodeType;
