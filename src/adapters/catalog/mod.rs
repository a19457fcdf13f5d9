//! Problem catalog adapters.

mod leetcode;

pub use leetcode::{LeetCodeCatalog, LeetCodeConfig};
