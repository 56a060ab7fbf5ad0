pub mod idx;

pub use idx::{ElementType, NumericDecode};
