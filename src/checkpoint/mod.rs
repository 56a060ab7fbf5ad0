pub mod store;

pub use store::{load, save};
