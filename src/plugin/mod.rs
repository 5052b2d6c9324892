pub mod accessor;
pub mod document;
pub mod engine;
pub mod error;
pub mod locator;
pub mod mutator;
pub mod store;

pub use accessor::ListSelector;
pub use engine::ConfigEngine;
pub use locator::ConfigLocator;
