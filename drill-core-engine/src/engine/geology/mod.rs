pub mod detection;
pub mod layer;
pub mod reconstruction;
pub mod registry;
