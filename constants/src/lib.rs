pub mod drill;
pub mod geology;
pub mod persistence;
