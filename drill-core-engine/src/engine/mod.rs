pub mod effects;
pub mod geology;
pub mod inventory;
pub mod persistence;
