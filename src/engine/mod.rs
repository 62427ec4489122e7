pub mod action;
pub mod executor;
pub mod generator;
