pub mod collection;
pub mod config;
pub mod practice;
pub mod quiz;
