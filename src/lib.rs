pub mod command;
pub mod common;
pub mod count;
pub mod fileformat;
pub mod runtime;
pub mod tags;
pub mod umi;
