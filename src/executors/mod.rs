pub mod command;
pub mod toolchain;
pub mod tracker;
