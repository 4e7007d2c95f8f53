pub mod archive;
pub mod layout;
pub mod retention;
