pub mod fs;
pub mod logging;
pub mod time;
pub mod signals;
