pub mod check;
pub mod cli;
pub mod serve;

pub use check::*;
pub use cli::*;
pub use serve::*;
