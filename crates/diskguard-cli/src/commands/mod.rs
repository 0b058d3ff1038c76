pub mod check;
pub mod usage;

pub use check::CheckCommand;
pub use usage::UsageCommand;
