//! Command implementations.

pub mod confidence;
pub mod init;
pub mod report;

pub use self::confidence::execute_confidence;
pub use self::init::execute_init;
pub use self::report::execute_report;
