//! CLI command implementations.

pub mod helpers;
pub mod import;
pub mod logs;
pub mod serve;
pub mod ui;

pub use import::run_import;
pub use logs::run_logs;
pub use serve::run_serve;
pub use ui::run_ui;
