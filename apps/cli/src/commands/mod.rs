//! 子命令实现

pub mod config;
pub mod run;
pub mod trigger;

pub use config::ConfigCommand;
pub use run::RunArgs;
pub use trigger::TriggerArgs;
