pub mod init;
pub mod modules;
pub mod progress;
pub mod reset;
pub mod study;
pub mod validate;
