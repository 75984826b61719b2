pub mod import;

pub use import::{handle_import_command, ImportArgs};
