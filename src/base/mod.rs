//! Small standalone helpers shared by the other subsystems.

pub mod hexdump;
pub mod panic;
pub mod paths;
pub mod strings;

pub use hexdump::{hex_dump, hex_dump_lines, hex_dump_to_log, hex_dump_to_writer};
pub use panic::{install_backtrace_hook, panic_message, take_backtrace, try_run, Panicked};
pub use paths::canonical_path;
pub use strings::{path_join, remove_prefix, remove_suffix};
