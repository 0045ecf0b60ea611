pub mod console;

pub use console::print_summary;
