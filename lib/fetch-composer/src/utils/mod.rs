pub mod json_writer;
pub mod parsing;
pub mod pretty_display;
