// Parsers for textual field formats found in the input tables

pub mod date;

pub use date::parse_post_date;
