// Core primitives shared by every pipeline stage

pub mod context;
pub mod datetime;
pub mod field;
pub mod newlines;
pub mod numeric;
pub mod scanner;
pub mod trie;

pub use context::ParseContext;
pub use field::{field_text, split_fields, unquote, FieldBound};
pub use newlines::{content_end, is_blank_row};
pub use numeric::NumberFormat;
pub use scanner::{Dialect, ParserState, NUM_STATES};
pub use trie::SerialTrie;
