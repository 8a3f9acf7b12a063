// File: ./src/model/mod.rs
pub mod compose;
pub mod event;
pub mod matcher;
pub mod parser;
pub mod resolve;
pub mod text;
pub mod time;

pub use event::{ParseError, ParsedEvent};
pub use parser::{EventParser, parse_event};
pub use resolve::{CanonicalResolver, DateResolver};
