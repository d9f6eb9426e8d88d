/// Route pattern module
///
/// - `pattern`: registration syntax (`/users/:id/*rest`) into typed segments
/// - `parser`: route file locations (`users/[id]/index.ts`) into patterns

pub mod parser;
pub mod pattern;

pub use parser::{classify_segment, parse_file_path, FileSegment, ParameterSyntax};
pub use pattern::{Pattern, Segment};
