//! Docblock annotation parsing.
//!
//! Turns the text of a `/** ... */` comment into the list of
//! [`AnnotationNode`]s it contains.  Free text between annotations is
//! ignored; only `@Name` and `@Name(arguments...)` are recognised.
//!
//! ```text
//! /**
//!  * Persisted users.
//!  *
//!  * @Stored(table="users", indexes={"email", "name"})
//!  * @Cache(lifetime=3600)
//!  */
//! ```
//!
//! # Submodules
//!
//! - [`scanner`]: text skipping and tokenization.
//! - [`grammar`]: recursive-descent parser for arguments, arrays and
//!   nested annotations.

mod grammar;
mod scanner;

use crate::error::Result;
use crate::node::AnnotationNode;

pub use grammar::MAX_NESTING;

/// File label used when a docblock does not come from a file.
pub const EVAL_CODE: &str = "eval code";

/// Parse the annotations of one docblock.
///
/// `line` is the line the comment starts on; each node records the line
/// its `@` appears on.  Comments with fewer than two characters after
/// the opening marker yield no annotations.  Argument lists and arrays
/// nested deeper than [`MAX_NESTING`] are a syntax error.
pub fn parse(comment: &str, file: &str, line: u32) -> Result<Vec<AnnotationNode>> {
    let body = comment.strip_prefix("/**").unwrap_or(comment);
    if body.len() < 2 {
        return Ok(Vec::new());
    }
    let body = body.strip_suffix("*/").unwrap_or(body);

    let cleaned = strip_comment_separators(body);
    grammar::Parser::new(&cleaned, file, line).parse_all()
}

/// Blank out the leading `*` run of every line so that line numbers and
/// columns still match the source.
fn strip_comment_separators(body: &str) -> String {
    let mut cleaned = String::with_capacity(body.len());
    for (i, line) in body.split('\n').enumerate() {
        if i > 0 {
            cleaned.push('\n');
        }
        let trimmed = line.trim_start();
        if trimmed.starts_with('*') {
            let indent = line.len() - trimmed.len();
            let after_stars = trimmed.trim_start_matches('*');
            let stars = trimmed.len() - after_stars.len();
            cleaned.extend(std::iter::repeat_n(' ', indent + stars));
            cleaned.push_str(after_stars);
        } else {
            cleaned.push_str(line);
        }
    }
    cleaned
}
