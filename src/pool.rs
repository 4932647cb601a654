//! Thread-local parser pooling for performance optimization.
//!
//! Eliminates redundant parser creation by maintaining a thread-local
//! reusable parser. Creates a new parser on first use per thread, reuses
//! it for subsequent operations.

use crate::tree::{ParseError, TsParser};
use std::cell::RefCell;

thread_local! {
    static TS_PARSER: RefCell<Option<TsParser>> = const { RefCell::new(None) };
}

/// Execute function with a pooled parser instance.
///
/// # Example
///
/// ```no_run
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// use ast_surgeon::pool::with_parser;
///
/// let file = with_parser(|parser| parser.parse("a.ts", "const x = 1;"))??;
/// # Ok(())
/// # }
/// ```
pub fn with_parser<F, R>(f: F) -> Result<R, ParseError>
where
    F: FnOnce(&mut TsParser) -> R,
{
    TS_PARSER.with(|cell| {
        let mut opt = cell.borrow_mut();
        if opt.is_none() {
            *opt = Some(TsParser::new()?);
        }
        Ok(f(opt.as_mut().expect("parser was just initialized above")))
    })
}
