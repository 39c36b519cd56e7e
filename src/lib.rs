/*!
`coltok` tokenizes delimited table text (CSV, TSV and friends) into
compact per-column byte buffers.

Unlike a record-oriented CSV reader, the tokenizer writes output
column-wise: one growing byte buffer per selected column, each field
terminated by a 0x00 byte, with an empty field stored as the marker byte
0x01. That layout is what downstream typed converters consume when turning
a whole column into integers or doubles at once, and it is exposed
directly through [`FieldIter`] and the [`to_long`]/[`to_double`] helpers.

The parser is a seven-state machine driven one code point at a time, so
the delimiter, comment and quote characters may be any Unicode code
point. Comment lines, quoted fields, whitespace stripping around lines
and fields, column exclusion and padding of short rows are all handled
during the single pass.

# Example

Tokenize a small table: one header pass to learn the column names, then
one data pass.

```
# fn example() -> coltok::Result<()> {
use coltok::Tokenizer;

let source = b"A,B,C\n10,5.,6\n1,2,3\n";

let mut tok = Tokenizer::new();
tok.tokenize_header(source, 0)?;
let names: Vec<&[u8]> = tok.header_fields().collect();
assert_eq!(names, vec![&b"A"[..], &b"B"[..], &b"C"[..]]);

tok.set_num_cols(names.len());
tok.tokenize(source, &[true, true, true], 1)?;
assert_eq!(tok.num_rows(), 2);

let a: Vec<&[u8]> = tok.column_fields(0).collect();
assert_eq!(a, vec![&b"10"[..], &b"1"[..]]);
assert_eq!(coltok::to_long(a[0])?, 10);
# Ok(())
# }
# example().unwrap();
```

The source is borrowed for the duration of a pass and never modified. By
convention it ends with a newline; a final record not terminated by one
is dropped.
*/

#![deny(missing_docs)]

pub use crate::column::FieldIter;
pub use crate::convert::{to_double, to_long};
pub use crate::error::{Error, ErrorKind, Result};
pub use crate::tokenizer::{Tokenizer, TokenizerBuilder};

mod column;
mod convert;
mod decode;
mod error;
mod tokenizer;
