use memchr::memchr;

use crate::column::{ColumnBuffer, FieldIter};
use crate::decode::decode;
use crate::error::{new_error, ErrorKind, Result};

/// Builds a tokenizer with various configuration knobs.
///
/// This builder can be used to tweak the field delimiter, the comment and
/// quote characters, and the whitespace policies. Once a `Tokenizer` is
/// built, its configuration cannot be changed.
#[derive(Clone, Debug)]
pub struct TokenizerBuilder {
    delimiter: char,
    comment: Option<char>,
    quote: Option<char>,
    fill_extra_cols: bool,
    strip_whitespace_lines: bool,
    strip_whitespace_fields: bool,
}

impl Default for TokenizerBuilder {
    fn default() -> TokenizerBuilder {
        TokenizerBuilder {
            delimiter: ',',
            comment: None,
            quote: Some('"'),
            fill_extra_cols: false,
            strip_whitespace_lines: true,
            strip_whitespace_fields: true,
        }
    }
}

impl TokenizerBuilder {
    /// Create a new builder.
    pub fn new() -> TokenizerBuilder {
        TokenizerBuilder::default()
    }

    /// The code point that separates fields on a row.
    ///
    /// The default is `,`. Any code point may be used, including a
    /// multi-byte one.
    pub fn delimiter(&mut self, delimiter: char) -> &mut TokenizerBuilder {
        self.delimiter = delimiter;
        self
    }

    /// The code point that opens a comment line, if any.
    ///
    /// A line whose first code point (after leading whitespace, when line
    /// stripping is enabled) is the comment character is discarded up to
    /// its newline. Disabled by default.
    pub fn comment(&mut self, comment: Option<char>) -> &mut TokenizerBuilder {
        self.comment = comment;
        self
    }

    /// The code point that toggles literal inclusion of delimiters, if
    /// any.
    ///
    /// The default is `"`.
    pub fn quote(&mut self, quote: Option<char>) -> &mut TokenizerBuilder {
        self.quote = quote;
        self
    }

    /// Pad rows with too few fields with empty fields instead of
    /// returning an error.
    ///
    /// This is disabled by default.
    pub fn fill_extra_cols(&mut self, yes: bool) -> &mut TokenizerBuilder {
        self.fill_extra_cols = yes;
        self
    }

    /// Strip whitespace at the beginning and end of lines.
    ///
    /// This is enabled by default.
    pub fn strip_whitespace_lines(&mut self, yes: bool) -> &mut TokenizerBuilder {
        self.strip_whitespace_lines = yes;
        self
    }

    /// Strip whitespace at the beginning and end of fields.
    ///
    /// This is enabled by default.
    pub fn strip_whitespace_fields(&mut self, yes: bool) -> &mut TokenizerBuilder {
        self.strip_whitespace_fields = yes;
        self
    }

    /// Build a tokenizer from this configuration.
    pub fn build(&self) -> Tokenizer {
        Tokenizer {
            delimiter: self.delimiter as u32,
            comment: self.comment.map(|c| c as u32),
            quote: self.quote.map(|c| c as u32),
            fill_extra_cols: self.fill_extra_cols,
            strip_whitespace_lines: self.strip_whitespace_lines,
            strip_whitespace_fields: self.strip_whitespace_fields,
            header: ColumnBuffer::empty(),
            cols: Vec::new(),
            num_cols: 0,
            num_rows: 0,
            line: 1,
        }
    }
}

/// The tokenizer states. `StartLine` is entered at the beginning of every
/// pass and after every completed line.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
enum State {
    StartLine,
    StartField,
    StartQuotedField,
    Field,
    QuotedField,
    QuotedFieldNewline,
    Comment,
}

/// Where a pass writes its output.
#[derive(Clone, Copy)]
enum Mode<'a> {
    /// One shared buffer for every header field, in encounter order.
    Header,
    /// One buffer per included column; `use_cols[real_col]` gates writes.
    Data { use_cols: &'a [bool] },
}

/// A column-wise tokenizer for delimited table text.
///
/// The tokenizer consumes a UTF-8 source buffer one code point at a time
/// and appends each selected column's fields to a compact per-column byte
/// buffer, each field terminated by a 0x00 byte. Downstream typed
/// converters read those buffers back through [`FieldIter`].
///
/// A tokenizer may be reused: each pass releases the buffers of the
/// previous one. The source is borrowed only for the duration of a pass,
/// and is never modified.
///
/// By convention a source ends with a newline; a final record not
/// terminated by one is dropped.
#[derive(Clone, Debug)]
pub struct Tokenizer {
    delimiter: u32,
    comment: Option<u32>,
    quote: Option<u32>,
    fill_extra_cols: bool,
    strip_whitespace_lines: bool,
    strip_whitespace_fields: bool,
    /// Header fields, in encounter order.
    header: ColumnBuffer,
    /// One output buffer per declared column.
    cols: Vec<ColumnBuffer>,
    num_cols: usize,
    num_rows: usize,
    /// The current line number, measured by newlines consumed.
    line: u64,
}

impl Default for Tokenizer {
    fn default() -> Tokenizer {
        Tokenizer::new()
    }
}

/// Structural whitespace inside a line.
///
/// Full scalar comparison, so a multi-byte code point whose low byte
/// happens to coincide with 0x20 or 0x09 is never misclassified.
fn is_whitespace(c: u32) -> bool {
    c == ' ' as u32 || c == '\t' as u32
}

fn is_newline(c: u32) -> bool {
    c == '\n' as u32
}

/// Advance past `skip_rows` complete lines, returning the offset of the
/// first unskipped byte.
///
/// A line only counts as complete if its newline is not the final byte of
/// the source, so the conventional trailing newline never satisfies a
/// skip. `None` means the source ran out first.
fn skip_lines(source: &[u8], skip_rows: usize) -> Option<usize> {
    let mut pos = 0;
    let last = source.len().saturating_sub(1);
    for _ in 0..skip_rows {
        match memchr(b'\n', &source[pos..]) {
            Some(i) if pos + i < last => pos += i + 1,
            _ => return None,
        }
    }
    Some(pos)
}

impl Tokenizer {
    /// Create a tokenizer with the default configuration.
    pub fn new() -> Tokenizer {
        TokenizerBuilder::new().build()
    }

    /// Declare the number of output columns for subsequent data passes.
    ///
    /// Typically this is the number of names found by a header pass.
    pub fn set_num_cols(&mut self, num_cols: usize) {
        self.num_cols = num_cols;
    }

    /// The declared number of output columns.
    pub fn num_cols(&self) -> usize {
        self.num_cols
    }

    /// The number of data rows completed by the last pass.
    ///
    /// Skipped lines, comment lines and the header line never count.
    pub fn num_rows(&self) -> usize {
        self.num_rows
    }

    /// The line number reached by the last pass, as measured by the
    /// number of newlines consumed. Line numbers start at `1` and skipped
    /// lines count.
    pub fn line(&self) -> u64 {
        self.line
    }

    /// Tokenize the header line of `source`.
    ///
    /// `skip_rows` complete lines are skipped first, then exactly one
    /// line is tokenized into the header buffer. Returns
    /// [`ErrorKind::InvalidLine`](crate::ErrorKind::InvalidLine) if the
    /// source ends before the skipped lines do.
    pub fn tokenize_header(&mut self, source: &[u8], skip_rows: usize) -> Result<()> {
        self.header = ColumnBuffer::empty();
        self.num_rows = 0;
        self.line = 1;
        let pos = match skip_lines(source, skip_rows) {
            Some(pos) => pos,
            None => return Err(new_error(ErrorKind::InvalidLine)),
        };
        self.line += skip_rows as u64;
        self.header = ColumnBuffer::new();
        self.run(source, pos, Mode::Header)
    }

    /// Tokenize the data rows of `source` into per-column buffers.
    ///
    /// `use_cols` holds one include flag per real column of the input;
    /// the number of `true` flags should equal the declared column count.
    /// `skip_rows` complete lines are skipped first; a source that ends
    /// during the skip yields `Ok` with zero rows.
    pub fn tokenize(
        &mut self,
        source: &[u8],
        use_cols: &[bool],
        skip_rows: usize,
    ) -> Result<()> {
        self.cols.clear();
        self.num_rows = 0;
        self.line = 1;
        let pos = match skip_lines(source, skip_rows) {
            Some(pos) => pos,
            None => return Ok(()),
        };
        self.line += skip_rows as u64;
        self.cols = (0..self.num_cols).map(|_| ColumnBuffer::new()).collect();
        self.run(source, pos, Mode::Data { use_cols })
    }

    /// Iterate the header fields found by the last header pass.
    pub fn header_fields(&self) -> FieldIter {
        self.header.fields()
    }

    /// Iterate the fields of output column `col`.
    ///
    /// # Panics
    ///
    /// Panics when `col` is not less than the number of columns of the
    /// last data pass.
    pub fn column_fields(&self, col: usize) -> FieldIter {
        self.cols[col].fields()
    }

    /// Drive the state machine from `pos` until the source is exhausted
    /// or, in header mode, one line has been completed.
    fn run(&mut self, source: &[u8], mut pos: usize, mode: Mode) -> Result<()> {
        let mut state = State::StartLine;
        let mut col = 0;
        let mut real_col = 0;
        // Whether the current field is still all whitespace, so that a
        // comment character preceded only by whitespace opens a comment
        // even when stripping is disabled.
        let mut ws_only = true;
        let mut done = false;

        while pos < source.len() && !done {
            let (c, len) = decode(&source[pos..]);
            // A state change may ask to re-examine the same code point.
            let mut repeat = true;
            while repeat && !done {
                repeat = false;
                match state {
                    State::StartLine => {
                        if is_newline(c)
                            || (is_whitespace(c) && self.strip_whitespace_lines)
                        {
                        } else if self.comment == Some(c) {
                            state = State::Comment;
                        } else {
                            col = 0;
                            real_col = 0;
                            state = State::StartField;
                            ws_only = true;
                            repeat = true;
                        }
                    }

                    State::StartField => {
                        if is_whitespace(c) && self.strip_whitespace_fields {
                            // leading whitespace
                        } else if !self.strip_whitespace_lines
                            && self.comment == Some(c)
                        {
                            // comment not caught at line start because no
                            // stripping
                            state = State::Comment;
                        } else if c == self.delimiter {
                            // field ends before it begins
                            self.end_field(mode, &mut col, &mut real_col)?;
                            state = State::StartField;
                            ws_only = true;
                        } else if is_newline(c) {
                            // '1,2, ' carries a trailing empty field, while
                            // a whitespace delimiter leaves only padding
                            if self.strip_whitespace_lines
                                && !is_whitespace(self.delimiter)
                            {
                                self.end_field(mode, &mut col, &mut real_col)?;
                            }
                            done = self.end_line(mode, &mut col, &mut real_col)?;
                            state = State::StartLine;
                        } else if self.quote == Some(c) {
                            state = State::StartQuotedField;
                        } else {
                            state = State::Field;
                            repeat = true;
                        }
                    }

                    State::StartQuotedField => {
                        if is_whitespace(c) && self.strip_whitespace_fields {
                            // leading whitespace inside the quotes
                        } else if self.quote == Some(c) {
                            // empty quotes
                            self.end_field(mode, &mut col, &mut real_col)?;
                        } else {
                            state = State::QuotedField;
                            repeat = true;
                        }
                    }

                    State::Field => {
                        if self.comment == Some(c) && ws_only && col == 0 {
                            // comment found before any data, e.g. '  # x'
                            state = State::Comment;
                        } else if c == self.delimiter {
                            self.end_field(mode, &mut col, &mut real_col)?;
                            state = State::StartField;
                            ws_only = true;
                        } else if is_newline(c) {
                            self.end_field(mode, &mut col, &mut real_col)?;
                            done = self.end_line(mode, &mut col, &mut real_col)?;
                            state = State::StartLine;
                        } else {
                            if !is_whitespace(c) {
                                ws_only = false;
                            }
                            self.push(mode, col, real_col, &source[pos..pos + len]);
                        }
                    }

                    State::QuotedField => {
                        if self.quote == Some(c) {
                            // closing quote; the rest of the field parses
                            // unquoted
                            state = State::Field;
                        } else if is_newline(c) {
                            state = State::QuotedFieldNewline;
                        } else {
                            self.push(mode, col, real_col, &source[pos..pos + len]);
                        }
                    }

                    State::QuotedFieldNewline => {
                        if is_newline(c)
                            || (is_whitespace(c) && self.strip_whitespace_lines)
                        {
                            // newlines and leading continuation whitespace
                        } else if self.quote == Some(c) {
                            state = State::Field;
                        } else {
                            state = State::QuotedField;
                            repeat = true;
                        }
                    }

                    State::Comment => {
                        if is_newline(c) {
                            state = State::StartLine;
                        }
                    }
                }
            }
            if is_newline(c) {
                self.line += 1;
            }
            pos += len;
        }
        Ok(())
    }

    /// Append payload bytes to the current output target.
    ///
    /// In data mode the write is dropped for excluded columns and for
    /// columns past the declared count; the column-count error surfaces
    /// at the end of the field instead.
    fn push(&mut self, mode: Mode, col: usize, real_col: usize, bytes: &[u8]) {
        match mode {
            Mode::Header => self.header.push(bytes),
            Mode::Data { use_cols } => {
                if col < self.num_cols
                    && use_cols.get(real_col).copied().unwrap_or(false)
                {
                    self.cols[col].push(bytes);
                }
            }
        }
    }

    /// Complete the field accumulating at the output cursor.
    ///
    /// `col` counts included columns only; `real_col` counts every column
    /// of the input and indexes the include flags.
    fn end_field(&mut self, mode: Mode, col: &mut usize, real_col: &mut usize) -> Result<()> {
        match mode {
            Mode::Header => {
                self.header.end_field(self.strip_whitespace_fields);
            }
            Mode::Data { use_cols } => {
                if *real_col >= use_cols.len() {
                    return Err(new_error(ErrorKind::TooManyCols { line: self.line }));
                }
                if use_cols[*real_col] {
                    if let Some(buf) = self.cols.get_mut(*col) {
                        buf.end_field(self.strip_whitespace_fields);
                    }
                    *col += 1;
                    if *col > self.num_cols {
                        return Err(new_error(ErrorKind::TooManyCols {
                            line: self.line,
                        }));
                    }
                }
                *real_col += 1;
            }
        }
        Ok(())
    }

    /// Complete the current row.
    ///
    /// Returns `true` when the pass is finished, which happens after one
    /// line in header mode. In data mode a short row is padded with empty
    /// fields when filling is enabled, and is an error otherwise.
    fn end_line(&mut self, mode: Mode, col: &mut usize, real_col: &mut usize) -> Result<bool> {
        match mode {
            Mode::Header => Ok(true),
            Mode::Data { .. } => {
                if self.fill_extra_cols {
                    while *col < self.num_cols {
                        self.push(mode, *col, *real_col, &[0x01]);
                        self.end_field(mode, col, real_col)?;
                    }
                } else if *col < self.num_cols {
                    return Err(new_error(ErrorKind::NotEnoughCols {
                        line: self.line,
                    }));
                }
                self.num_rows += 1;
                Ok(false)
            }
        }
    }
}
