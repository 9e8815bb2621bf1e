//! Streaming reader for `;`-terminated SQL statements.
//!
//! Comments are dropped from the returned statements. Semicolons inside
//! quoted strings, quoted identifiers, comments and PostgreSQL dollar-quoted
//! bodies do not terminate a statement.


use once_cell::sync::Lazy;
use regex::bytes::Regex;
use std::io::{BufRead, BufReader, Read};

pub const SMALL_BUFFER_SIZE: usize = 64 * 1024;
pub const MEDIUM_BUFFER_SIZE: usize = 256 * 1024;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatementType {
    Unknown,
    CreateTable,
    AlterTable,
    CreateIndex,
}

static CREATE_TABLE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^\s*CREATE\s+(?:(?:GLOBAL|LOCAL)\s+)?(?:(?:TEMP|TEMPORARY|UNLOGGED)\s+)?TABLE\s+(?:IF\s+NOT\s+EXISTS\s+)?").unwrap()
});

static ALTER_TABLE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^\s*ALTER\s+TABLE\s+(?:IF\s+EXISTS\s+)?(?:ONLY\s+)?").unwrap()
});

/// `COPY ... FROM stdin;` is followed by data rows up to a `\.` line
static COPY_FROM_STDIN_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^\s*COPY\s+[^;]*\bFROM\s+stdin\b").unwrap());

static CREATE_INDEX_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?i)^\s*CREATE\s+(?:UNIQUE\s+)?(?:CLUSTERED\s+|NONCLUSTERED\s+)?INDEX\b[^;]*?\bON\s+(?:ONLY\s+)?"#).unwrap()
});

/// Lexical context carried across lines
#[derive(Debug, Clone, PartialEq, Eq)]
enum Lexical {
    Code,
    SingleQuote,
    DoubleQuote,
    Backtick,
    LineComment,
    BlockComment,
    /// Inside `$tag$ ... $tag$`; holds the full delimiter
    Dollar(Vec<u8>),
}

pub struct Parser<R: Read> {
    reader: BufReader<R>,
    line: Vec<u8>,
    pos: usize,
    stmt_buffer: Vec<u8>,
    state: Lexical,
    in_copy_data: bool,
}

impl<R: Read> Parser<R> {
    pub fn new(reader: R, buffer_size: usize) -> Self {
        Self {
            reader: BufReader::with_capacity(buffer_size, reader),
            line: Vec::with_capacity(4 * 1024),
            pos: 0,
            stmt_buffer: Vec::with_capacity(32 * 1024),
            state: Lexical::Code,
            in_copy_data: false,
        }
    }

    /// Next statement including its terminating `;`, or the trailing text
    /// without one at end of input. Empty statements and the data rows of
    /// `COPY ... FROM stdin` are skipped.
    pub fn read_statement(&mut self) -> std::io::Result<Option<Vec<u8>>> {
        loop {
            if self.pos >= self.line.len() {
                self.line.clear();
                self.pos = 0;
                if self.reader.read_until(b'\n', &mut self.line)? == 0 {
                    self.state = Lexical::Code;
                    let rest = std::mem::take(&mut self.stmt_buffer);
                    if is_blank(&rest) {
                        return Ok(None);
                    }
                    return Ok(Some(rest));
                }
                if self.in_copy_data {
                    if is_copy_terminator(&self.line) {
                        self.in_copy_data = false;
                    }
                    self.pos = self.line.len();
                    continue;
                }
            }

            if self.scan_line() {
                let stmt = std::mem::take(&mut self.stmt_buffer);
                if is_blank(&stmt[..stmt.len() - 1]) {
                    continue;
                }
                self.in_copy_data = COPY_FROM_STDIN_RE.is_match(&stmt);
                return Ok(Some(stmt));
            }
        }
    }

    /// Consume the current line from `pos`. Returns true when a terminator
    /// was pushed; `pos` then points just past it.
    fn scan_line(&mut self) -> bool {
        let line = &self.line;
        let out = &mut self.stmt_buffer;
        let mut i = self.pos;

        while i < line.len() {
            let b = line[i];
            let next = line.get(i + 1).copied();

            match &self.state {
                Lexical::Code => match b {
                    b'\'' => {
                        out.push(b);
                        self.state = Lexical::SingleQuote;
                    }
                    b'"' => {
                        out.push(b);
                        self.state = Lexical::DoubleQuote;
                    }
                    b'`' => {
                        out.push(b);
                        self.state = Lexical::Backtick;
                    }
                    b'-' if next == Some(b'-') => {
                        self.state = Lexical::LineComment;
                        i += 1;
                    }
                    b'/' if next == Some(b'*') => {
                        self.state = Lexical::BlockComment;
                        i += 1;
                    }
                    b'$' => match dollar_tag(line, i) {
                        Some(tag) => {
                            out.extend_from_slice(&tag);
                            i += tag.len() - 1;
                            self.state = Lexical::Dollar(tag);
                        }
                        None => out.push(b),
                    },
                    b';' => {
                        out.push(b);
                        self.pos = i + 1;
                        return true;
                    }
                    _ => out.push(b),
                },
                Lexical::SingleQuote => {
                    out.push(b);
                    if b == b'\\' {
                        if let Some(escaped) = next {
                            out.push(escaped);
                            i += 1;
                        }
                    } else if b == b'\'' {
                        self.state = Lexical::Code;
                    }
                }
                Lexical::DoubleQuote => {
                    out.push(b);
                    if b == b'"' {
                        self.state = Lexical::Code;
                    }
                }
                Lexical::Backtick => {
                    out.push(b);
                    if b == b'`' {
                        self.state = Lexical::Code;
                    }
                }
                Lexical::LineComment => {
                    if b == b'\n' {
                        out.push(b);
                        self.state = Lexical::Code;
                    }
                }
                Lexical::BlockComment => {
                    if b == b'*' && next == Some(b'/') {
                        out.push(b' ');
                        i += 1;
                        self.state = Lexical::Code;
                    }
                }
                Lexical::Dollar(tag) => {
                    if line[i..].starts_with(tag) {
                        let len = tag.len();
                        out.extend_from_slice(&line[i..i + len]);
                        i += len - 1;
                        self.state = Lexical::Code;
                    } else {
                        out.push(b);
                    }
                }
            }

            i += 1;
        }

        self.pos = line.len();
        false
    }

    /// Classify a statement and extract the table it applies to
    pub fn parse_statement(stmt: &[u8]) -> (StatementType, String) {
        let classified = [
            (StatementType::CreateTable, &*CREATE_TABLE_RE),
            (StatementType::AlterTable, &*ALTER_TABLE_RE),
            (StatementType::CreateIndex, &*CREATE_INDEX_RE),
        ];

        for (typ, re) in classified {
            if let Some(m) = re.find(stmt) {
                if let Some(name) = extract_table_name(stmt, m.end()) {
                    return (typ, name);
                }
            }
        }

        (StatementType::Unknown, String::new())
    }
}

/// `$tag$` delimiter starting at `start`. Tags follow identifier rules, so
/// positional parameters such as `$1` are not delimiters.
fn dollar_tag(line: &[u8], start: usize) -> Option<Vec<u8>> {
    if start > 0 && is_ident_byte(line[start - 1]) {
        return None;
    }
    let mut j = start + 1;
    if line.get(j).is_some_and(|b| b.is_ascii_digit()) {
        return None;
    }
    while j < line.len() && is_ident_byte(line[j]) {
        j += 1;
    }
    (line.get(j) == Some(&b'$')).then(|| line[start..=j].to_vec())
}

#[inline]
fn is_ident_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_'
}

/// `\.` on a line of its own ends COPY data
#[inline]
fn is_copy_terminator(line: &[u8]) -> bool {
    let end = line
        .iter()
        .rposition(|&b| !is_whitespace(b))
        .map_or(0, |i| i + 1);
    let start = line.iter().position(|&b| !is_whitespace(b)).unwrap_or(end);
    &line[start..end] == b"\\."
}

#[inline]
fn is_blank(data: &[u8]) -> bool {
    data.iter().all(|&b| is_whitespace(b))
}

/// Table name at `offset`, with any schema qualifier dropped
#[inline]
fn extract_table_name(stmt: &[u8], offset: usize) -> Option<String> {
    let mut i = offset;
    let mut name = None;

    loop {
        while i < stmt.len() && is_whitespace(stmt[i]) {
            i += 1;
        }
        if i >= stmt.len() {
            return name;
        }

        let (part, end) = match stmt[i] {
            q @ (b'`' | b'"' | b'[') => {
                let close = if q == b'[' { b']' } else { q };
                let start = i + 1;
                let len = stmt[start..].iter().position(|&b| b == close)?;
                (&stmt[start..start + len], start + len + 1)
            }
            _ => {
                let start = i;
                let len = stmt[start..]
                    .iter()
                    .position(|&b| is_whitespace(b) || matches!(b, b'(' | b';' | b',' | b'.'))
                    .unwrap_or(stmt.len() - start);
                (&stmt[start..start + len], start + len)
            }
        };

        if part.is_empty() {
            return name;
        }
        name = Some(String::from_utf8_lossy(part).into_owned());

        if stmt.get(end) == Some(&b'.') {
            i = end + 1;
        } else {
            return name;
        }
    }
}

#[inline]
fn is_whitespace(b: u8) -> bool {
    matches!(b, b' ' | b'\t' | b'\n' | b'\r')
}

pub fn determine_buffer_size(file_size: u64) -> usize {
    if file_size > 1024 * 1024 * 1024 {
        MEDIUM_BUFFER_SIZE
    } else {
        SMALL_BUFFER_SIZE
    }
}
