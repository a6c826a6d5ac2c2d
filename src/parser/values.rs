// VALUES tokenizer: turns `(v1,v2,...),(v1,v2,...)` into decoded rows.
// Single left-to-right scan with an explicit {Default, InString} state and a
// paren depth counter. Malformed input yields whatever rows were closed.

use crate::parser::Row;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Default,
    InString,
}

// Result of scanning one blob. `balanced` is false when the scan ended inside a
// string literal or with unclosed parentheses; the rows are still usable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TupleScan {
    pub rows: Vec<Row>,
    pub balanced: bool,
}

// Parse a VALUES blob into rows (lenient).
pub fn parse_values_blob(blob: &str) -> Vec<Row> {
    scan_values(blob).rows
}

pub fn scan_values(blob: &str) -> TupleScan {
    let mut rows: Vec<Row> = Vec::new();
    let mut row: Row = Vec::new();
    let mut field = String::new();
    let mut quoted = false;
    let mut depth: i32 = 0;
    let mut state = State::Default;

    let mut chars = blob.chars().peekable();
    while let Some(c) = chars.next() {
        if state == State::InString {
            match c {
                '\\' => match chars.next() {
                    Some(esc) => field.push(unescape(esc)),
                    // Dangling backslash at end of input.
                    None => field.push('\\'),
                },
                '\'' => {
                    if chars.peek() == Some(&'\'') {
                        chars.next();
                        field.push('\'');
                    } else {
                        state = State::Default;
                    }
                }
                _ => field.push(c),
            }
            continue;
        }

        match c {
            '\'' => {
                state = State::InString;
                quoted = true;
            }
            '(' => {
                if depth == 0 {
                    row = Vec::new();
                    field.clear();
                    quoted = false;
                } else {
                    field.push(c);
                }
                depth += 1;
            }
            ')' => {
                depth -= 1;
                if depth == 0 {
                    row.push(finish_field(&mut field, &mut quoted));
                    rows.push(std::mem::take(&mut row));
                } else {
                    field.push(c);
                }
            }
            ',' if depth == 1 => row.push(finish_field(&mut field, &mut quoted)),
            ';' if depth == 0 => {}
            _ => field.push(c),
        }
    }

    TupleScan {
        rows,
        balanced: depth == 0 && state == State::Default,
    }
}

fn finish_field(field: &mut String, quoted: &mut bool) -> String {
    let text = sql_token_to_text(field, *quoted);
    field.clear();
    *quoted = false;
    text
}

// Map a raw field buffer to its text value: trimmed, and a bare NULL -> "".
// Numbers stay text. A quoted 'NULL' is a string, not the SQL literal.
pub fn sql_token_to_text(raw: &str, quoted: bool) -> String {
    let token = raw.trim();
    if !quoted && token.eq_ignore_ascii_case("NULL") {
        String::new()
    } else {
        token.to_string()
    }
}

fn unescape(c: char) -> char {
    match c {
        'n' => '\n',
        'r' => '\r',
        't' => '\t',
        // ', ", \ and anything else stand for themselves.
        other => other,
    }
}
