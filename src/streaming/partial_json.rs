//! Tolerant parsing of incomplete JSON
//!
//! Model output arrives a few characters at a time, so the accumulated text
//! is almost never valid JSON until the very end. [`parse_partial_json`]
//! first tries a strict parse and, if that fails, closes whatever is still
//! open (strings, objects, arrays, literals) with [`fix_json`] and parses the
//! result.
//!
//! # Examples
//!
//! ```rust,ignore
//! use siumai_object::streaming::{parse_partial_json, ParseState};
//!
//! let parsed = parse_partial_json(r#"{"content": "Hello, wor"#);
//! assert_eq!(parsed.state, ParseState::RepairedParse);
//! assert_eq!(parsed.value.unwrap()["content"], "Hello, wor");
//! ```

use serde_json::Value;

/// How a value was obtained from the text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseState {
    /// The text is complete, strictly valid JSON.
    SuccessfulParse,
    /// The text only parsed after closing unterminated structures.
    RepairedParse,
    /// No value could be obtained.
    FailedParse,
}

/// Best-effort value parsed from a growing buffer.
#[derive(Debug, Clone, PartialEq)]
pub struct PartialJson {
    /// Parsed value, if any.
    pub value: Option<Value>,
    /// Completeness classification.
    pub state: ParseState,
}

impl PartialJson {
    /// Whether the text was complete, strictly valid JSON.
    pub fn is_complete(&self) -> bool {
        self.state == ParseState::SuccessfulParse
    }
}

/// Parse `text` strictly, falling back to [`fix_json`] repair.
pub fn parse_partial_json(text: &str) -> PartialJson {
    if let Ok(value) = serde_json::from_str::<Value>(text) {
        return PartialJson {
            value: Some(value),
            state: ParseState::SuccessfulParse,
        };
    }

    let fixed = fix_json(text);
    match serde_json::from_str::<Value>(&fixed) {
        Ok(value) => PartialJson {
            value: Some(value),
            state: ParseState::RepairedParse,
        },
        Err(e) => {
            tracing::trace!("partial JSON not parseable yet: {}", e);
            PartialJson {
                value: None,
                state: ParseState::FailedParse,
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Root,
    Finish,
    InsideString,
    InsideStringEscape,
    /// Inside `\uXXXX`, with the hex digits read so far.
    InsideStringUnicode { digits: u8, code: u16 },
    InsideLiteral,
    InsideNumber,
    InsideObjectStart,
    InsideObjectKey,
    InsideObjectAfterKey,
    InsideObjectBeforeValue,
    InsideObjectAfterValue,
    InsideObjectAfterComma,
    InsideArrayStart,
    InsideArrayAfterValue,
    InsideArrayAfterComma,
}

const LITERALS: [&str; 3] = ["true", "false", "null"];

struct Scanner<'a> {
    input: &'a str,
    stack: Vec<State>,
    /// Byte offset just past the last character that can be kept.
    last_valid_end: usize,
    literal_start: usize,
}

impl<'a> Scanner<'a> {
    fn new(input: &'a str) -> Self {
        Self {
            input,
            stack: vec![State::Root],
            last_valid_end: 0,
            literal_start: 0,
        }
    }

    fn top(&self) -> Option<State> {
        self.stack.last().copied()
    }

    fn swap(&mut self, state: State) {
        self.stack.pop();
        self.stack.push(state);
    }

    fn value_start(&mut self, ch: char, start: usize, end: usize, after: State) {
        let next = match ch {
            '"' => State::InsideString,
            't' | 'f' | 'n' => {
                self.literal_start = start;
                State::InsideLiteral
            }
            '-' => {
                // a lone minus sign is not a number yet
                self.swap(after);
                self.stack.push(State::InsideNumber);
                return;
            }
            '0'..='9' => State::InsideNumber,
            '{' => State::InsideObjectStart,
            '[' => State::InsideArrayStart,
            _ => return,
        };
        self.last_valid_end = end;
        self.swap(after);
        self.stack.push(next);
    }

    fn after_object_value(&mut self, ch: char, end: usize) {
        match ch {
            ',' => self.swap(State::InsideObjectAfterComma),
            '}' => {
                self.last_valid_end = end;
                self.stack.pop();
            }
            _ => {}
        }
    }

    fn after_array_value(&mut self, ch: char, end: usize) {
        match ch {
            ',' => self.swap(State::InsideArrayAfterComma),
            ']' => {
                self.last_valid_end = end;
                self.stack.pop();
            }
            _ => {}
        }
    }

    /// Leave a number or literal and hand `ch` to the enclosing container.
    fn close_scalar(&mut self, ch: char, end: usize) {
        self.stack.pop();
        match self.top() {
            Some(State::InsideObjectAfterValue) => self.after_object_value(ch, end),
            Some(State::InsideArrayAfterValue) => self.after_array_value(ch, end),
            _ => {}
        }
    }

    fn step(&mut self, start: usize, ch: char) {
        let end = start + ch.len_utf8();
        let Some(state) = self.top() else { return };

        match state {
            State::Root => self.value_start(ch, start, end, State::Finish),
            State::Finish => {}
            State::InsideObjectStart => match ch {
                '"' => self.swap(State::InsideObjectKey),
                '}' => {
                    self.last_valid_end = end;
                    self.stack.pop();
                }
                _ => {}
            },
            State::InsideObjectAfterComma => {
                if ch == '"' {
                    self.swap(State::InsideObjectKey);
                }
            }
            State::InsideObjectKey => {
                if ch == '"' {
                    self.swap(State::InsideObjectAfterKey);
                }
            }
            State::InsideObjectAfterKey => {
                if ch == ':' {
                    self.swap(State::InsideObjectBeforeValue);
                }
            }
            State::InsideObjectBeforeValue => {
                self.value_start(ch, start, end, State::InsideObjectAfterValue)
            }
            State::InsideObjectAfterValue => self.after_object_value(ch, end),
            State::InsideString => match ch {
                '"' => {
                    self.stack.pop();
                    self.last_valid_end = end;
                }
                '\\' => self.stack.push(State::InsideStringEscape),
                _ => self.last_valid_end = end,
            },
            State::InsideStringEscape => {
                if ch == 'u' {
                    self.swap(State::InsideStringUnicode { digits: 0, code: 0 });
                } else {
                    self.stack.pop();
                    self.last_valid_end = end;
                }
            }
            State::InsideStringUnicode { digits, code } => match ch.to_digit(16) {
                Some(hex) if digits < 3 => self.swap(State::InsideStringUnicode {
                    digits: digits + 1,
                    code: (code << 4) | hex as u16,
                }),
                Some(hex) => {
                    self.stack.pop();
                    let code = (code << 4) | hex as u16;
                    // a high surrogate is kept only together with its pair
                    if !(0xD800..=0xDBFF).contains(&code) {
                        self.last_valid_end = end;
                    }
                }
                None => {
                    self.stack.pop();
                }
            },
            State::InsideArrayStart => {
                if ch == ']' {
                    self.last_valid_end = end;
                    self.stack.pop();
                } else {
                    self.last_valid_end = end;
                    self.value_start(ch, start, end, State::InsideArrayAfterValue);
                }
            }
            State::InsideArrayAfterValue => match ch {
                ',' => self.swap(State::InsideArrayAfterComma),
                ']' => {
                    self.last_valid_end = end;
                    self.stack.pop();
                }
                _ => self.last_valid_end = end,
            },
            State::InsideArrayAfterComma => {
                self.value_start(ch, start, end, State::InsideArrayAfterValue)
            }
            State::InsideNumber => match ch {
                '0'..='9' => self.last_valid_end = end,
                'e' | 'E' | '-' | '.' => {}
                ',' | '}' | ']' => self.close_scalar(ch, end),
                _ => {
                    self.stack.pop();
                }
            },
            State::InsideLiteral => {
                let partial = &self.input[self.literal_start..end];
                if LITERALS.iter().any(|lit| lit.starts_with(partial)) {
                    self.last_valid_end = end;
                } else {
                    self.close_scalar(ch, end);
                }
            }
        }
    }

    fn finish(self) -> String {
        let mut out = self.input[..self.last_valid_end].to_string();

        for state in self.stack.iter().rev() {
            match state {
                State::InsideString => out.push('"'),
                State::InsideObjectKey
                | State::InsideObjectAfterKey
                | State::InsideObjectAfterComma
                | State::InsideObjectStart
                | State::InsideObjectBeforeValue
                | State::InsideObjectAfterValue => out.push('}'),
                State::InsideArrayStart
                | State::InsideArrayAfterComma
                | State::InsideArrayAfterValue => out.push(']'),
                State::InsideLiteral => {
                    let partial = &self.input[self.literal_start..];
                    if let Some(lit) = LITERALS.iter().find(|lit| lit.starts_with(partial)) {
                        out.push_str(&lit[partial.len()..]);
                    }
                }
                State::Root
                | State::Finish
                | State::InsideStringEscape
                | State::InsideStringUnicode { .. }
                | State::InsideNumber => {}
            }
        }

        out
    }
}

/// Close every unterminated structure in `input` so that it can be parsed.
///
/// Single linear pass. Trailing characters that cannot start or continue a
/// value (a dangling comma, a key without a value, a lone `-`) are dropped.
/// Input that is invalid for other reasons is left for the JSON parser to
/// reject.
pub fn fix_json(input: &str) -> String {
    let mut scanner = Scanner::new(input);
    for (start, ch) in input.char_indices() {
        scanner.step(start, ch);
    }
    scanner.finish()
}
