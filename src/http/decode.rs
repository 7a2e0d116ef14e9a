//! Request body decoding.
//!
//! # Responsibilities
//! - Require the raw body to be UTF-8
//! - Normalize line terminators: `\r\n`, `\n` and a lone `\r` each end a
//!   line, lines are joined with `\n` and a final terminator is dropped
//! - Form-style percent decoding (`+` is a space, `%XX` escapes)
//! - Reject malformed escapes instead of passing them through
//!
//! # Design Decisions
//! - Decoding failures are client errors local to one request
//! - `+` is replaced before unescaping so `%2B` still yields a literal `+`

use std::borrow::Cow;

use percent_encoding::percent_decode_str;
use thiserror::Error;

/// Why a request body could not be turned into a payload.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    #[error("request body is not valid UTF-8")]
    InvalidUtf8Body,

    #[error("malformed percent escape at byte {0}")]
    MalformedEscape(usize),

    #[error("percent-decoded body is not valid UTF-8")]
    InvalidUtf8Escape,
}

/// Decode a raw HTTP body into the text forwarded to the backend.
pub fn decode_body(raw: &[u8]) -> Result<String, DecodeError> {
    let text = std::str::from_utf8(raw).map_err(|_| DecodeError::InvalidUtf8Body)?;
    form_decode(&normalize_lines(text))
}

/// Join lines with `\n`, treating `\r\n`, `\n` and `\r` alike.
fn normalize_lines(text: &str) -> Cow<'_, str> {
    if !text.contains(['\r', '\n']) {
        return Cow::Borrowed(text);
    }

    let unified = text.replace("\r\n", "\n").replace('\r', "\n");
    match unified.strip_suffix('\n') {
        Some(trimmed) => Cow::Owned(trimmed.to_string()),
        None => Cow::Owned(unified),
    }
}

/// Percent-decode `input` with form rules.
pub fn form_decode(input: &str) -> Result<String, DecodeError> {
    check_escapes(input)?;

    let spaced: Cow<'_, str> = if input.contains('+') {
        Cow::Owned(input.replace('+', " "))
    } else {
        Cow::Borrowed(input)
    };

    percent_decode_str(&spaced)
        .decode_utf8()
        .map(Cow::into_owned)
        .map_err(|_| DecodeError::InvalidUtf8Escape)
}

fn check_escapes(input: &str) -> Result<(), DecodeError> {
    let bytes = input.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%' {
            let valid = i + 2 < bytes.len()
                && bytes[i + 1].is_ascii_hexdigit()
                && bytes[i + 2].is_ascii_hexdigit();
            if !valid {
                return Err(DecodeError::MalformedEscape(i));
            }
            i += 3;
        } else {
            i += 1;
        }
    }
    Ok(())
}
