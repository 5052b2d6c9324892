use std::fmt::Write;

/// Decodes the body of a string or template literal (without its quotes).
pub fn unescape(raw: &str) -> Result<String, String> {
    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars().peekable();

    while let Some(c) = chars.next() {
        if c == '\r' {
            // Raw CRLF inside templates reads as LF.
            if chars.peek() == Some(&'\n') {
                chars.next();
            }
            out.push('\n');
            continue;
        }
        if c != '\\' {
            out.push(c);
            continue;
        }

        let Some(escaped) = chars.next() else {
            return Err("dangling escape".to_string());
        };
        match escaped {
            'n' => out.push('\n'),
            't' => out.push('\t'),
            'r' => out.push('\r'),
            'b' => out.push('\u{8}'),
            'f' => out.push('\u{c}'),
            'v' => out.push('\u{b}'),
            '0' if !chars.peek().is_some_and(char::is_ascii_digit) => out.push('\0'),
            'x' => {
                let code = read_hex(&mut chars, 2)?;
                out.push(char::from_u32(code).ok_or("invalid \\x escape")?);
            }
            'u' => out.push(read_unicode(&mut chars)?),
            '\r' => {
                if chars.peek() == Some(&'\n') {
                    chars.next();
                }
            }
            '\n' | '\u{2028}' | '\u{2029}' => {}
            other => out.push(other),
        }
    }

    Ok(out)
}

type Chars<'a> = std::iter::Peekable<std::str::Chars<'a>>;

fn read_hex(chars: &mut Chars<'_>, digits: usize) -> Result<u32, String> {
    let mut value = 0u32;
    for _ in 0..digits {
        let digit = chars
            .next()
            .and_then(|c| c.to_digit(16))
            .ok_or_else(|| "invalid hexadecimal escape".to_string())?;
        value = value * 16 + digit;
    }
    Ok(value)
}

fn read_unicode(chars: &mut Chars<'_>) -> Result<char, String> {
    if chars.peek() == Some(&'{') {
        chars.next();
        let mut value = 0u32;
        loop {
            match chars.next() {
                Some('}') => break,
                Some(c) => {
                    let digit = c.to_digit(16).ok_or("invalid \\u{...} escape")?;
                    value = value
                        .checked_mul(16)
                        .and_then(|v| v.checked_add(digit))
                        .ok_or("\\u{...} escape out of range")?;
                }
                None => return Err("unterminated \\u{...} escape".to_string()),
            }
        }
        return char::from_u32(value).ok_or_else(|| "invalid code point".to_string());
    }

    let high = read_hex(chars, 4)?;
    if !(0xD800..=0xDBFF).contains(&high) {
        return char::from_u32(high).ok_or_else(|| "lone surrogate in \\u escape".to_string());
    }

    // Surrogate pair spelled as two escapes.
    if chars.next() != Some('\\') || chars.next() != Some('u') {
        return Err("lone surrogate in \\u escape".to_string());
    }
    let low = read_hex(chars, 4)?;
    if !(0xDC00..=0xDFFF).contains(&low) {
        return Err("lone surrogate in \\u escape".to_string());
    }
    let code = 0x10000 + ((high - 0xD800) << 10) + (low - 0xDC00);
    char::from_u32(code).ok_or_else(|| "invalid code point".to_string())
}

/// Renders `value` as a literal delimited by `quote`.
pub fn quote(value: &str, quote: char) -> String {
    let mut out = String::with_capacity(value.len() + 2);
    out.push(quote);

    for c in value.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            '$' if quote == '`' => out.push_str("\\$"),
            c if c == quote => {
                out.push('\\');
                out.push(c);
            }
            c if c.is_control() || c == '\u{2028}' || c == '\u{2029}' => {
                let _ = write!(out, "\\u{:04x}", c as u32);
            }
            c => out.push(c),
        }
    }

    out.push(quote);
    out
}
