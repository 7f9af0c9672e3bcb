use std::borrow::Cow;

/// Returns the first `max_chars` Unicode scalar values of `s`.
///
/// Borrows when `s` is already short enough. Never splits a code point.
///
/// # Examples
///
/// ```
/// use daybrief::util::truncate_chars;
///
/// assert_eq!(truncate_chars("Hello World", 5), "Hello");
/// assert_eq!(truncate_chars("Short", 10), "Short");
/// assert_eq!(truncate_chars("你好世界", 2), "你好");
/// ```
pub fn truncate_chars(s: &str, max_chars: usize) -> Cow<'_, str> {
    match s.char_indices().nth(max_chars) {
        Some((cut, _)) => Cow::Owned(s[..cut].to_owned()),
        None => Cow::Borrowed(s),
    }
}

/// Strip terminal control characters and ANSI escape sequences.
///
/// Upstream summaries and feed items are printed to the terminal as-is, so
/// anything that could move the cursor or recolor output is removed. Tab,
/// newline and carriage return are kept.
///
/// Handles CSI (`ESC [ ... final`) and OSC (`ESC ] ... BEL | ESC \`)
/// sequences; a bare ESC is dropped on its own.
pub fn strip_control_chars(s: &str) -> Cow<'_, str> {
    fn is_control(c: char) -> bool {
        (c.is_ascii_control() && !matches!(c, '\t' | '\n' | '\r')) || c == '\u{7f}'
    }

    if !s.chars().any(is_control) {
        return Cow::Borrowed(s);
    }

    let mut out = String::with_capacity(s.len());
    let mut chars = s.chars().peekable();

    while let Some(c) = chars.next() {
        if c == '\u{1b}' {
            match chars.peek() {
                Some('[') => {
                    chars.next();
                    // Parameter and intermediate bytes run until the final byte (0x40..=0x7e)
                    for next in chars.by_ref() {
                        if ('\u{40}'..='\u{7e}').contains(&next) {
                            break;
                        }
                    }
                }
                Some(']') => {
                    chars.next();
                    while let Some(next) = chars.next() {
                        if next == '\u{07}' {
                            break;
                        }
                        if next == '\u{1b}' && chars.peek() == Some(&'\\') {
                            chars.next();
                            break;
                        }
                    }
                }
                _ => {}
            }
        } else if !is_control(c) {
            out.push(c);
        }
    }

    Cow::Owned(out)
}
