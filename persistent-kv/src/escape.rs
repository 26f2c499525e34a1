//! Backtick-escaping for the `key|val|key|val…` wire format: `` ` `` escapes
//! itself, `|` escapes to `` `| ``, so the delimiter can appear in either a
//! key or a value without ambiguity.

use heapless::String;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EscapeError {
    /// The escaped form didn't fit in the caller's bounded buffer.
    Overflow,
}

pub fn escape_into<const N: usize>(src: &str, out: &mut String<N>) -> Result<(), EscapeError> {
    for c in src.chars() {
        match c {
            '`' => out.push_str("``").map_err(|_| EscapeError::Overflow)?,
            '|' => out.push_str("`|").map_err(|_| EscapeError::Overflow)?,
            _ => out.push(c).map_err(|_| EscapeError::Overflow)?,
        }
    }
    Ok(())
}

pub fn unescape_into<const N: usize>(src: &str, out: &mut String<N>) -> Result<(), EscapeError> {
    let mut escape_next = false;
    for c in src.chars() {
        if escape_next {
            out.push(c).map_err(|_| EscapeError::Overflow)?;
            escape_next = false;
        } else if c == '`' {
            escape_next = true;
        } else {
            out.push(c).map_err(|_| EscapeError::Overflow)?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backtick_and_pipe_round_trip() {
        let mut escaped: String<64> = String::new();
        escape_into("a`b|c", &mut escaped).unwrap();
        assert_eq!(escaped.as_str(), "a``b`|c");

        let mut restored: String<64> = String::new();
        unescape_into(&escaped, &mut restored).unwrap();
        assert_eq!(restored.as_str(), "a`b|c");
    }

    #[test]
    fn plain_text_is_unchanged() {
        let mut escaped: String<64> = String::new();
        escape_into("mode", &mut escaped).unwrap();
        assert_eq!(escaped.as_str(), "mode");
    }

    #[test]
    fn escape_too_long_for_buffer_overflows() {
        let mut out: String<2> = String::new();
        assert_eq!(escape_into("|||", &mut out), Err(EscapeError::Overflow));
    }
}
