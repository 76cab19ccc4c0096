use crate::error::ErrorKind;

/// One parsed source line: `[label:] [mnemonic [arg {, arg}]] [; comment]`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Statement<'a> {
    pub label: Option<&'a str>,
    pub mnemonic: Option<&'a str>,
    pub args: Vec<&'a str>,
}

impl Statement<'_> {
    pub fn is_empty(&self) -> bool {
        self.label.is_none() && self.mnemonic.is_none()
    }
}

/// Characters allowed in a label (and in a label reference).
pub fn is_label_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_' || c == '$'
}

fn is_mnemonic_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_' || c == '.'
}

/// Splits `s` after its longest prefix of characters matching `pred`.
fn take_while(s: &str, pred: impl Fn(char) -> bool) -> (&str, &str) {
    let end = s.find(|c: char| !pred(c)).unwrap_or(s.len());
    s.split_at(end)
}

fn strip_comment(line: &str) -> &str {
    line.split_once(';').map_or(line, |(code, _)| code)
}

/// Parses one source line. A trailing line terminator is tolerated.
pub fn parse_line(line: &str) -> Result<Statement<'_>, ErrorKind> {
    let syntax = || ErrorKind::Syntax { text: line.trim_end().to_string() };
    let mut rest = strip_comment(line).trim();
    let mut stmt = Statement::default();

    let (word, tail) = take_while(rest, is_label_char);
    if !word.is_empty() {
        if let Some(after) = tail.trim_start().strip_prefix(':') {
            stmt.label = Some(word);
            rest = after.trim_start();
        }
    }

    let (mnemonic, tail) = take_while(rest, is_mnemonic_char);
    if mnemonic.is_empty() {
        return if rest.is_empty() { Ok(stmt) } else { Err(syntax()) };
    }
    stmt.mnemonic = Some(mnemonic);
    if tail.is_empty() {
        return Ok(stmt);
    }
    if !tail.starts_with(char::is_whitespace) {
        return Err(syntax());
    }
    stmt.args = parse_args(Some(tail)).ok_or_else(syntax)?;
    Ok(stmt)
}

/// Splits argument text on commas and trims each token.
///
/// Missing or blank text yields an empty list; an empty token anywhere
/// (`"a,"`, `",b"`, `"a,,b"`) yields `None`.
pub fn parse_args(text: Option<&str>) -> Option<Vec<&str>> {
    let text = match text.map(str::trim) {
        None | Some("") => return Some(Vec::new()),
        Some(t) => t,
    };
    text.split(',')
        .map(str::trim)
        .map(|tok| (!tok.is_empty()).then_some(tok))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn label_mnemonic_and_args() {
        let s = parse_line("label: inst a1, a2, a3").unwrap();
        assert_eq!(s.label, Some("label"));
        assert_eq!(s.mnemonic, Some("inst"));
        assert_eq!(s.args, vec!["a1", "a2", "a3"]);

        let s = parse_line("inst a1, a2, a3\n").unwrap();
        assert_eq!(s.label, None);
        assert_eq!(s.mnemonic, Some("inst"));
        assert_eq!(s.args, vec!["a1", "a2", "a3"]);
    }

    #[test]
    fn blank_and_comment_only_lines() {
        assert!(parse_line("  ").unwrap().is_empty());
        assert!(parse_line("").unwrap().is_empty());
        assert!(parse_line("   ; just a comment, with commas").unwrap().is_empty());
        assert_eq!(parse_line("  \r\n").unwrap(), Statement::default());
    }

    #[test]
    fn label_alone_and_label_without_space() {
        let s = parse_line("loop$1:").unwrap();
        assert_eq!(s.label, Some("loop$1"));
        assert_eq!(s.mnemonic, None);
        assert!(s.args.is_empty());

        let s = parse_line("top:nop ; idle").unwrap();
        assert_eq!(s.label, Some("top"));
        assert_eq!(s.mnemonic, Some("nop"));
    }

    #[test]
    fn comment_is_stripped_before_args() {
        let s = parse_line("mov r1, r2 ; copy, then ret").unwrap();
        assert_eq!(s.args, vec!["r1", "r2"]);
    }

    #[test]
    fn rejects_malformed_lines() {
        for bad in ["mov r1,", "mov ,r1", "mov r1,,r2", "a: b: nop", "mov@ r1", "@@", "x: :"] {
            assert!(
                matches!(parse_line(bad), Err(ErrorKind::Syntax { .. })),
                "{bad:?} should not parse"
            );
        }
    }

    #[test]
    fn arg_splitting() {
        assert_eq!(parse_args(Some("1, 2, 3")), Some(vec!["1", "2", "3"]));
        assert_eq!(parse_args(Some(" a0 ,   b2 ")), Some(vec!["a0", "b2"]));
        assert_eq!(parse_args(Some("a0,")), None);
        assert_eq!(parse_args(Some(",b")), None);
        assert_eq!(parse_args(Some("")), Some(vec![]));
        assert_eq!(parse_args(Some(" ")), Some(vec![]));
        assert_eq!(parse_args(None), Some(vec![]));
    }
}
