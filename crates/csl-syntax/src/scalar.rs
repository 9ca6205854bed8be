//! Scalar conversion: quoting, `${var}` substitution and reference tokens.

use csl_config::{Fragment, Template, Value, scan_references};

use crate::error::{Result, locate_span, syntax_error};
use crate::parser::Parser;

/// Text whose bytes each remember the file offset they came from, so that
/// reference tokens found after unescaping and substitution can still be
/// located in the file.
#[derive(Debug, Default)]
struct Spanned {
    text: String,
    offsets: Vec<usize>,
}

impl Spanned {
    fn push(&mut self, ch: char, at: usize) {
        self.text.push(ch);
        self.offsets.extend(std::iter::repeat_n(at, ch.len_utf8()));
    }

    fn push_str(&mut self, s: &str, at: usize) {
        for ch in s.chars() {
            self.push(ch, at);
        }
    }

    fn verbatim(s: &str, start: usize) -> Self {
        let mut spanned = Spanned::default();
        for (idx, ch) in s.char_indices() {
            spanned.push(ch, start + idx);
        }
        spanned
    }
}

impl Parser<'_> {
    /// Convert the scalar text at `start..end` into a value.
    pub(crate) fn scalar(&self, start: usize, end: usize) -> Result<Value> {
        let raw = &self.content[start..end];
        let unquoted = match raw.chars().next() {
            Some(quote @ ('"' | '\'')) => self.unquote(raw, start, quote)?,
            _ => Spanned::verbatim(raw, start),
        };
        let text = self.substitute_vars(unquoted);

        let fragments = scan_references(&text.text);
        if !fragments.iter().any(|f| matches!(f, Fragment::Token { .. })) {
            return Ok(Value::String(text.text.clone()));
        }
        let template = Template::from_fragments(fragments, |offset, len| {
            text.offsets
                .get(offset)
                .map(|&at| locate_span(self.path, self.content, &self.info, at, len))
        });
        Ok(Value::from(template))
    }

    fn unquote(&self, raw: &str, start: usize, quote: char) -> Result<Spanned> {
        let mut out = Spanned::default();
        let mut chars = raw.char_indices().skip(1).peekable();

        while let Some((idx, ch)) = chars.next() {
            let at = start + idx;
            if ch == quote {
                if quote == '\'' && chars.peek().is_some_and(|&(_, next)| next == '\'') {
                    chars.next();
                    out.push('\'', at);
                    continue;
                }
                return match chars.peek() {
                    None => Ok(out),
                    Some(&(trailing, _)) => Err(syntax_error(
                        self.path,
                        self.content,
                        &self.info,
                        start + trailing,
                        "CSL-1-1",
                        "unexpected text after closing quote",
                    )),
                };
            }
            if ch == '\\' && quote == '"' {
                match chars.next() {
                    Some((_, 'n')) => out.push('\n', at),
                    Some((_, 't')) => out.push('\t', at),
                    Some((_, 'r')) => out.push('\r', at),
                    Some((_, escaped @ ('"' | '\\'))) => out.push(escaped, at),
                    Some((_, other)) => {
                        out.push('\\', at);
                        out.push(other, at + 1);
                    }
                    None => out.push('\\', at),
                }
                continue;
            }
            out.push(ch, at);
        }

        Err(syntax_error(
            self.path,
            self.content,
            &self.info,
            start,
            "CSL-1-1",
            format!("unterminated {quote}-quoted string"),
        ))
    }

    /// Replace `${name}` with the matching variable. Unknown names are left
    /// in place.
    fn substitute_vars(&self, input: Spanned) -> Spanned {
        if !input.text.contains("${") {
            return input;
        }
        let mut out = Spanned::default();
        let mut rest = input.text.as_str();
        let mut base = 0;

        while let Some(open) = rest.find("${") {
            let Some(close) = rest[open..].find('}').map(|c| open + c) else {
                break;
            };
            let name = &rest[open + 2..close];
            for (idx, ch) in rest[..open].char_indices() {
                out.push(ch, input.offsets[base + idx]);
            }
            let dollar_at = input.offsets[base + open];
            match self.vars.get(name) {
                Some(value) if is_var_name(name) => out.push_str(value, dollar_at),
                _ => {
                    tracing::warn!(
                        var = %name,
                        file = %self.path.display(),
                        "undefined variable left as-is"
                    );
                    for (idx, ch) in rest[open..=close].char_indices() {
                        out.push(ch, input.offsets[base + open + idx]);
                    }
                }
            }
            base += close + 1;
            rest = &rest[close + 1..];
        }
        for (idx, ch) in rest.char_indices() {
            out.push(ch, input.offsets[base + idx]);
        }
        out
    }
}

fn is_var_name(name: &str) -> bool {
    !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.'))
}
