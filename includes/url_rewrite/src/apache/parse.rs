use crate::error::ExpressionError;

/// Split a directive line into whitespace separated arguments.
///
/// Double quotes group whitespace into one argument and are removed,
/// `\"` inside quotes yields a literal quote. Other backslashes are
/// kept as-is so regex escapes survive.
pub(crate) fn tokenize(s: &str) -> Result<Vec<String>, ExpressionError> {
    let mut tokens = Vec::new();
    let mut token = String::new();
    let mut started = false;
    let mut quoted = false;
    let mut chars = s.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '\\' if quoted && chars.peek() == Some(&'"') => {
                chars.next();
                token.push('"');
            }
            '"' => {
                quoted = !quoted;
                started = true;
            }
            c if c.is_whitespace() && !quoted => {
                if started {
                    tokens.push(std::mem::take(&mut token));
                    started = false;
                }
            }
            c => {
                token.push(c);
                started = true;
            }
        }
    }
    if quoted {
        return Err(ExpressionError::UnclosedQuotation(s.to_owned()));
    }
    if started {
        tokens.push(token);
    }
    Ok(tokens)
}

#[inline]
pub(crate) fn strip_negation(s: &str) -> (bool, &str) {
    match s.strip_prefix('!') {
        Some(rest) => (true, rest),
        None => (false, s),
    }
}
