//! Compiled rewrite templates.
//!
//! Both rule dialects compile their substitution strings and condition
//! inputs into the same [`Pattern`] of [`PatternSegment`]s:
//!
//! | IIS             | Apache          | Segment                            |
//! |-----------------|-----------------|------------------------------------|
//! | `{R:1}`         | `$1`            | [`PatternSegment::RuleReference`]      |
//! | `{C:1}`         | `%1`            | [`PatternSegment::ConditionReference`] |
//! | `{HTTP_HOST}`   | `%{HTTP_HOST}`  | [`PatternSegment::ServerVariable`]     |
//! | `{URL}`         |                 | [`PatternSegment::CurrentUrl`]         |
//! | `{ToLower:..}`  |                 | [`PatternSegment::Function`]           |
//! | `{mapName:..}`  |                 | [`PatternSegment::RewriteMap`]         |
use std::fmt;
use std::iter::Peekable;
use std::str::{CharIndices, FromStr};
use std::sync::Arc;

use percent_encoding::{AsciiSet, CONTROLS, percent_decode_str, utf8_percent_encode};

use super::backref::Captures;
use super::context::RequestContext;
use super::error::{BackReferenceError, PatternError, UnknownValue};
use super::map::{RewriteMap, RewriteMaps};
use super::variables::ServerVariable;

// https://url.spec.whatwg.org/#percent-encoded-bytes
const ESCAPE: &AsciiSet = &CONTROLS
    .add(b'~')
    .add(b' ') // fragment encoding
    .add(b'\'')
    .add(b'"')
    .add(b'`')
    .add(b'#') // query encoding
    .add(b'<')
    .add(b'>')
    .add(b'?') // path encoding
    .add(b'^')
    .add(b'{')
    .add(b'}')
    .add(b'/') // user-info encoding
    .add(b':')
    .add(b';')
    .add(b'=')
    .add(b'@')
    .add(b'[')
    .add(b']')
    .add(b'$') // component encoding
    .add(b'&')
    .add(b'+')
    .add(b',');

/// Percent-encode a string as a single url component.
#[inline]
pub(crate) fn url_encode(s: &str) -> String {
    utf8_percent_encode(s, ESCAPE).to_string()
}

/// Builtin string functions usable as `{Name:...}`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Function {
    ToLower,
    UrlEncode,
    UrlDecode,
}

impl Function {
    fn apply(&self, value: String) -> String {
        match self {
            Self::ToLower => value.to_lowercase(),
            Self::UrlEncode => url_encode(&value),
            Self::UrlDecode => percent_decode_str(&value).decode_utf8_lossy().into_owned(),
        }
    }
}

impl FromStr for Function {
    type Err = UnknownValue;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "tolower" => Ok(Self::ToLower),
            "urlencode" => Ok(Self::UrlEncode),
            "urldecode" => Ok(Self::UrlDecode),
            _ => Err(UnknownValue(s.to_owned())),
        }
    }
}

/// Single piece of a compiled template.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PatternSegment {
    Literal(String),
    RuleReference(usize),
    ConditionReference(usize),
    ServerVariable(ServerVariable),
    /// Current path, or the original absolute url for global rules.
    CurrentUrl,
    Function(Function, Pattern),
    RewriteMap(Arc<RewriteMap>, Pattern),
}

/// Back-reference used by a template, checked when the rule is built.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Reference {
    Rule(usize),
    Condition(usize),
}

impl fmt::Display for Reference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Rule(n) => write!(f, "{{R:{n}}}"),
            Self::Condition(n) => write!(f, "{{C:{n}}}"),
        }
    }
}

/// Compiled template that expands into a string per request.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Pattern(Vec<PatternSegment>);

impl Pattern {
    /// Pattern that always expands to the given text.
    pub fn literal<S: Into<String>>(text: S) -> Self {
        let text = text.into();
        match text.is_empty() {
            true => Self::default(),
            false => Self(vec![PatternSegment::Literal(text)]),
        }
    }

    /// Pattern that expands to the current url.
    pub(crate) fn current_url() -> Self {
        Self(vec![PatternSegment::CurrentUrl])
    }

    #[inline]
    pub fn segments(&self) -> &[PatternSegment] {
        &self.0
    }

    /// Compile an IIS-style template such as `products/{R:1}?id={R:2}`.
    ///
    /// `{name:...}` placeholders that are not a builtin function are
    /// looked up in `maps`.
    pub fn parse_iis(s: &str, maps: &RewriteMaps) -> Result<Self, PatternError> {
        IisParser {
            chars: s.char_indices().peekable(),
            maps,
        }
        .parse(None)
    }

    /// Compile an Apache-style template such as `/new/$1?q=%{QUERY_STRING}`.
    ///
    /// A `$` or `%` that does not start a reference is kept as text.
    pub fn parse_apache(s: &str) -> Result<Self, PatternError> {
        let mut segments = Vec::new();
        let mut literal = String::new();
        let mut chars = s.char_indices().peekable();
        while let Some((index, c)) = chars.next() {
            match c {
                '\\' => literal.push(chars.next().map(|(_, c)| c).unwrap_or('\\')),
                '$' | '%' => {
                    let segment = match chars.peek().copied() {
                        Some((_, digit)) if digit.is_ascii_digit() => {
                            chars.next();
                            let n = digit as usize - '0' as usize;
                            match c {
                                '$' => PatternSegment::RuleReference(n),
                                _ => PatternSegment::ConditionReference(n),
                            }
                        }
                        Some((_, '{')) if c == '%' => {
                            chars.next();
                            let mut name = String::new();
                            loop {
                                match chars.next() {
                                    Some((_, '}')) => break,
                                    Some((_, c)) => name.push(c),
                                    None => return Err(PatternError::UnclosedPlaceholder(index)),
                                }
                            }
                            PatternSegment::ServerVariable(ServerVariable::from_name(&name)?)
                        }
                        _ => {
                            literal.push(c);
                            continue;
                        }
                    };
                    flush(&mut literal, &mut segments);
                    segments.push(segment);
                }
                c => literal.push(c),
            }
        }
        flush(&mut literal, &mut segments);
        Ok(Self(segments))
    }

    /// Expand the template for the current request.
    pub fn evaluate(
        &self,
        ctx: &RequestContext,
        captures: &Captures,
        global: bool,
    ) -> Result<String, BackReferenceError> {
        let mut dst = String::new();
        self.render(ctx, captures, global, false, &mut dst)?;
        Ok(dst)
    }

    /// Expand the template, percent-encoding every back-reference value.
    pub(crate) fn evaluate_escaped(
        &self,
        ctx: &RequestContext,
        captures: &Captures,
        global: bool,
    ) -> Result<String, BackReferenceError> {
        let mut dst = String::new();
        self.render(ctx, captures, global, true, &mut dst)?;
        Ok(dst)
    }

    fn render(
        &self,
        ctx: &RequestContext,
        captures: &Captures,
        global: bool,
        escape: bool,
        dst: &mut String,
    ) -> Result<(), BackReferenceError> {
        for segment in self.0.iter() {
            match segment {
                PatternSegment::Literal(text) => dst.push_str(text),
                PatternSegment::RuleReference(n) => {
                    push_reference(dst, captures.rule().get(*n)?, escape)
                }
                PatternSegment::ConditionReference(n) => {
                    push_reference(dst, captures.conditions().get(*n)?, escape)
                }
                PatternSegment::ServerVariable(var) => dst.push_str(&var.resolve(ctx)),
                PatternSegment::CurrentUrl => match global {
                    true => dst.push_str(&ctx.full_url()),
                    false => dst.push_str(ctx.path()),
                },
                PatternSegment::Function(function, inner) => {
                    let mut value = String::new();
                    inner.render(ctx, captures, global, escape, &mut value)?;
                    dst.push_str(&function.apply(value));
                }
                PatternSegment::RewriteMap(map, inner) => {
                    let mut key = String::new();
                    inner.render(ctx, captures, global, escape, &mut key)?;
                    dst.push_str(map.lookup(&key));
                }
            }
        }
        Ok(())
    }

    /// Check that every back-reference resolves against `captures`.
    pub(crate) fn check_references(&self, captures: &Captures) -> Result<(), BackReferenceError> {
        self.references().into_iter().try_for_each(|reference| {
            match reference {
                Reference::Rule(n) => captures.rule().get(n),
                Reference::Condition(n) => captures.conditions().get(n),
            }
            .map(|_| ())
        })
    }

    /// Every back-reference used by the template, nested ones included.
    pub(crate) fn references(&self) -> Vec<Reference> {
        let mut refs = Vec::new();
        self.collect_references(&mut refs);
        refs
    }

    fn collect_references(&self, refs: &mut Vec<Reference>) {
        for segment in self.0.iter() {
            match segment {
                PatternSegment::RuleReference(n) => refs.push(Reference::Rule(*n)),
                PatternSegment::ConditionReference(n) => refs.push(Reference::Condition(*n)),
                PatternSegment::Function(_, inner) | PatternSegment::RewriteMap(_, inner) => {
                    inner.collect_references(refs)
                }
                _ => {}
            }
        }
    }
}

#[inline]
fn push_reference(dst: &mut String, value: &str, escape: bool) {
    match escape {
        true => dst.push_str(&url_encode(value)),
        false => dst.push_str(value),
    }
}

#[inline]
fn flush(literal: &mut String, segments: &mut Vec<PatternSegment>) {
    if !literal.is_empty() {
        segments.push(PatternSegment::Literal(std::mem::take(literal)));
    }
}

struct IisParser<'a> {
    chars: Peekable<CharIndices<'a>>,
    maps: &'a RewriteMaps,
}

impl IisParser<'_> {
    /// Parse segments until the end of input, or until the closing
    /// brace of the placeholder opened at `open`.
    fn parse(&mut self, open: Option<usize>) -> Result<Pattern, PatternError> {
        let mut segments = Vec::new();
        let mut literal = String::new();
        while let Some((index, c)) = self.chars.next() {
            match c {
                '\\' => literal.push(self.chars.next().map(|(_, c)| c).unwrap_or('\\')),
                '}' if open.is_some() => {
                    flush(&mut literal, &mut segments);
                    return Ok(Pattern(segments));
                }
                '{' => {
                    flush(&mut literal, &mut segments);
                    segments.push(self.placeholder(index)?);
                }
                c => literal.push(c),
            }
        }
        if let Some(start) = open {
            return Err(PatternError::UnclosedPlaceholder(start));
        }
        flush(&mut literal, &mut segments);
        Ok(Pattern(segments))
    }

    fn placeholder(&mut self, start: usize) -> Result<PatternSegment, PatternError> {
        let mut name = String::new();
        loop {
            match self.chars.next() {
                Some((_, '}')) => return variable(&name),
                Some((_, ':')) => break,
                Some((_, c)) => name.push(c),
                None => return Err(PatternError::UnclosedPlaceholder(start)),
            }
        }

        let is_rule = name.eq_ignore_ascii_case("R");
        if is_rule || name.eq_ignore_ascii_case("C") {
            let mut digits = String::new();
            loop {
                match self.chars.next() {
                    Some((_, '}')) => break,
                    Some((_, c)) => digits.push(c),
                    None => return Err(PatternError::UnclosedPlaceholder(start)),
                }
            }
            let index = match !digits.is_empty() && digits.chars().all(|c| c.is_ascii_digit()) {
                true => digits.parse::<usize>().ok(),
                false => None,
            }
            .ok_or_else(|| PatternError::InvalidBackReference(format!("{{{name}:{digits}}}")))?;
            return Ok(match is_rule {
                true => PatternSegment::RuleReference(index),
                false => PatternSegment::ConditionReference(index),
            });
        }

        let inner = self.parse(Some(start))?;
        if let Ok(function) = Function::from_str(&name) {
            return Ok(PatternSegment::Function(function, inner));
        }
        match self.maps.get(&name) {
            Some(map) => Ok(PatternSegment::RewriteMap(map.clone(), inner)),
            None => Err(PatternError::UnknownFunction(name)),
        }
    }
}

fn variable(name: &str) -> Result<PatternSegment, PatternError> {
    match name.eq_ignore_ascii_case("URL") {
        true => Ok(PatternSegment::CurrentUrl),
        false => Ok(PatternSegment::ServerVariable(ServerVariable::from_name(name)?)),
    }
}
