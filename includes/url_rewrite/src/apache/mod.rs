//! Apache `mod_rewrite` style rule files.
//!
//! Supports a subset of the [official](https://httpd.apache.org/docs/current/mod/mod_rewrite.html)
//! directives: `RewriteEngine`, `RewriteCond` and `RewriteRule`.
//! Every `RewriteCond` guards the next `RewriteRule` only.
//!
//! ```text
//! RewriteEngine on
//! RewriteCond %{REQUEST_FILENAME} !-f
//! RewriteCond %{REQUEST_FILENAME} !-d
//! RewriteRule ^/(.*)$ /index.php?route=$1 [QSA,L]
//! ```
use std::str::FromStr;

mod flags;
mod parse;

use crate::builder::{PatternSyntax, RuleBuilder, RuleOptions};
use crate::condition::{Condition, LogicalGrouping};
use crate::error::{ApacheError, CondError, ExpressionError, RuleError};
use crate::matcher::{Compare, Matcher};
use crate::pattern::Pattern;
use crate::rule::{Action, ActionKind, Rule};

use flags::{CondFlags, RuleFlag, RuleFlags};

/// Parse Apache-style directives with the default [`RuleOptions`].
#[inline]
pub fn parse(text: &str) -> Result<Vec<Rule>, ApacheError> {
    parse_with(text, &RuleOptions::default())
}

/// Parse Apache-style directives into rules.
///
/// Errors carry the 1-based line they were found on. A single bad
/// line fails the whole file.
pub fn parse_with(text: &str, options: &RuleOptions) -> Result<Vec<Rule>, ApacheError> {
    let mut rules = Vec::new();
    let mut enabled = true;
    let mut pending: Vec<Condition> = Vec::new();
    let mut pending_line = 0;
    for (index, line) in text.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let number = index + 1;
        let located = |kind: ExpressionError| ApacheError { line: number, kind };
        match Directive::from_str(line).map_err(located)? {
            Directive::State(state) => enabled = state,
            Directive::Condition(cond) => {
                pending.push(cond.compile(options).map_err(located)?);
                pending_line = number;
            }
            Directive::Rule(rule) => {
                let conditions = std::mem::take(&mut pending);
                rules.push(rule.compile(conditions, enabled, options).map_err(located)?);
            }
        }
    }
    if !pending.is_empty() {
        return Err(ApacheError {
            line: pending_line,
            kind: ExpressionError::DanglingCondition,
        });
    }
    Ok(rules)
}

/// Single directive line.
#[derive(Debug)]
enum Directive {
    Condition(CondExpr),
    Rule(RuleExpr),
    State(bool),
}

impl FromStr for Directive {
    type Err = ExpressionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (ident, expr) = s
            .split_once(char::is_whitespace)
            .ok_or(ExpressionError::MissingIdentifier)?;
        let args = parse::tokenize(expr)?;
        match ident.to_lowercase().as_str() {
            "rule" | "rewrite" | "rewriterule" => Ok(Self::Rule(RuleExpr::try_from(args)?)),
            "cond" | "condition" | "rewritecond" => Ok(Self::Condition(CondExpr::try_from(args)?)),
            "state" | "engine" | "rewriteengine" => match expr.trim().to_lowercase().as_str() {
                "on" => Ok(Self::State(true)),
                "off" => Ok(Self::State(false)),
                _ => Err(ExpressionError::InvalidStateRule(expr.trim().to_owned())),
            },
            _ => Err(ExpressionError::InvalidIdentifier(s.to_owned())),
        }
    }
}

/// Operator half of a `RewriteCond` line.
#[derive(Debug, PartialEq)]
enum CondPattern {
    Regex(String),
    Exact(String),
    Compare(Compare, String),
    IsFile,
    IsDirectory,
}

/// `RewriteCond TestString CondPattern [flags]`
#[derive(Debug)]
struct CondExpr {
    test_string: String,
    pattern: CondPattern,
    negate: bool,
    flags: CondFlags,
}

impl TryFrom<Vec<String>> for CondExpr {
    type Error = CondError;

    fn try_from(args: Vec<String>) -> Result<Self, Self::Error> {
        let mut args = args.into_iter();
        let test_string = args.next().ok_or(CondError::EmptyExpression)?;
        let raw = args.next().ok_or(CondError::MissingPattern)?;
        let mut rest: Vec<String> = args.collect();

        let (negate, expr) = parse::strip_negation(&raw);
        let pattern = match expr {
            "-f" | "-F" => CondPattern::IsFile,
            "-d" => CondPattern::IsDirectory,
            "-s" | "-l" | "-L" | "-h" | "-x" | "-U" => {
                return Err(CondError::UnsupportedFileTest(expr.to_owned()));
            }
            op if op
                .get(..3)
                .is_some_and(|p| p.starts_with('-') && Compare::from_str(p).is_ok()) =>
            {
                let (prefix, attached) = op.split_at(3);
                let compare = Compare::from_str(prefix)
                    .map_err(|_| CondError::InvalidComparison(op.to_owned()))?;
                let operand = match attached {
                    "" if rest.first().is_some_and(|s| !s.starts_with('[')) => rest.remove(0),
                    "" => return Err(CondError::InvalidComparison(op.to_owned())),
                    attached => attached.to_owned(),
                };
                CondPattern::Compare(compare, operand)
            }
            op if op.starts_with("<=") || op.starts_with(">=") => {
                let compare = Compare::from_str(&op[..2])
                    .map_err(|_| CondError::InvalidComparison(op.to_owned()))?;
                CondPattern::Compare(compare, op[2..].to_owned())
            }
            op if op.starts_with('<') || op.starts_with('>') => {
                let compare = Compare::from_str(&op[..1])
                    .map_err(|_| CondError::InvalidComparison(op.to_owned()))?;
                CondPattern::Compare(compare, op[1..].to_owned())
            }
            op if op.starts_with('=') => CondPattern::Exact(op[1..].to_owned()),
            op => CondPattern::Regex(op.to_owned()),
        };

        let mut rest = rest.into_iter();
        let flags = match rest.next() {
            Some(flags) => CondFlags::from_str(&flags)?,
            None => CondFlags::default(),
        };
        if let Some(next) = rest.next() {
            return Err(CondError::InvalidSuffix(next));
        }
        Ok(Self {
            test_string,
            pattern,
            negate,
            flags,
        })
    }
}

impl CondExpr {
    fn compile(self, options: &RuleOptions) -> Result<Condition, ExpressionError> {
        let input = Pattern::parse_apache(&self.test_string)?;
        let nocase = self.flags.nocase;
        let matcher = match self.pattern {
            CondPattern::Regex(regex) => {
                Matcher::regex(&regex, nocase, self.negate, options.get_match_timeout())?
            }
            CondPattern::Exact(value) => Matcher::exact(value, nocase, self.negate),
            CondPattern::Compare(op, operand) => Matcher::compare(op, operand, nocase, self.negate),
            CondPattern::IsFile => Matcher::is_file(self.negate),
            CondPattern::IsDirectory => Matcher::is_directory(self.negate),
        };
        Ok(Condition::new(input, matcher, self.flags.or_next))
    }
}

/// `RewriteRule Pattern Substitution [flags]`
#[derive(Debug)]
struct RuleExpr {
    pattern: String,
    substitution: String,
    flags: RuleFlags,
}

impl TryFrom<Vec<String>> for RuleExpr {
    type Error = RuleError;

    fn try_from(args: Vec<String>) -> Result<Self, Self::Error> {
        let mut args = args.into_iter();
        let pattern = args.next().ok_or(RuleError::MissingPattern)?;
        let substitution = args.next().ok_or(RuleError::MissingRewrite)?;
        let flags = match args.next() {
            Some(flags) => RuleFlags::from_str(&flags)?,
            None => RuleFlags::default(),
        };
        if let Some(next) = args.next() {
            return Err(RuleError::InvalidSuffix(next));
        }
        Ok(Self {
            pattern,
            substitution,
            flags,
        })
    }
}

impl RuleExpr {
    fn compile(
        self,
        conditions: Vec<Condition>,
        enabled: bool,
        options: &RuleOptions,
    ) -> Result<Rule, ExpressionError> {
        let flags = &self.flags;
        let (negate, pattern) = parse::strip_negation(&self.pattern);

        let mut builder = RuleBuilder::new(options.clone());
        builder.set_enabled(enabled).set_match(
            pattern,
            flags.has(RuleFlag::NoCase),
            negate,
            PatternSyntax::ECMAScript,
        )?;
        if !conditions.is_empty() {
            builder.add_conditions(LogicalGrouping::MatchAll, false);
            for condition in conditions {
                builder.push_condition(condition);
            }
        }

        let no_substitution = self.substitution == "-";
        let kind = match flags.resolve() {
            Some(RuleFlag::Redirect(status)) if (300..400).contains(&status) => {
                ActionKind::Redirect(status)
            }
            Some(RuleFlag::Redirect(status)) => ActionKind::CustomResponse {
                status,
                reason: None,
            },
            Some(RuleFlag::Forbidden) => ActionKind::Forbidden,
            Some(RuleFlag::Gone) => ActionKind::Gone,
            _ if no_substitution => ActionKind::None,
            _ => ActionKind::Rewrite,
        };
        let url = match no_substitution {
            true => Pattern::current_url(),
            false => Pattern::parse_apache(&self.substitution)?,
        };

        let append_query = flags.has(RuleFlag::QueryAppend)
            || (!flags.has(RuleFlag::QueryDiscard) && !self.substitution.contains('?'));
        let last = flags.has(RuleFlag::Last) || flags.has(RuleFlag::End);
        let action = Action::new(kind, url)
            .append_query(append_query)
            .stop_processing(last)
            .escape_backreferences(flags.has(RuleFlag::EscapeBackReferences));
        builder
            .add_action(action)
            .set_last(last)
            .set_skip(flags.skip());
        Ok(builder.build(false)?)
    }
}
