//! Shared construction path for rules coming out of either dialect.
use std::str::FromStr;
use std::time::Duration;

use super::condition::{Condition, Conditions, LogicalGrouping};
use super::error::{BuildError, UnknownValue};
use super::matcher::{DEFAULT_MATCH_TIMEOUT, Matcher};
use super::pattern::{Pattern, Reference};
use super::rule::{Action, Rule};

/// Settings applied to every rule a parser builds.
#[derive(Clone, Debug)]
pub struct RuleOptions {
    match_timeout: Duration,
}

impl RuleOptions {
    /// Configure the time budget of a single regex evaluation.
    ///
    /// Default is 100ms
    pub fn match_timeout(mut self, timeout: Duration) -> Self {
        self.match_timeout = timeout;
        self
    }

    #[inline]
    pub fn get_match_timeout(&self) -> Duration {
        self.match_timeout
    }
}

impl Default for RuleOptions {
    fn default() -> Self {
        Self {
            match_timeout: DEFAULT_MATCH_TIMEOUT,
        }
    }
}

/// Syntax of a match or condition pattern.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum PatternSyntax {
    #[default]
    ECMAScript,
    Wildcard,
    ExactMatch,
}

impl FromStr for PatternSyntax {
    type Err = UnknownValue;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "ecmascript" => Ok(Self::ECMAScript),
            "wildcard" => Ok(Self::Wildcard),
            "exactmatch" => Ok(Self::ExactMatch),
            _ => Err(UnknownValue(s.to_owned())),
        }
    }
}

/// Test a condition applies to its expanded input.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum MatchType {
    #[default]
    Pattern,
    IsFile,
    IsDirectory,
}

impl FromStr for MatchType {
    type Err = UnknownValue;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "pattern" => Ok(Self::Pattern),
            "isfile" => Ok(Self::IsFile),
            "isdirectory" => Ok(Self::IsDirectory),
            _ => Err(UnknownValue(s.to_owned())),
        }
    }
}

/// Incrementally assembles a [`Rule`].
///
/// # Example
///
/// ```
/// use url_rewrite::{Action, Pattern, PatternSyntax, RuleBuilder, RuleOptions};
///
/// let mut builder = RuleBuilder::new(RuleOptions::default());
/// builder
///     .set_match(r"^/old/(.*)", true, false, PatternSyntax::ECMAScript)
///     .unwrap()
///     .add_action(Action::redirect(Pattern::parse_apache("/new/$1").unwrap(), 301));
/// let rule = builder.build(false).unwrap();
/// assert_eq!(rule.actions().len(), 1);
/// ```
#[derive(Debug)]
pub struct RuleBuilder {
    options: RuleOptions,
    name: Option<String>,
    enabled: bool,
    initial_match: Option<Matcher>,
    conditions: Option<Conditions>,
    actions: Vec<Action>,
    last: bool,
    skip: u16,
}

impl RuleBuilder {
    pub fn new(options: RuleOptions) -> Self {
        Self {
            options,
            name: None,
            enabled: true,
            initial_match: None,
            conditions: None,
            actions: Vec::new(),
            last: false,
            skip: 0,
        }
    }

    pub fn set_name<S: Into<String>>(&mut self, name: S) -> &mut Self {
        self.name = Some(name.into());
        self
    }

    pub fn set_enabled(&mut self, enabled: bool) -> &mut Self {
        self.enabled = enabled;
        self
    }

    /// Compile the pattern the request url is tested against.
    pub fn set_match(
        &mut self,
        pattern: &str,
        ignore_case: bool,
        negate: bool,
        syntax: PatternSyntax,
    ) -> Result<&mut Self, BuildError> {
        let matcher = match syntax {
            PatternSyntax::ECMAScript => Matcher::regex(
                pattern,
                ignore_case,
                negate,
                self.options.match_timeout,
            )?,
            PatternSyntax::ExactMatch => Matcher::exact(pattern, ignore_case, negate),
            PatternSyntax::Wildcard => {
                return Err(BuildError::Unsupported("Wildcard syntax".to_owned()));
            }
        };
        Ok(self.set_matcher(matcher))
    }

    pub fn set_matcher(&mut self, matcher: Matcher) -> &mut Self {
        self.initial_match = Some(matcher);
        self
    }

    /// Start the condition list and declare how it combines.
    pub fn add_conditions(&mut self, grouping: LogicalGrouping, track_all_captures: bool) -> &mut Self {
        self.conditions = Some(Conditions::new(grouping, track_all_captures));
        self
    }

    /// Compile and append a condition, chained according to the
    /// declared [`LogicalGrouping`].
    pub fn add_condition(
        &mut self,
        input: Pattern,
        pattern: Option<&str>,
        syntax: PatternSyntax,
        match_type: MatchType,
        ignore_case: bool,
        negate: bool,
    ) -> Result<&mut Self, BuildError> {
        let matcher = match (syntax, match_type) {
            (PatternSyntax::Wildcard, _) => {
                return Err(BuildError::Unsupported("Wildcard syntax".to_owned()));
            }
            (PatternSyntax::ExactMatch, _) => {
                let pattern = pattern.ok_or(BuildError::MissingPattern)?;
                Matcher::exact(pattern, ignore_case, negate)
            }
            (PatternSyntax::ECMAScript, MatchType::Pattern) => {
                let pattern = pattern
                    .filter(|p| !p.is_empty())
                    .ok_or(BuildError::MissingPattern)?;
                Matcher::regex(pattern, ignore_case, negate, self.options.match_timeout)?
            }
            (PatternSyntax::ECMAScript, MatchType::IsFile) => Matcher::is_file(negate),
            (PatternSyntax::ECMAScript, MatchType::IsDirectory) => Matcher::is_directory(negate),
        };
        let conditions = self.conditions.get_or_insert_with(Conditions::default);
        let or_next = conditions.grouping() == LogicalGrouping::MatchAny;
        conditions.push(Condition::new(input, matcher, or_next));
        Ok(self)
    }

    /// Append an already compiled condition, keeping its own chaining.
    pub fn push_condition(&mut self, condition: Condition) -> &mut Self {
        self.conditions
            .get_or_insert_with(Conditions::default)
            .push(condition);
        self
    }

    pub fn add_action(&mut self, action: Action) -> &mut Self {
        self.actions.push(action);
        self
    }

    /// Halt the rule list once the rule applied.
    pub fn set_last(&mut self, last: bool) -> &mut Self {
        self.last = last;
        self
    }

    /// Skip the next `skip` rules once the rule applied.
    pub fn set_skip(&mut self, skip: u16) -> &mut Self {
        self.skip = skip;
        self
    }

    /// Finish the rule, checking that every back-reference it uses
    /// can be captured by its patterns.
    pub fn build(self, global: bool) -> Result<Rule, BuildError> {
        let initial_match = self.initial_match.ok_or(BuildError::InvalidState("a match"))?;
        if self.actions.is_empty() {
            return Err(BuildError::InvalidState("an action"));
        }

        let rule_groups = initial_match.capture_count();
        let condition_groups = self
            .conditions
            .as_ref()
            .map(|c| c.capture_count())
            .unwrap_or(0);
        let templates = self
            .conditions
            .iter()
            .flat_map(|c| c.items().iter().map(|c| c.input()))
            .chain(self.actions.iter().map(|a| a.url()));
        for template in templates {
            for reference in template.references() {
                let (index, available) = match reference {
                    Reference::Rule(n) => (n, rule_groups),
                    Reference::Condition(n) => (n, condition_groups),
                };
                if index >= available {
                    return Err(BuildError::BackReference {
                        reference: reference.to_string(),
                        available,
                    });
                }
            }
        }

        Ok(Rule {
            name: self.name,
            enabled: self.enabled,
            initial_match,
            conditions: self.conditions,
            actions: self.actions,
            global,
            last: self.last,
            skip: self.skip,
        })
    }
}
