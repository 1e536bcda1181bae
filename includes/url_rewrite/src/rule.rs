use std::str::FromStr;

use super::condition::Conditions;
use super::error::UnknownValue;
use super::matcher::Matcher;
use super::pattern::Pattern;

/// Status code family of a redirect action.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum RedirectType {
    #[default]
    Permanent,
    Found,
    SeeOther,
    Temporary,
}

impl RedirectType {
    pub fn status(&self) -> u16 {
        match self {
            Self::Permanent => 301,
            Self::Found => 302,
            Self::SeeOther => 303,
            Self::Temporary => 307,
        }
    }
}

impl FromStr for RedirectType {
    type Err = UnknownValue;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "permanent" => Ok(Self::Permanent),
            "found" => Ok(Self::Found),
            "seeother" => Ok(Self::SeeOther),
            "temporary" => Ok(Self::Temporary),
            _ => Err(UnknownValue(s.to_owned())),
        }
    }
}

/// What an [`Action`] does once its rule matched.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ActionKind {
    /// Replace the internal path and query.
    Rewrite,
    /// Answer with a redirect to the expanded url.
    Redirect(u16),
    Forbidden,
    Gone,
    CustomResponse {
        status: u16,
        reason: Option<String>,
    },
    /// Drop the request without an answer.
    Abort,
    None,
}

impl ActionKind {
    /// Returns true if the action ends request processing.
    #[inline]
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Rewrite | Self::None)
    }
}

/// Single step applied by a matching [`Rule`].
#[derive(Clone, Debug)]
pub struct Action {
    url: Pattern,
    kind: ActionKind,
    append_query: bool,
    stop_processing: bool,
    escape_backreferences: bool,
}

impl Action {
    pub fn new(kind: ActionKind, url: Pattern) -> Self {
        Self {
            url,
            kind,
            append_query: true,
            stop_processing: false,
            escape_backreferences: false,
        }
    }

    pub fn rewrite(url: Pattern) -> Self {
        Self::new(ActionKind::Rewrite, url)
    }

    pub fn redirect(url: Pattern, status: u16) -> Self {
        Self::new(ActionKind::Redirect(status), url)
    }

    /// Keep the query-string of the request, joining it after the
    /// query of the expanded url. Enabled by default.
    pub fn append_query(mut self, append: bool) -> Self {
        self.append_query = append;
        self
    }

    /// Skip the remaining actions of the rule after this one.
    pub fn stop_processing(mut self, stop: bool) -> Self {
        self.stop_processing = stop;
        self
    }

    /// Percent-encode back-reference values inserted into the url.
    pub fn escape_backreferences(mut self, escape: bool) -> Self {
        self.escape_backreferences = escape;
        self
    }

    #[inline]
    pub fn url(&self) -> &Pattern {
        &self.url
    }

    #[inline]
    pub fn kind(&self) -> &ActionKind {
        &self.kind
    }

    #[inline]
    pub fn get_append_query(&self) -> bool {
        self.append_query
    }

    #[inline]
    pub fn get_stop_processing(&self) -> bool {
        self.stop_processing
    }

    #[inline]
    pub fn get_escape_backreferences(&self) -> bool {
        self.escape_backreferences
    }
}

/// Compiled rewrite rule.
///
/// Built once through a [`RuleBuilder`](crate::RuleBuilder) and shared
/// read-only between every request afterwards.
#[derive(Clone, Debug)]
pub struct Rule {
    pub(crate) name: Option<String>,
    pub(crate) enabled: bool,
    pub(crate) initial_match: Matcher,
    pub(crate) conditions: Option<Conditions>,
    pub(crate) actions: Vec<Action>,
    pub(crate) global: bool,
    pub(crate) last: bool,
    pub(crate) skip: u16,
}

impl Rule {
    #[inline]
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    #[inline]
    pub fn enabled(&self) -> bool {
        self.enabled
    }

    #[inline]
    pub fn initial_match(&self) -> &Matcher {
        &self.initial_match
    }

    #[inline]
    pub fn conditions(&self) -> Option<&Conditions> {
        self.conditions.as_ref()
    }

    #[inline]
    pub fn actions(&self) -> &[Action] {
        &self.actions
    }

    /// Global rules match against the original absolute url.
    #[inline]
    pub fn global(&self) -> bool {
        self.global
    }

    /// Stop evaluating later rules once this rule applied.
    #[inline]
    pub fn last(&self) -> bool {
        self.last
    }

    /// Number of following rules skipped once this rule applied.
    #[inline]
    pub fn skip(&self) -> u16 {
        self.skip
    }
}
