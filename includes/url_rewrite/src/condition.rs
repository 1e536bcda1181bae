//! Boolean evaluation of the conditions guarding a rule.
use std::str::FromStr;

use super::backref::Captures;
use super::context::RequestContext;
use super::error::{BackReferenceError, UnknownValue};
use super::matcher::{MatchResult, Matcher};
use super::pattern::Pattern;

/// How the conditions of a rule combine.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum LogicalGrouping {
    #[default]
    MatchAll,
    MatchAny,
}

impl FromStr for LogicalGrouping {
    type Err = UnknownValue;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "matchall" => Ok(Self::MatchAll),
            "matchany" => Ok(Self::MatchAny),
            _ => Err(UnknownValue(s.to_owned())),
        }
    }
}

/// Single guard: expand `input`, then test it with `matcher`.
///
/// With `or_next` set the condition is OR'ed with the one after it.
#[derive(Clone, Debug)]
pub struct Condition {
    input: Pattern,
    matcher: Matcher,
    or_next: bool,
}

impl Condition {
    pub fn new(input: Pattern, matcher: Matcher, or_next: bool) -> Self {
        Self {
            input,
            matcher,
            or_next,
        }
    }

    #[inline]
    pub fn input(&self) -> &Pattern {
        &self.input
    }

    #[inline]
    pub fn matcher(&self) -> &Matcher {
        &self.matcher
    }

    #[inline]
    pub fn or_next(&self) -> bool {
        self.or_next
    }

    fn evaluate(
        &self,
        ctx: &RequestContext,
        captures: &Captures,
        global: bool,
    ) -> Result<MatchResult, BackReferenceError> {
        let candidate = self.input.evaluate(ctx, captures, global)?;
        Ok(self.matcher.evaluate(&candidate, ctx.get_file_system()))
    }
}

/// Ordered list of [`Condition`]s evaluated left to right.
#[derive(Clone, Debug, Default)]
pub struct Conditions {
    items: Vec<Condition>,
    grouping: LogicalGrouping,
    track_all_captures: bool,
}

impl Conditions {
    pub fn new(grouping: LogicalGrouping, track_all_captures: bool) -> Self {
        Self {
            items: Vec::new(),
            grouping,
            track_all_captures,
        }
    }

    pub fn push(&mut self, condition: Condition) {
        self.items.push(condition);
    }

    #[inline]
    pub fn items(&self) -> &[Condition] {
        &self.items
    }

    #[inline]
    pub fn grouping(&self) -> LogicalGrouping {
        self.grouping
    }

    #[inline]
    pub fn track_all_captures(&self) -> bool {
        self.track_all_captures
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Upper bound of `{C:N}` indices that can resolve after evaluation.
    pub(crate) fn capture_count(&self) -> usize {
        let counts = self.items.iter().map(|c| c.matcher.capture_count());
        match self.track_all_captures {
            true => counts.sum(),
            false => counts.max().unwrap_or(0),
        }
    }

    /// Evaluate every condition, recording captures as they match.
    ///
    /// Conditions whose outcome can no longer change the result are
    /// skipped, unless captures from every condition are tracked in
    /// which case they run for their captures only.
    pub fn evaluate(
        &self,
        ctx: &RequestContext,
        captures: &mut Captures,
        global: bool,
    ) -> Result<bool, BackReferenceError> {
        let track_all = self.track_all_captures;
        let mut outcome = true;
        let mut open = false;
        let mut chain_ok = false;
        for condition in self.items.iter() {
            let decided = !outcome || (open && chain_ok);
            if !decided || track_all {
                let result = condition.evaluate(ctx, captures, global)?;
                let ok = result.success();
                if ok {
                    captures.record_condition(result.into_groups(), track_all);
                }
                if !decided {
                    if condition.or_next {
                        chain_ok = ok;
                    } else if !ok {
                        outcome = false;
                        if !track_all {
                            return Ok(false);
                        }
                    }
                }
            }
            open = condition.or_next;
            if !open {
                chain_ok = false;
            }
        }
        if open && !chain_ok {
            outcome = false;
        }
        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::map::RewriteMaps;
    use crate::matcher::DEFAULT_MATCH_TIMEOUT;

    fn cond(input: &str, regex: &str, or_next: bool) -> Condition {
        Condition::new(
            Pattern::parse_iis(input, &RewriteMaps::new()).unwrap(),
            Matcher::regex(regex, false, false, DEFAULT_MATCH_TIMEOUT).unwrap(),
            or_next,
        )
    }

    fn conditions(items: Vec<Condition>, grouping: LogicalGrouping, track_all: bool) -> Conditions {
        let mut conds = Conditions::new(grouping, track_all);
        for item in items {
            let or_next = item.or_next() || grouping == LogicalGrouping::MatchAny;
            conds.push(Condition::new(item.input, item.matcher, or_next));
        }
        conds
    }

    fn run(conds: &Conditions, uri: &str) -> (bool, Captures) {
        let ctx = RequestContext::new(uri).host("example.com");
        let mut caps = Captures::default();
        let ok = conds.evaluate(&ctx, &mut caps, false).unwrap();
        (ok, caps)
    }

    #[test]
    fn test_grouping() {
        assert_eq!(LogicalGrouping::from_str("MatchAny"), Ok(LogicalGrouping::MatchAny));
        assert_eq!(LogicalGrouping::from_str("matchall"), Ok(LogicalGrouping::MatchAll));
        assert!(LogicalGrouping::from_str("MatchSome").is_err());
    }

    #[test]
    fn test_empty_succeeds() {
        let (ok, caps) = run(&Conditions::default(), "/");
        assert!(ok);
        assert!(caps.conditions().is_empty());
    }

    #[test]
    fn test_match_all() {
        let conds = conditions(
            vec![cond("{HTTP_HOST}", "^example", false), cond("{URL}", "^/a", false)],
            LogicalGrouping::MatchAll,
            false,
        );
        assert!(run(&conds, "/a").0);
        assert!(!run(&conds, "/b").0);
    }

    #[test]
    fn test_match_any() {
        let conds = conditions(
            vec![cond("{URL}", "^/a", false), cond("{URL}", "^/b", false)],
            LogicalGrouping::MatchAny,
            false,
        );
        assert!(run(&conds, "/a").0);
        assert!(run(&conds, "/b").0);
        assert!(!run(&conds, "/c").0);
    }

    #[test]
    fn test_or_chain() {
        // (a OR b) AND c
        let conds = conditions(
            vec![
                cond("{URL}", "^/a", true),
                cond("{URL}", "^/b", false),
                cond("{QUERY_STRING}", "x", false),
            ],
            LogicalGrouping::MatchAll,
            false,
        );
        assert!(run(&conds, "/a?x").0);
        assert!(run(&conds, "/b?x").0);
        assert!(!run(&conds, "/a").0);
        assert!(!run(&conds, "/c?x").0);
    }

    #[test]
    fn test_last_match_captures() {
        let conds = conditions(
            vec![
                cond("{URL}", "^/(a)/(b)", false),
                cond("{HTTP_HOST}", r"^(\w+)\.com", false),
            ],
            LogicalGrouping::MatchAll,
            false,
        );
        let (ok, caps) = run(&conds, "/a/b");
        assert!(ok);
        assert_eq!(caps.conditions().len(), 2);
        assert_eq!(caps.conditions().get(1), Ok("example"));
        assert_eq!(conds.capture_count(), 3);
    }

    #[test]
    fn test_track_all_captures() {
        let conds = conditions(
            vec![
                cond("{URL}", "^/(a)/(b)", false),
                cond("{HTTP_HOST}", r"^(\w+)\.com", false),
            ],
            LogicalGrouping::MatchAll,
            true,
        );
        let (ok, caps) = run(&conds, "/a/b");
        assert!(ok);
        assert_eq!(caps.conditions().len(), 5);
        assert_eq!(caps.conditions().get(2), Ok("b"));
        assert_eq!(caps.conditions().get(4), Ok("example"));
        assert_eq!(conds.capture_count(), 5);
    }

    #[test]
    fn test_short_circuit_with_track_all() {
        // the second member of the satisfied chain still runs for captures
        let any = conditions(
            vec![cond("{URL}", "^/(a)", false), cond("{URL}", "^/(a)(.*)", false)],
            LogicalGrouping::MatchAny,
            true,
        );
        let (ok, caps) = run(&any, "/ab");
        assert!(ok);
        assert_eq!(caps.conditions().len(), 5);

        let any = conditions(
            vec![cond("{URL}", "^/(a)", false), cond("{URL}", "^/(a)(.*)", false)],
            LogicalGrouping::MatchAny,
            false,
        );
        let (ok, caps) = run(&any, "/ab");
        assert!(ok);
        assert_eq!(caps.conditions().len(), 2);

        // later conditions still capture after an AND failure
        let all = conditions(
            vec![cond("{URL}", "^/z", false), cond("{URL}", "^/(a)", false)],
            LogicalGrouping::MatchAll,
            true,
        );
        let (ok, caps) = run(&all, "/a");
        assert!(!ok);
        assert_eq!(caps.conditions().get(1), Ok("a"));
    }

    #[test]
    fn test_back_reference_error() {
        let conds = conditions(vec![cond("{C:4}", ".*", false)], LogicalGrouping::MatchAll, false);
        let ctx = RequestContext::new("/");
        let mut caps = Captures::default();
        assert!(conds.evaluate(&ctx, &mut caps, false).is_err());
    }
}
