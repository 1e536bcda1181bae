use std::cmp::Ordering;
use std::str::FromStr;
use std::time::{Duration, Instant};

use regex_automata::{
    MatchKind as SearchKind,
    meta::{self, Regex},
    util,
};
use unicase::UniCase;

use super::context::FileSystem;
use super::error::{BuildError, UnknownValue};

/// Default search budget for a single regex evaluation.
pub const DEFAULT_MATCH_TIMEOUT: Duration = Duration::from_millis(100);

/// Outcome of evaluating a single [`Matcher`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MatchResult {
    success: bool,
    groups: Vec<String>,
    timed_out: bool,
}

impl MatchResult {
    pub const EMPTY_SUCCESS: Self = Self {
        success: true,
        groups: Vec::new(),
        timed_out: false,
    };

    pub const EMPTY_FAILURE: Self = Self {
        success: false,
        groups: Vec::new(),
        timed_out: false,
    };

    const TIMED_OUT: Self = Self {
        success: false,
        groups: Vec::new(),
        timed_out: true,
    };

    #[inline]
    fn from_bool(success: bool) -> Self {
        match success {
            true => Self::EMPTY_SUCCESS,
            false => Self::EMPTY_FAILURE,
        }
    }

    #[inline]
    pub fn success(&self) -> bool {
        self.success
    }

    /// Captured groups in pattern order, group 0 first.
    #[inline]
    pub fn groups(&self) -> &[String] {
        &self.groups
    }

    /// True when the regex search ran past its time budget.
    #[inline]
    pub fn timed_out(&self) -> bool {
        self.timed_out
    }

    #[inline]
    pub fn into_groups(self) -> Vec<String> {
        self.groups
    }
}

/// Comparison operators usable as an Apache `CondPattern`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Compare {
    Precedes,
    Follows,
    PrecedesOrEquals,
    FollowsOrEquals,
    Equal,
    NotEqual,
    GreaterThan,
    GreaterOrEqual,
    LesserThan,
    LesserOrEqual,
}

impl Compare {
    /// Evaluate the comparison between the candidate and the operand.
    ///
    /// Lexical operators compare strings, the rest compare integers
    /// and fail when either side is not a number.
    pub fn compare(&self, first: &str, second: &str, ignore_case: bool) -> bool {
        if self.is_lexical() {
            let ordering = match ignore_case {
                true => first.to_lowercase().cmp(&second.to_lowercase()),
                false => first.cmp(second),
            };
            return match self {
                Self::Precedes => ordering == Ordering::Less,
                Self::Follows => ordering == Ordering::Greater,
                Self::PrecedesOrEquals => ordering != Ordering::Greater,
                _ => ordering != Ordering::Less,
            };
        }
        let Ok(first) = first.trim().parse::<i64>() else {
            return false;
        };
        let Ok(second) = second.trim().parse::<i64>() else {
            return false;
        };
        match self {
            Self::Equal => first == second,
            Self::NotEqual => first != second,
            Self::GreaterThan => first > second,
            Self::GreaterOrEqual => first >= second,
            Self::LesserThan => first < second,
            _ => first <= second,
        }
    }

    #[inline]
    pub fn is_lexical(&self) -> bool {
        matches!(
            self,
            Self::Precedes | Self::Follows | Self::PrecedesOrEquals | Self::FollowsOrEquals
        )
    }
}

impl FromStr for Compare {
    type Err = UnknownValue;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "<" => Ok(Self::Precedes),
            ">" => Ok(Self::Follows),
            "<=" => Ok(Self::PrecedesOrEquals),
            ">=" => Ok(Self::FollowsOrEquals),
            "-eq" => Ok(Self::Equal),
            "-ne" => Ok(Self::NotEqual),
            "-gt" => Ok(Self::GreaterThan),
            "-ge" => Ok(Self::GreaterOrEqual),
            "-lt" => Ok(Self::LesserThan),
            "-le" => Ok(Self::LesserOrEqual),
            _ => Err(UnknownValue(s.to_owned())),
        }
    }
}

/// Kind of test a [`Matcher`] performs.
#[derive(Clone, Debug)]
pub enum MatchKind {
    Regex { regex: Regex, timeout: Duration },
    Exact { value: String, ignore_case: bool },
    IsFile,
    IsDirectory,
    Compare {
        op: Compare,
        operand: String,
        ignore_case: bool,
    },
}

/// Compiled test applied to a rule's input or a condition's input.
///
/// Matchers hold no per-request state and are shared freely between
/// threads. Captured groups are returned in the [`MatchResult`] and it
/// is up to the caller to record them.
#[derive(Clone, Debug)]
pub struct Matcher {
    kind: MatchKind,
    negate: bool,
}

impl Matcher {
    /// Compile a regex matcher.
    pub fn regex(
        pattern: &str,
        ignore_case: bool,
        negate: bool,
        timeout: Duration,
    ) -> Result<Self, BuildError> {
        let regex = Regex::builder()
            .configure(
                meta::Config::new()
                    .nfa_size_limit(Some(10 * (1 << 20)))
                    .hybrid_cache_capacity(2 * (1 << 20))
                    .match_kind(SearchKind::LeftmostFirst)
                    .utf8_empty(true),
            )
            .syntax(util::syntax::Config::new().case_insensitive(ignore_case))
            .build(pattern)
            .map_err(|err| BuildError::InvalidRegex {
                pattern: pattern.to_owned(),
                reason: err.to_string(),
            })?;
        Ok(Self {
            kind: MatchKind::Regex { regex, timeout },
            negate,
        })
    }

    pub fn exact<S: Into<String>>(value: S, ignore_case: bool, negate: bool) -> Self {
        Self {
            kind: MatchKind::Exact {
                value: value.into(),
                ignore_case,
            },
            negate,
        }
    }

    pub fn is_file(negate: bool) -> Self {
        Self {
            kind: MatchKind::IsFile,
            negate,
        }
    }

    pub fn is_directory(negate: bool) -> Self {
        Self {
            kind: MatchKind::IsDirectory,
            negate,
        }
    }

    pub fn compare<S: Into<String>>(op: Compare, operand: S, ignore_case: bool, negate: bool) -> Self {
        Self {
            kind: MatchKind::Compare {
                op,
                operand: operand.into(),
                ignore_case,
            },
            negate,
        }
    }

    #[inline]
    pub fn kind(&self) -> &MatchKind {
        &self.kind
    }

    #[inline]
    pub fn negate(&self) -> bool {
        self.negate
    }

    /// Number of groups a successful evaluation captures.
    ///
    /// Only a non-negated regex ever captures; negated regexes succeed
    /// exactly when nothing matched.
    pub fn capture_count(&self) -> usize {
        match (&self.kind, self.negate) {
            (MatchKind::Regex { regex, .. }, false) => regex.captures_len(),
            _ => 0,
        }
    }

    /// Evaluate the matcher against the candidate string.
    pub fn evaluate(&self, candidate: &str, fs: &dyn FileSystem) -> MatchResult {
        match &self.kind {
            MatchKind::Regex { regex, timeout } => self.search(regex, *timeout, candidate),
            MatchKind::Exact { value, ignore_case } => {
                let equal = match ignore_case {
                    true => UniCase::new(candidate) == UniCase::new(value.as_str()),
                    false => candidate == value,
                };
                MatchResult::from_bool(equal != self.negate)
            }
            MatchKind::IsFile => self.file_test(candidate, fs.is_file(candidate)),
            MatchKind::IsDirectory => self.file_test(candidate, fs.is_dir(candidate)),
            MatchKind::Compare {
                op,
                operand,
                ignore_case,
            } => MatchResult::from_bool(op.compare(candidate, operand, *ignore_case) != self.negate),
        }
    }

    fn search(&self, regex: &Regex, timeout: Duration, candidate: &str) -> MatchResult {
        let started = Instant::now();
        let mut caps = regex.create_captures();
        regex.captures(candidate, &mut caps);
        if started.elapsed() >= timeout {
            tracing::warn!(
                candidate_len = candidate.len(),
                ?timeout,
                "regex evaluation exceeded its time budget, treating as no match"
            );
            return MatchResult::TIMED_OUT;
        }
        if !caps.is_match() {
            return MatchResult::from_bool(self.negate);
        }
        if self.negate {
            return MatchResult::EMPTY_FAILURE;
        }
        let groups = (0..caps.group_len())
            .map(|index| {
                caps.get_group(index)
                    .map(|span| candidate[span].to_owned())
                    .unwrap_or_default()
            })
            .collect();
        MatchResult {
            success: true,
            groups,
            timed_out: false,
        }
    }

    fn file_test(&self, candidate: &str, result: std::io::Result<bool>) -> MatchResult {
        match result {
            Ok(found) => MatchResult::from_bool(found != self.negate),
            Err(err) => {
                tracing::debug!(candidate, "file test failed: {err}");
                MatchResult::EMPTY_FAILURE
            }
        }
    }
}
