use std::str::FromStr;

use crate::error::{CondError, RuleError};

/// Flags known to mod_rewrite that this engine refuses to emulate.
const UNSUPPORTED: &[&str] = &[
    "c",
    "chain",
    "n",
    "next",
    "p",
    "proxy",
    "co",
    "cookie",
    "e",
    "env",
    "t",
    "type",
    "h",
    "handler",
    "pt",
    "passthrough",
    "ns",
    "nosubreq",
];

#[inline]
fn parse_int(s: &str, default: u16) -> Result<u16, RuleError> {
    match s.is_empty() {
        true => Ok(default),
        false => Ok(u16::from_str(s)?),
    }
}

#[inline]
fn parse_status(s: &str, default: u16) -> Result<u16, RuleError> {
    let status = parse_int(s, default)?;
    match !(300..600).contains(&status) {
        true => Err(RuleError::InvalidFlagStatus(s.to_owned())),
        false => Ok(status),
    }
}

/// Strip the surrounding brackets of a flag list and split it.
fn split_flags(s: &str) -> Option<impl Iterator<Item = &str>> {
    let inner = s.strip_prefix('[')?.strip_suffix(']')?;
    Some(inner.split(',').map(|s| s.trim()).filter(|s| !s.is_empty()))
}

/// Modifier flag of a `RewriteRule`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum RuleFlag {
    Last,
    End,
    Skip(u16),
    NoCase,
    NoEscape,
    EscapeBackReferences,
    QueryAppend,
    QueryDiscard,
    Redirect(u16),
    Forbidden,
    Gone,
}

impl RuleFlag {
    #[inline]
    fn is_last(&self) -> bool {
        matches!(self, Self::Last | Self::End)
    }

    #[inline]
    fn is_resolve(&self) -> bool {
        matches!(self, Self::Redirect(_) | Self::Forbidden | Self::Gone)
    }
}

impl FromStr for RuleFlag {
    type Err = RuleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (p, v) = match s.split_once('=') {
            Some((prefix, suffix)) => (prefix, suffix),
            None => (s, ""),
        };
        let name = p.to_lowercase();
        match name.as_str() {
            "l" | "last" => Ok(Self::Last),
            "end" => Ok(Self::End),
            "s" | "skip" => Ok(Self::Skip(parse_int(v, 1)?)),
            "nc" | "nocase" => Ok(Self::NoCase),
            "ne" | "noescape" => Ok(Self::NoEscape),
            "b" => Ok(Self::EscapeBackReferences),
            "qsa" | "qsappend" => Ok(Self::QueryAppend),
            "qsd" | "qsdiscard" => Ok(Self::QueryDiscard),
            "r" | "redirect" => Ok(Self::Redirect(parse_status(v, 302)?)),
            "f" | "forbidden" => Ok(Self::Forbidden),
            "g" | "gone" => Ok(Self::Gone),
            name if UNSUPPORTED.contains(&name) => Err(RuleError::UnsupportedFlag(s.to_owned())),
            _ => Err(RuleError::InvalidFlag(s.to_owned())),
        }
    }
}

/// Parsed `[...]` suffix of a `RewriteRule`.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub(crate) struct RuleFlags(pub Vec<RuleFlag>);

impl RuleFlags {
    #[inline]
    pub fn has(&self, flag: RuleFlag) -> bool {
        self.0.contains(&flag)
    }

    pub fn skip(&self) -> u16 {
        self.0
            .iter()
            .find_map(|f| match f {
                RuleFlag::Skip(n) => Some(*n),
                _ => None,
            })
            .unwrap_or(0)
    }

    pub fn resolve(&self) -> Option<RuleFlag> {
        self.0.iter().copied().find(|f| f.is_resolve())
    }
}

impl FromStr for RuleFlags {
    type Err = RuleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let flags = split_flags(s)
            .ok_or_else(|| RuleError::FlagsMissingBrackets(s.to_owned()))?
            .map(RuleFlag::from_str)
            .collect::<Result<Vec<RuleFlag>, _>>()?;
        if flags.is_empty() {
            return Err(RuleError::FlagsEmpty);
        }
        let num_last = flags.iter().filter(|f| f.is_last()).count();
        let num_resolve = flags.iter().filter(|f| f.is_resolve()).count();
        if num_last > 1 || num_resolve > 1 {
            return Err(RuleError::FlagsMutuallyExclusive);
        }
        Ok(Self(flags))
    }
}

/// Parsed `[...]` suffix of a `RewriteCond`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub(crate) struct CondFlags {
    pub nocase: bool,
    pub or_next: bool,
}

impl FromStr for CondFlags {
    type Err = CondError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut flags = Self::default();
        let mut empty = true;
        for flag in split_flags(s).ok_or_else(|| CondError::FlagsMissingBrackets(s.to_owned()))? {
            empty = false;
            match flag.to_lowercase().as_str() {
                "nc" | "nocase" => flags.nocase = true,
                "or" | "ornext" => flags.or_next = true,
                _ => return Err(CondError::InvalidFlag(flag.to_owned())),
            }
        }
        if empty {
            return Err(CondError::FlagsEmpty);
        }
        Ok(flags)
    }
}
