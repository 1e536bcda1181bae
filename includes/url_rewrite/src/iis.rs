//! IIS `<rewrite>` configuration sections.
//!
//! The section may be a document of its own or nested anywhere inside
//! a larger file such as `web.config`.
//!
//! ```xml
//! <rewrite>
//!   <rewriteMaps>
//!     <rewriteMap name="Legacy" defaultValue="/">
//!       <add key="/old" value="/new" />
//!     </rewriteMap>
//!   </rewriteMaps>
//!   <rules>
//!     <rule name="legacy" stopProcessing="true">
//!       <match url="^/(.*)" />
//!       <action type="Redirect" url="{Legacy:{R:0}}" redirectType="Found" />
//!     </rule>
//!   </rules>
//! </rewrite>
//! ```
use std::str::FromStr;

use roxmltree::{Document, Node};

use super::builder::{MatchType, PatternSyntax, RuleBuilder, RuleOptions};
use super::condition::LogicalGrouping;
use super::error::{BuildError, IisError};
use super::map::{RewriteMap, RewriteMaps};
use super::pattern::Pattern;
use super::rule::{Action, ActionKind, RedirectType, Rule};

/// `type` attribute of an `<action>`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
enum ActionType {
    #[default]
    None,
    Rewrite,
    Redirect,
    CustomResponse,
    AbortRequest,
}

impl FromStr for ActionType {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "none" => Ok(Self::None),
            "rewrite" => Ok(Self::Rewrite),
            "redirect" => Ok(Self::Redirect),
            "customresponse" => Ok(Self::CustomResponse),
            "abortrequest" => Ok(Self::AbortRequest),
            _ => Err(()),
        }
    }
}

/// Parse a rewrite section with the default [`RuleOptions`] and no
/// extra rewrite maps.
#[inline]
pub fn parse(xml: &str) -> Result<Vec<Rule>, IisError> {
    parse_with(xml, &RewriteMaps::new(), &RuleOptions::default())
}

/// Parse a rewrite section into rules.
///
/// `maps` supersede the rewrite maps of the same name declared in the
/// document. Global rules come first, followed by the regular rules.
/// Disabled rules are dropped. A document without a `<rewrite>`
/// element yields no rules.
pub fn parse_with(
    xml: &str,
    maps: &RewriteMaps,
    options: &RuleOptions,
) -> Result<Vec<Rule>, IisError> {
    let doc = Document::parse(xml)?;
    let Some(root) = doc.descendants().find(|n| n.has_tag_name("rewrite")) else {
        return Ok(Vec::new());
    };

    let mut maps = maps.clone();
    if let Some(section) = first(root, "rewriteMaps") {
        for node in section.children().filter(|n| n.has_tag_name("rewriteMap")) {
            maps.insert_missing(rewrite_map(node)?);
        }
    }

    let parser = Parser {
        maps: &maps,
        options,
    };
    let mut rules = Vec::new();
    for (tag, global) in [("globalRules", true), ("rules", false)] {
        let Some(section) = first(root, tag) else {
            continue;
        };
        for node in section.children().filter(|n| n.has_tag_name("rule")) {
            if let Some(rule) = parser.rule(node, global)? {
                rules.push(rule);
            }
        }
    }
    Ok(rules)
}

#[inline]
fn first<'a, 'input>(node: Node<'a, 'input>, tag: &str) -> Option<Node<'a, 'input>> {
    node.descendants().find(|n| n.has_tag_name(tag))
}

#[inline]
fn child<'a, 'input>(node: Node<'a, 'input>, tag: &str) -> Option<Node<'a, 'input>> {
    node.children().find(|n| n.has_tag_name(tag))
}

fn location(node: Node) -> (u32, u32) {
    let pos = node.document().text_pos_at(node.range().start);
    (pos.row, pos.col)
}

fn format_error<S: Into<String>>(node: Node, message: S) -> IisError {
    let (line, column) = location(node);
    IisError::Format {
        line,
        column,
        message: message.into(),
    }
}

fn build_error(node: Node, err: BuildError) -> IisError {
    match err {
        BuildError::Unsupported(feature) => {
            let (line, column) = location(node);
            IisError::Unsupported {
                line,
                column,
                message: format!("{feature} is not supported"),
            }
        }
        err => format_error(node, err.to_string()),
    }
}

fn parse_bool(node: Node, attr: &str, default: bool) -> Result<bool, IisError> {
    let Some(value) = node.attribute(attr) else {
        return Ok(default);
    };
    match value.trim() {
        v if v.eq_ignore_ascii_case("true") => Ok(true),
        v if v.eq_ignore_ascii_case("false") => Ok(false),
        _ => Err(format_error(
            node,
            format!("The {attr} parameter '{value}' was not recognized"),
        )),
    }
}

fn parse_enum<T: FromStr>(node: Node, attr: &str, default: T) -> Result<T, IisError> {
    let Some(value) = node.attribute(attr) else {
        return Ok(default);
    };
    T::from_str(value.trim()).map_err(|_| {
        format_error(
            node,
            format!("The {attr} parameter '{value}' was not recognized"),
        )
    })
}

fn rewrite_map(node: Node) -> Result<RewriteMap, IisError> {
    let name = node
        .attribute("name")
        .ok_or_else(|| format_error(node, "Rewrite map must have a name attribute"))?;
    let mut map = RewriteMap::new(name);
    if let Some(default) = node.attribute("defaultValue") {
        map = map.default_value(default);
    }
    for entry in node.children().filter(|n| n.has_tag_name("add")) {
        let (Some(key), Some(value)) = (entry.attribute("key"), entry.attribute("value")) else {
            return Err(format_error(
                entry,
                "Rewrite map entries must have a key and a value attribute",
            ));
        };
        map.insert(key, value);
    }
    Ok(map)
}

struct Parser<'a> {
    maps: &'a RewriteMaps,
    options: &'a RuleOptions,
}

impl Parser<'_> {
    fn rule(&self, node: Node, global: bool) -> Result<Option<Rule>, IisError> {
        if !parse_bool(node, "enabled", true)? {
            tracing::debug!(name = node.attribute("name"), "skipping disabled rule");
            return Ok(None);
        }

        let mut builder = RuleBuilder::new(self.options.clone());
        if let Some(name) = node.attribute("name") {
            builder.set_name(name);
        }
        let syntax = parse_enum(node, "patternSyntax", PatternSyntax::ECMAScript)?;
        let stop_processing = parse_bool(node, "stopProcessing", false)?;

        let matcher = child(node, "match")
            .ok_or_else(|| format_error(node, "Cannot have rule without match"))?;
        let action = child(node, "action")
            .ok_or_else(|| format_error(node, "Rule does not have an associated action attribute"))?;

        let url = matcher
            .attribute("url")
            .ok_or_else(|| format_error(matcher, "Match must have Url Attribute"))?;
        let ignore_case = parse_bool(matcher, "ignoreCase", true)?;
        let negate = parse_bool(matcher, "negate", false)?;
        builder
            .set_match(url, ignore_case, negate, syntax)
            .map_err(|err| build_error(matcher, err))?;

        if let Some(conditions) = child(node, "conditions") {
            self.conditions(conditions, &mut builder, syntax)?;
        }

        builder.add_action(self.action(action, stop_processing)?);
        builder
            .build(global)
            .map(Some)
            .map_err(|err| build_error(node, err))
    }

    fn conditions(
        &self,
        node: Node,
        builder: &mut RuleBuilder,
        syntax: PatternSyntax,
    ) -> Result<(), IisError> {
        let grouping = parse_enum(node, "logicalGrouping", LogicalGrouping::MatchAll)?;
        let track_all = parse_bool(node, "trackAllCaptures", false)?;
        builder.add_conditions(grouping, track_all);

        for cond in node.children().filter(|n| n.has_tag_name("add")) {
            let ignore_case = parse_bool(cond, "ignoreCase", true)?;
            let negate = parse_bool(cond, "negate", false)?;
            let match_type = parse_enum(cond, "matchType", MatchType::Pattern)?;
            let input = cond
                .attribute("input")
                .ok_or_else(|| format_error(cond, "Conditions must have an input attribute"))?;
            let input = Pattern::parse_iis(input, self.maps)
                .map_err(|err| format_error(cond, err.to_string()))?;
            builder
                .add_condition(
                    input,
                    cond.attribute("pattern"),
                    syntax,
                    match_type,
                    ignore_case,
                    negate,
                )
                .map_err(|err| build_error(cond, err))?;
        }
        Ok(())
    }

    fn action(&self, node: Node, stop_processing: bool) -> Result<Action, IisError> {
        let action_type = parse_enum(node, "type", ActionType::None)?;
        let redirect_type = parse_enum(node, "redirectType", RedirectType::Permanent)?;
        let append_query = parse_bool(node, "appendQueryString", true)?;

        let url = match node.attribute("url") {
            Some("") => {
                return Err(format_error(
                    node,
                    "Url attribute cannot contain an empty string",
                ));
            }
            Some(url) => url,
            None => "",
        };
        let url = Pattern::parse_iis(url, self.maps).map_err(|err| format_error(node, err.to_string()))?;

        let kind = match action_type {
            ActionType::None => ActionKind::None,
            ActionType::Rewrite => ActionKind::Rewrite,
            ActionType::Redirect => ActionKind::Redirect(redirect_type.status()),
            ActionType::AbortRequest => ActionKind::Abort,
            ActionType::CustomResponse => {
                let status = node.attribute("statusCode").ok_or_else(|| {
                    format_error(node, "Custom response must have a statusCode attribute")
                })?;
                let status = parse_enum::<u16>(node, "statusCode", 0)
                    .ok()
                    .filter(|s| (100..600).contains(s))
                    .ok_or_else(|| {
                        format_error(
                            node,
                            format!("The statusCode parameter '{status}' was not recognized"),
                        )
                    })?;
                ActionKind::CustomResponse {
                    status,
                    reason: node.attribute("statusReason").map(|r| r.to_owned()),
                }
            }
        };
        Ok(Action::new(kind, url)
            .append_query(append_query)
            .stop_processing(stop_processing))
    }
}
