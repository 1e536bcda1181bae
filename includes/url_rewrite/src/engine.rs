use std::borrow::Cow;

use super::backref::Captures;
use super::builder::{MatchType, PatternSyntax, RuleBuilder, RuleOptions};
use super::condition::LogicalGrouping;
use super::context::{RequestContext, Resolution};
use super::error::{ApacheError, BackReferenceError, BuildError, IisError};
use super::extra;
use super::map::RewriteMaps;
use super::pattern::Pattern;
use super::rule::{Action, ActionKind, Rule};
use super::{apache, iis};

/// Rewrite result.
///
/// Includes either the re-written uri, or the instant http-response.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Rewrite {
    Uri(String),
    Redirect(String, u16),
    Response(u16, Option<String>),
    Abort,
}

impl From<&RequestContext<'_>> for Rewrite {
    fn from(ctx: &RequestContext<'_>) -> Self {
        match ctx.resolution() {
            None => Self::Uri(ctx.path_and_query()),
            Some(Resolution::Redirect { status, location }) => {
                Self::Redirect(location.to_owned(), *status)
            }
            Some(Resolution::Response { status, reason }) => Self::Response(*status, reason.clone()),
            Some(Resolution::Abort) => Self::Abort,
        }
    }
}

/// Result of evaluating one rule.
enum RuleFlow {
    NotMatched,
    Applied,
    Halted,
}

/// Result of applying one action.
enum ActionFlow {
    Continue,
    Stop,
    Halt,
}

/// Ordered list of [`Rule`]s applied to each request.
///
/// # Example
///
/// ```
/// use url_rewrite::{Engine, Rewrite};
///
/// let mut engine = Engine::default();
/// engine.add_apache_rules(r#"
///   RewriteRule ^/file/(.*)     /tmp/$1      [L]
///   RewriteRule ^/redirect/(.*) /location/$1 [R=302]
///   RewriteRule ^/blocked/      -            [F]
/// "#).expect("failed to process rules");
///
/// let result = engine.rewrite("/redirect/a?b=c");
/// assert_eq!(result, Rewrite::Redirect("/location/a?b=c".to_owned(), 302));
/// ```
#[derive(Clone, Debug, Default)]
pub struct Engine {
    rules: Vec<Rule>,
    options: RuleOptions,
}

impl Engine {
    pub fn new(options: RuleOptions) -> Self {
        Self {
            rules: Vec::new(),
            options,
        }
    }

    #[inline]
    pub fn options(&self) -> &RuleOptions {
        &self.options
    }

    #[inline]
    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    /// Append already built rules to the end of the list.
    pub fn add_rules<I: IntoIterator<Item = Rule>>(&mut self, rules: I) -> &mut Self {
        self.rules.extend(rules);
        self
    }

    /// Parse Apache-style directives and append the resulting rules.
    pub fn add_apache_rules(&mut self, text: &str) -> Result<&mut Self, ApacheError> {
        let rules = apache::parse_with(text, &self.options)?;
        Ok(self.add_rules(rules))
    }

    /// Parse an IIS-style `<rewrite>` section and append its rules.
    pub fn add_iis_rules(&mut self, xml: &str) -> Result<&mut Self, IisError> {
        self.add_iis_rules_with(xml, &RewriteMaps::new())
    }

    /// Same as [`Engine::add_iis_rules`], with rewrite maps that
    /// supersede the maps of the same name declared in the xml.
    pub fn add_iis_rules_with(&mut self, xml: &str, maps: &RewriteMaps) -> Result<&mut Self, IisError> {
        let rules = iis::parse_with(xml, maps, &self.options)?;
        Ok(self.add_rules(rules))
    }

    /// Rewrite requests whose path matches the `pattern` regex.
    ///
    /// `replacement` is an Apache-style template, `$N` inserts the
    /// groups of `pattern`. The query of the request is appended to
    /// the query of the replacement. With `stop` no later rule is
    /// evaluated once this one applied.
    ///
    /// ```
    /// use url_rewrite::{Engine, Rewrite};
    ///
    /// let mut engine = Engine::default();
    /// engine.add_rewrite(r"/(.*)/(\d+)", "products/$1?id=$2", true).unwrap();
    /// assert_eq!(
    ///     engine.rewrite("/widgets/42"),
    ///     Rewrite::Uri("products/widgets?id=42".to_owned())
    /// );
    /// ```
    pub fn add_rewrite(
        &mut self,
        pattern: &str,
        replacement: &str,
        stop: bool,
    ) -> Result<&mut Self, BuildError> {
        let mut builder = RuleBuilder::new(self.options.clone());
        builder
            .set_match(pattern, false, false, PatternSyntax::ECMAScript)?
            .add_action(Action::rewrite(Pattern::parse_apache(replacement)?))
            .set_last(stop);
        let rule = builder.build(false)?;
        Ok(self.add_rules([rule]))
    }

    /// Redirect requests whose path matches the `pattern` regex.
    ///
    /// `replacement` is expanded like in [`Engine::add_rewrite`] and
    /// `status` must be a 3xx code.
    pub fn add_redirect(
        &mut self,
        pattern: &str,
        replacement: &str,
        status: u16,
    ) -> Result<&mut Self, BuildError> {
        check_redirect_status(status)?;
        let mut builder = RuleBuilder::new(self.options.clone());
        builder
            .set_match(pattern, false, false, PatternSyntax::ECMAScript)?
            .add_action(Action::redirect(Pattern::parse_apache(replacement)?, status));
        let rule = builder.build(false)?;
        Ok(self.add_rules([rule]))
    }

    /// Redirect every plain http request to the same url over https.
    pub fn add_redirect_to_https(&mut self, status: u16) -> Result<&mut Self, BuildError> {
        check_redirect_status(status)?;
        let maps = RewriteMaps::new();
        let mut builder = RuleBuilder::new(self.options.clone());
        builder
            .set_name("redirect to https")
            .set_match(".*", false, false, PatternSyntax::ECMAScript)?
            .add_conditions(LogicalGrouping::MatchAll, false)
            .add_condition(
                Pattern::parse_iis("{HTTPS}", &maps)?,
                Some("off"),
                PatternSyntax::ExactMatch,
                MatchType::Pattern,
                true,
                false,
            )?
            .add_action(Action::redirect(
                Pattern::parse_iis("https://{HTTP_HOST}{REQUEST_URI}", &maps)?,
                status,
            ));
        let rule = builder.build(true)?;
        Ok(self.add_rules([rule]))
    }

    /// Evaluate the configured rules against the request, rewriting
    /// its path and query in place.
    ///
    /// Returns the terminal resolution, if a rule produced one.
    pub fn apply<'c>(&self, ctx: &'c mut RequestContext<'_>) -> Option<&'c Resolution> {
        let mut index = 0;
        while let Some(rule) = self.rules.get(index) {
            index += 1;
            if !rule.enabled {
                continue;
            }
            match apply_rule(rule, ctx) {
                RuleFlow::NotMatched => continue,
                RuleFlow::Halted => break,
                RuleFlow::Applied if rule.last => break,
                RuleFlow::Applied => index += rule.skip as usize,
            }
        }
        ctx.resolution()
    }

    /// Evaluate the given uri with an otherwise empty request context.
    ///
    /// Rules that use server variables or file tests need a complete
    /// [`RequestContext`], see [`Engine::rewrite_ctx`].
    #[inline]
    pub fn rewrite(&self, uri: &str) -> Rewrite {
        let mut ctx = RequestContext::new(uri);
        self.rewrite_ctx(&mut ctx)
    }

    /// Evaluate the request context and summarize the outcome.
    pub fn rewrite_ctx(&self, ctx: &mut RequestContext<'_>) -> Rewrite {
        self.apply(ctx);
        Rewrite::from(&*ctx)
    }
}

#[inline]
fn check_redirect_status(status: u16) -> Result<(), BuildError> {
    match (300..400).contains(&status) {
        true => Ok(()),
        false => Err(BuildError::InvalidStatus(status)),
    }
}

fn apply_rule(rule: &Rule, ctx: &mut RequestContext<'_>) -> RuleFlow {
    let name = rule.name().unwrap_or_default();
    let result = {
        let candidate = match rule.global {
            true => Cow::Owned(ctx.full_url()),
            false => Cow::Borrowed(ctx.path()),
        };
        rule.initial_match
            .evaluate(&candidate, ctx.get_file_system())
    };
    if !result.success() {
        tracing::debug!(rule = name, "rule did not match");
        return RuleFlow::NotMatched;
    }

    let mut captures = Captures::default();
    captures.record_rule(result.into_groups());
    if let Some(conditions) = rule.conditions.as_ref() {
        match conditions.evaluate(ctx, &mut captures, rule.global) {
            Ok(true) => {}
            Ok(false) => {
                tracing::debug!(rule = name, "rule did not match");
                return RuleFlow::NotMatched;
            }
            Err(err) => {
                tracing::warn!(rule = name, "rejecting rule: {err}");
                return RuleFlow::NotMatched;
            }
        }
    }

    // nothing is rewritten unless every action can expand
    if let Err(err) = rule
        .actions
        .iter()
        .try_for_each(|action| action.url().check_references(&captures))
    {
        tracing::warn!(rule = name, "rejecting rule: {err}");
        return RuleFlow::NotMatched;
    }

    tracing::debug!(rule = name, "rule matched");
    for action in rule.actions.iter() {
        match apply_action(action, ctx, &captures, rule.global) {
            Ok(ActionFlow::Continue) => {}
            Ok(ActionFlow::Stop) => break,
            Ok(ActionFlow::Halt) => return RuleFlow::Halted,
            Err(err) => {
                tracing::warn!(rule = name, "rejecting rule: {err}");
                return RuleFlow::NotMatched;
            }
        }
    }
    RuleFlow::Applied
}

fn apply_action(
    action: &Action,
    ctx: &mut RequestContext<'_>,
    captures: &Captures,
    global: bool,
) -> Result<ActionFlow, BackReferenceError> {
    let flow = match action.get_stop_processing() {
        true => ActionFlow::Stop,
        false => ActionFlow::Continue,
    };
    let resolution = match action.kind() {
        ActionKind::None => return Ok(flow),
        ActionKind::Rewrite => {
            let url = expand(action, ctx, captures, global)?;
            let (target, query) = merge_query(ctx, &url, action.get_append_query());
            let origin = extra::split_origin(&target)
                .map(|(scheme, host, path)| (scheme.to_owned(), host.to_owned(), path.to_owned()));
            let path = match origin {
                Some((scheme, host, path)) => {
                    ctx.set_scheme_and_host(&scheme, &host);
                    match path.is_empty() {
                        true => "/".to_owned(),
                        false => path,
                    }
                }
                None => target,
            };
            tracing::debug!(path = %path, query = %query, "rewrote request");
            ctx.set_path_and_query(path, query);
            return Ok(flow);
        }
        ActionKind::Redirect(status) => {
            let url = expand(action, ctx, captures, global)?;
            let (target, query) = merge_query(ctx, &url, action.get_append_query());
            Resolution::Redirect {
                status: *status,
                location: extra::join_query(target, &query),
            }
        }
        ActionKind::Forbidden => Resolution::Response {
            status: 403,
            reason: None,
        },
        ActionKind::Gone => Resolution::Response {
            status: 410,
            reason: None,
        },
        ActionKind::CustomResponse { status, reason } => Resolution::Response {
            status: *status,
            reason: reason.clone(),
        },
        ActionKind::Abort => Resolution::Abort,
    };
    ctx.resolve(resolution);
    Ok(ActionFlow::Halt)
}

#[inline]
fn expand(
    action: &Action,
    ctx: &RequestContext<'_>,
    captures: &Captures,
    global: bool,
) -> Result<String, BackReferenceError> {
    match action.get_escape_backreferences() {
        true => action.url().evaluate_escaped(ctx, captures, global),
        false => action.url().evaluate(ctx, captures, global),
    }
}

/// Split the expanded url at its first `?` and apply the query policy.
fn merge_query(ctx: &RequestContext<'_>, url: &str, append: bool) -> (String, String) {
    let (target, query) = extra::split_query(url);
    let query = match append {
        true => extra::join_query_string(query, ctx.query()),
        false => query.to_owned(),
    };
    (target, query)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::{MatchType, PatternSyntax, RuleBuilder};
    use crate::condition::LogicalGrouping;
    use crate::context::LocalFileSystem;
    use crate::pattern::Pattern;

    fn iis_engine(rules: &str) -> Engine {
        let mut engine = Engine::default();
        engine
            .add_iis_rules(&format!("<rewrite><rules>{rules}</rules></rewrite>"))
            .unwrap();
        engine
    }

    #[test]
    fn test_products_scenario() {
        let engine = iis_engine(
            r#"<rule name="products">
                 <match url="/(.*)/(\d+)" />
                 <action type="Rewrite" url="products/{R:1}?id={R:2}" />
               </rule>"#,
        );
        assert_eq!(
            engine.rewrite("/widgets/42"),
            Rewrite::Uri("products/widgets?id=42".to_owned())
        );
        assert_eq!(
            engine.rewrite("/widgets/42?ref=home"),
            Rewrite::Uri("products/widgets?id=42&ref=home".to_owned())
        );
        assert_eq!(
            engine.rewrite("/widgets/none"),
            Rewrite::Uri("/widgets/none".to_owned())
        );
    }

    #[test]
    fn test_redirect_halts() {
        let engine = iis_engine(
            r#"<rule name="first">
                 <match url="^/old/(.*)" />
                 <action type="Redirect" url="/new/{R:1}" redirectType="Found" />
               </rule>
               <rule name="second">
                 <match url=".*" />
                 <action type="CustomResponse" statusCode="418" />
               </rule>"#,
        );
        let mut ctx = RequestContext::new("/old/page?a=1");
        assert_eq!(
            engine.apply(&mut ctx),
            Some(&Resolution::Redirect {
                status: 302,
                location: "/new/page?a=1".to_owned()
            })
        );
        assert!(!ctx.is_rewritten());
        assert_eq!(
            engine.rewrite("/other"),
            Rewrite::Response(418, None)
        );
    }

    #[test]
    fn test_chained_rewrites() {
        let engine = iis_engine(
            r#"<rule name="lower">
                 <match url="^/(.*)$" />
                 <action type="Rewrite" url="/{ToLower:{R:1}}" />
               </rule>
               <rule name="index">
                 <match url="^/(\w+)$" />
                 <action type="Rewrite" url="/index.php?page={R:1}" />
               </rule>"#,
        );
        let mut ctx = RequestContext::new("/About?x=1");
        assert_eq!(engine.apply(&mut ctx), None);
        assert_eq!(ctx.path(), "/index.php");
        assert_eq!(ctx.query(), "page=about&x=1");
        assert_eq!(ctx.original_path(), "/About");
        assert!(ctx.is_rewritten());
    }

    #[test]
    fn test_idempotent_between_requests() {
        let engine = iis_engine(
            r#"<rule name="host">
                 <match url="(.*)" />
                 <conditions>
                   <add input="{HTTP_HOST}" pattern="^(\w+)\.example\.com$" />
                 </conditions>
                 <action type="Rewrite" url="/{C:1}{R:1}" appendQueryString="false" />
               </rule>"#,
        );
        for _ in 0..2 {
            let mut ctx = RequestContext::new("/a?q").host("shop.example.com");
            assert_eq!(engine.rewrite_ctx(&mut ctx), Rewrite::Uri("/shop/a".to_owned()));
            let mut ctx = RequestContext::new("/a").host("example.org");
            assert_eq!(engine.rewrite_ctx(&mut ctx), Rewrite::Uri("/a".to_owned()));
        }
    }

    #[test]
    fn test_stop_processing_actions() {
        let mut builder = RuleBuilder::new(RuleOptions::default());
        builder
            .set_match("^/(.*)", true, false, PatternSyntax::ECMAScript)
            .unwrap()
            .add_action(Action::rewrite(Pattern::literal("/first")).stop_processing(true))
            .add_action(Action::new(ActionKind::Forbidden, Pattern::default()));
        let mut engine = Engine::default();
        engine.add_rules([builder.build(false).unwrap()]);
        assert_eq!(engine.rewrite("/x"), Rewrite::Uri("/first".to_owned()));

        let mut builder = RuleBuilder::new(RuleOptions::default());
        builder
            .set_match("^/(.*)", true, false, PatternSyntax::ECMAScript)
            .unwrap()
            .add_action(Action::rewrite(Pattern::literal("/first")))
            .add_action(Action::new(ActionKind::Forbidden, Pattern::default()));
        let mut engine = Engine::default();
        engine.add_rules([builder.build(false).unwrap()]);
        assert_eq!(engine.rewrite("/x"), Rewrite::Response(403, None));
    }

    #[test]
    fn test_is_file_negation() {
        let engine = iis_engine(
            r#"<rule name="front controller">
                 <match url="^/(.*)$" />
                 <conditions>
                   <add input="{REQUEST_FILENAME}" matchType="IsFile" negate="true" />
                 </conditions>
                 <action type="Rewrite" url="/index.php?route={R:1}" />
               </rule>"#,
        );
        let fs = LocalFileSystem::new(env!("CARGO_MANIFEST_DIR"));
        let mut ctx = RequestContext::new("/Cargo.toml").file_system(&fs);
        assert_eq!(engine.rewrite_ctx(&mut ctx), Rewrite::Uri("/Cargo.toml".to_owned()));
        let mut ctx = RequestContext::new("/missing").file_system(&fs);
        assert_eq!(
            engine.rewrite_ctx(&mut ctx),
            Rewrite::Uri("/index.php?route=missing".to_owned())
        );
    }

    #[test]
    fn test_absolute_target() {
        let engine = iis_engine(
            r#"<rule name="canonical">
                 <match url="^/shop(/.*)?$" />
                 <action type="Rewrite" url="https://shop.example.com{R:1}" />
               </rule>"#,
        );
        let mut ctx = RequestContext::new("/shop");
        engine.apply(&mut ctx);
        assert_eq!(ctx.get_scheme(), "https");
        assert_eq!(ctx.get_host(), "shop.example.com");
        assert_eq!(ctx.path(), "/");
    }

    #[test]
    fn test_global_rules_see_full_url() {
        let engine = iis_engine("");
        assert!(engine.rules().is_empty());

        let mut engine = Engine::default();
        engine
            .add_iis_rules(
                r#"<rewrite><globalRules>
                     <rule name="https">
                       <match url="^http://([^/]+)/(.*)" />
                       <action type="Redirect" url="https://{R:1}/{R:2}" appendQueryString="false" />
                     </rule>
                   </globalRules></rewrite>"#,
            )
            .unwrap();
        let mut ctx = RequestContext::new("/a/b?c=d").host("example.com");
        assert_eq!(
            engine.rewrite_ctx(&mut ctx),
            Rewrite::Redirect("https://example.com/a/b?c=d".to_owned(), 301)
        );
        let mut ctx = RequestContext::new("/a").host("example.com").scheme("https");
        assert_eq!(engine.rewrite_ctx(&mut ctx), Rewrite::Uri("/a".to_owned()));
    }

    #[test]
    fn test_apache_flow() {
        let mut engine = Engine::default();
        engine
            .add_apache_rules(
                r#"
                RewriteRule ^/skip     /new/test      [S=1]
                RewriteRule ^/new/     -              [F]
                RewriteRule ^/new/(.*) /index?page=$1 [R=303]
                RewriteRule ^/(.*)     -              [G]
                "#,
            )
            .unwrap();
        assert_eq!(
            engine.rewrite("/skip?x=1"),
            Rewrite::Redirect("/index?page=test".to_owned(), 303)
        );
        assert_eq!(engine.rewrite("/new/"), Rewrite::Response(403, None));
        assert_eq!(engine.rewrite("/other"), Rewrite::Response(410, None));
    }

    #[test]
    fn test_apache_last_and_engine_state() {
        let mut engine = Engine::default();
        engine
            .add_apache_rules(
                r#"
                RewriteRule ^/static/(.*) /files/$1 [L]
                RewriteRule ^/(.*)        /index?page=$1 [B,QSA]
                RewriteEngine off
                RewriteRule ^/            -  [F]
                "#,
            )
            .unwrap();
        assert_eq!(
            engine.rewrite("/static/1/2?a=b"),
            Rewrite::Uri("/files/1/2?a=b".to_owned())
        );
        assert_eq!(
            engine.rewrite("/1/2 3?a=b"),
            Rewrite::Uri("/index?page=1%2F2%203&a=b".to_owned())
        );
    }

    #[test]
    fn test_back_reference_error_rejects_rule() {
        // %1 is out of range when only the second condition captured
        let mut engine = Engine::default();
        engine
            .add_apache_rules(
                r#"
                RewriteCond %{HTTP_HOST} ^(www)\.  [OR]
                RewriteCond %{HTTP_HOST} ^example
                RewriteRule ^/(.*) /%1/$1
                "#,
            )
            .unwrap();
        let mut ctx = RequestContext::new("/a").host("www.example.com");
        assert_eq!(engine.rewrite_ctx(&mut ctx), Rewrite::Uri("/www/a".to_owned()));
        let mut ctx = RequestContext::new("/a").host("example.com");
        assert_eq!(engine.rewrite_ctx(&mut ctx), Rewrite::Uri("/a".to_owned()));
    }

    #[test]
    fn test_add_rewrite() {
        let mut engine = Engine::default();
        engine
            .add_rewrite(r"/(.*)/(\d+)", "products/$1?id=$2", true)
            .unwrap()
            .add_rewrite("^/products", "/never", false)
            .unwrap();
        assert_eq!(engine.rules().len(), 2);
        assert_eq!(
            engine.rewrite("/widgets/42?ref=home"),
            Rewrite::Uri("products/widgets?id=42&ref=home".to_owned())
        );
        assert_eq!(engine.rewrite("/products"), Rewrite::Uri("/never".to_owned()));

        let mut engine = Engine::default();
        engine
            .add_rewrite("^/a$", "/b", false)
            .unwrap()
            .add_rewrite("^/b$", "/c", false)
            .unwrap();
        assert_eq!(engine.rewrite("/a"), Rewrite::Uri("/c".to_owned()));
    }

    #[test]
    fn test_add_redirect() {
        let mut engine = Engine::default();
        engine.add_redirect("^/old/(.*)$", "/new/$1", 302).unwrap();
        assert_eq!(
            engine.rewrite("/old/page?a=1"),
            Rewrite::Redirect("/new/page?a=1".to_owned(), 302)
        );
        assert_eq!(engine.rewrite("/other"), Rewrite::Uri("/other".to_owned()));

        assert_eq!(
            engine.add_redirect("^/x", "/y", 200).err(),
            Some(BuildError::InvalidStatus(200))
        );
        assert!(matches!(
            engine.add_redirect("^/(x)", "/$2", 301).err(),
            Some(BuildError::BackReference { .. })
        ));
        assert!(matches!(
            engine.add_rewrite("^/(x", "/y", false).err(),
            Some(BuildError::InvalidRegex { .. })
        ));
        assert_eq!(engine.rules().len(), 1);
    }

    #[test]
    fn test_add_redirect_to_https() {
        let mut engine = Engine::default();
        engine.add_redirect_to_https(301).unwrap();
        assert!(engine.rules()[0].global());

        let mut ctx = RequestContext::new("/a/b?c=d").host("example.com");
        assert_eq!(
            engine.rewrite_ctx(&mut ctx),
            Rewrite::Redirect("https://example.com/a/b?c=d".to_owned(), 301)
        );
        let mut ctx = RequestContext::new("/a/b").host("example.com").scheme("https");
        assert_eq!(engine.rewrite_ctx(&mut ctx), Rewrite::Uri("/a/b".to_owned()));
        assert_eq!(
            engine.add_redirect_to_https(404).err(),
            Some(BuildError::InvalidStatus(404))
        );
    }

    #[test]
    fn test_rejected_rule_leaves_request_untouched() {
        let host = || Pattern::parse_iis("{HTTP_HOST}", &RewriteMaps::new()).unwrap();
        let mut builder = RuleBuilder::new(RuleOptions::default());
        builder
            .set_match("^/(.*)", true, false, PatternSyntax::ECMAScript)
            .unwrap()
            .add_conditions(LogicalGrouping::MatchAny, false);
        builder
            .add_condition(host(), Some(r"^(www)\."), PatternSyntax::ECMAScript, MatchType::Pattern, true, false)
            .unwrap()
            .add_condition(host(), Some("^example"), PatternSyntax::ECMAScript, MatchType::Pattern, true, false)
            .unwrap()
            .add_action(Action::rewrite(Pattern::literal("/first")))
            .add_action(Action::rewrite(Pattern::parse_apache("/%1/$1").unwrap()));
        let mut engine = Engine::default();
        engine.add_rules([builder.build(false).unwrap()]);

        let mut ctx = RequestContext::new("/a").host("www.example.com");
        assert_eq!(engine.rewrite_ctx(&mut ctx), Rewrite::Uri("/www/a".to_owned()));
        let mut ctx = RequestContext::new("/a").host("example.com");
        assert_eq!(engine.rewrite_ctx(&mut ctx), Rewrite::Uri("/a".to_owned()));
        assert!(!ctx.is_rewritten());
    }
}
