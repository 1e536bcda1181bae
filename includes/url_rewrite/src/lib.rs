//! Framework agnostic URL rewrite engine understanding both Apache
//! [mod_rewrite](https://httpd.apache.org/docs/current/mod/mod_rewrite.html)
//! directives and IIS [URL Rewrite](https://learn.microsoft.com/en-us/iis/extensions/url-rewrite-module/url-rewrite-module-configuration-reference)
//! configuration sections.
//!
//! Both dialects compile into the same [`Rule`] model and are applied
//! in order by an [`Engine`] against a per-request [`RequestContext`].
//!
//! # Example
//!
//! ```
//! use url_rewrite::{Engine, Rewrite};
//!
//! let mut engine = Engine::default();
//! engine.add_iis_rules(r#"
//!   <rewrite>
//!     <rules>
//!       <rule name="products" stopProcessing="true">
//!         <match url="^/products/(\w+)$" />
//!         <action type="Rewrite" url="/catalog.php?item={R:1}" />
//!       </rule>
//!     </rules>
//!   </rewrite>
//! "#).expect("failed to process rules");
//! engine.add_apache_rules(r#"
//!   RewriteCond %{REQUEST_METHOD} =POST
//!   RewriteRule ^/legacy/ - [F]
//! "#).expect("failed to process rules");
//!
//! let result = engine.rewrite("/products/hats?color=red");
//! assert_eq!(result, Rewrite::Uri("/catalog.php?item=hats&color=red".to_owned()));
//! ```
mod backref;
mod builder;
mod condition;
mod context;
mod engine;
mod extra;
mod map;
mod matcher;
mod pattern;
mod rule;
mod variables;

pub mod apache;
pub mod error;
pub mod iis;

pub use backref::{BackReferences, Captures};
pub use builder::{MatchType, PatternSyntax, RuleBuilder, RuleOptions};
pub use condition::{Condition, Conditions, LogicalGrouping};
pub use context::{FileSystem, LocalFileSystem, NoFileSystem, RequestContext, Resolution};
pub use engine::{Engine, Rewrite};
pub use map::{RewriteMap, RewriteMaps};
pub use matcher::{Compare, DEFAULT_MATCH_TIMEOUT, MatchKind, MatchResult, Matcher};
pub use pattern::{Function, Pattern, PatternSegment};
pub use rule::{Action, ActionKind, RedirectType, Rule};
pub use variables::{ServerVariable, TimeField};
