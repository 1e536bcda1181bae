//! Actix-Web Middleware applying Apache [`mod_rewrite`](https://httpd.apache.org/docs/current/mod/mod_rewrite.html)
//! directives and IIS [URL Rewrite](https://learn.microsoft.com/en-us/iis/extensions/url-rewrite-module/url-rewrite-module-configuration-reference)
//! rules through the [`url_rewrite`] engine.
//!
//! # Example
//!
//! ```
//! use actix_web::App;
//! use actix_rewrite::Engine;
//!
//! let mut engine = Engine::new();
//! engine.add_apache_rules(r#"
//!     RewriteRule ^/file/(.*)     /tmp/$1      [L]
//!     RewriteRule ^/redirect/(.*) /location/$1 [R=302]
//! "#).expect("failed to process rules");
//! engine.add_iis_rules(r#"
//!   <rewrite>
//!     <rules>
//!       <rule name="blocked">
//!         <match url="^/blocked/" />
//!         <action type="CustomResponse" statusCode="403" statusReason="Blocked" />
//!       </rule>
//!     </rules>
//!   </rewrite>
//! "#).expect("failed to process rules");
//!
//! let app = App::new()
//!   .wrap(engine.middleware());
//! ```
mod error;
mod factory;
mod rewrite;
mod service;
pub mod util;

pub use error::Error;
pub use factory::Middleware;
pub use rewrite::{Engine, Rewrite};
pub use service::RewriteService;

pub use url_rewrite::{RewriteMap, RewriteMaps, RuleOptions};
