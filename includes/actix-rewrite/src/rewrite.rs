//! Utilities for Actix-Web Rewrite Actions

use std::path::{Path, PathBuf};
use std::sync::Arc;

use actix_http::{StatusCode, Uri};
use actix_web::http::header;
use actix_web::{HttpRequest, HttpResponse};
use url_rewrite::{FileSystem, LocalFileSystem, NoFileSystem, RewriteMaps, RuleOptions};

use crate::Middleware;

use super::error::Error;
use super::util;

/// Actix-Web compatible wrapper on [`Rewrite`](url_rewrite::Rewrite)
pub enum Rewrite {
    Uri(Uri),
    Redirect(HttpResponse),
    Response(HttpResponse),
    Abort(HttpResponse),
}

/// Actix-Web compatible wrapper on [`Engine`](url_rewrite::Engine)
///
/// The compiled rules are shared between workers, cloning the engine
/// is cheap once loading is done.
#[derive(Clone, Debug)]
pub struct Engine {
    engine: Arc<url_rewrite::Engine>,
    maps: RewriteMaps,
    document_root: Option<LocalFileSystem>,
    server_name: Option<String>,
}

impl Engine {
    /// Creates a new [`Engine`](crate::Engine) instance.
    pub fn new() -> Self {
        Self::with_options(RuleOptions::default())
    }

    /// Creates a new [`Engine`](crate::Engine) compiling rules with the
    /// given [`RuleOptions`].
    pub fn with_options(options: RuleOptions) -> Self {
        Self {
            engine: Arc::new(url_rewrite::Engine::new(options)),
            maps: RewriteMaps::new(),
            document_root: None,
            server_name: None,
        }
    }

    /// Directory `IsFile` / `IsDirectory` and `-f` / `-d` tests are
    /// resolved against.
    ///
    /// Without a document root every file test fails.
    pub fn document_root<P: Into<PathBuf>>(mut self, root: P) -> Self {
        self.document_root = Some(LocalFileSystem::new(root));
        self
    }

    /// Host name reported to rules instead of the request's own host.
    pub fn server_name<S: Into<String>>(mut self, name: S) -> Self {
        self.server_name = Some(name.into());
        self
    }

    /// Rewrite maps made available to IIS rules loaded afterwards.
    ///
    /// These supersede maps of the same name declared in the xml.
    pub fn rewrite_maps(mut self, maps: RewriteMaps) -> Self {
        self.maps = maps;
        self
    }

    /// Parses additional Apache-style directives to append to the engine.
    ///
    /// See [`url_rewrite::Engine::add_apache_rules`] for more details.
    pub fn add_apache_rules(&mut self, rules: &str) -> Result<&mut Self, Error> {
        Arc::make_mut(&mut self.engine).add_apache_rules(rules)?;
        Ok(self)
    }

    /// Parses additional Apache-style directives from a file to append
    /// to the engine.
    #[inline]
    pub fn add_apache_rules_file<P: AsRef<Path>>(&mut self, path: P) -> Result<&mut Self, Error> {
        self.add_apache_rules(&std::fs::read_to_string(path)?)
    }

    /// Parses an additional IIS `<rewrite>` section to append to the engine.
    ///
    /// See [`url_rewrite::Engine::add_iis_rules_with`] for more details.
    pub fn add_iis_rules(&mut self, xml: &str) -> Result<&mut Self, Error> {
        Arc::make_mut(&mut self.engine).add_iis_rules_with(xml, &self.maps)?;
        Ok(self)
    }

    /// Parses an additional IIS `<rewrite>` section from a file, such as
    /// a `web.config`, to append to the engine.
    #[inline]
    pub fn add_iis_rules_file<P: AsRef<Path>>(&mut self, path: P) -> Result<&mut Self, Error> {
        self.add_iis_rules(&std::fs::read_to_string(path)?)
    }

    /// Appends a rule rewriting paths that match `pattern`.
    ///
    /// See [`url_rewrite::Engine::add_rewrite`] for more details.
    pub fn add_rewrite(&mut self, pattern: &str, replacement: &str, stop: bool) -> Result<&mut Self, Error> {
        Arc::make_mut(&mut self.engine).add_rewrite(pattern, replacement, stop)?;
        Ok(self)
    }

    /// Appends a rule redirecting paths that match `pattern`.
    ///
    /// See [`url_rewrite::Engine::add_redirect`] for more details.
    pub fn add_redirect(&mut self, pattern: &str, replacement: &str, status: u16) -> Result<&mut Self, Error> {
        Arc::make_mut(&mut self.engine).add_redirect(pattern, replacement, status)?;
        Ok(self)
    }

    /// Appends a rule redirecting plain http requests to https.
    pub fn add_redirect_to_https(&mut self, status: u16) -> Result<&mut Self, Error> {
        Arc::make_mut(&mut self.engine).add_redirect_to_https(status)?;
        Ok(self)
    }

    /// Builder method equivalent of [`Engine::add_apache_rules`]
    #[inline]
    pub fn apache_rules(mut self, rules: &str) -> Result<Self, Error> {
        self.add_apache_rules(rules)?;
        Ok(self)
    }

    /// Builder method equivalent of [`Engine::add_iis_rules`]
    #[inline]
    pub fn iis_rules(mut self, xml: &str) -> Result<Self, Error> {
        self.add_iis_rules(xml)?;
        Ok(self)
    }

    /// Number of rules loaded into the engine.
    #[inline]
    pub fn len(&self) -> usize {
        self.engine.rules().len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.engine.rules().is_empty()
    }

    /// Evaluates the given [`HttpRequest`](actix_web::HttpRequest) against
    /// the engine rules and returns a [`Rewrite`] response.
    pub fn rewrite(&self, req: &HttpRequest) -> Result<Rewrite, Error> {
        let fs: &dyn FileSystem = match &self.document_root {
            Some(root) => root,
            None => &NoFileSystem,
        };
        let mut ctx = util::request_context(req, fs)?;
        if let Some(name) = &self.server_name {
            ctx = ctx.host(name.as_str());
        }
        Ok(match self.engine.rewrite_ctx(&mut ctx) {
            url_rewrite::Rewrite::Uri(uri) => Rewrite::Uri(util::join_uri(req.uri(), &uri)?),
            url_rewrite::Rewrite::Redirect(uri, sc) => Rewrite::Redirect(
                HttpResponse::build(StatusCode::from_u16(sc)?)
                    .insert_header((header::LOCATION, uri))
                    .finish(),
            ),
            url_rewrite::Rewrite::Response(sc, reason) => {
                let mut res = HttpResponse::build(StatusCode::from_u16(sc)?);
                Rewrite::Response(match reason {
                    Some(reason) => res.body(reason),
                    None => res.finish(),
                })
            }
            url_rewrite::Rewrite::Abort => Rewrite::Abort(
                HttpResponse::BadRequest().force_close().finish(),
            ),
        })
    }

    /// Converts Engine Instance into Actix-Web Middleware
    ///
    /// # Examples
    ///
    /// ```
    /// use actix_web::App;
    /// use actix_rewrite::Engine;
    ///
    /// let mut engine = Engine::new();
    /// engine.add_apache_rules("RewriteEngine On\n").expect("Failed to add rules");
    ///
    /// let app = App::new()
    ///     .wrap(engine.middleware());
    /// ```
    #[inline]
    pub fn middleware(self) -> Middleware {
        self.into()
    }
}

impl Default for Engine {
    fn default() -> Self {
        Self::new()
    }
}
