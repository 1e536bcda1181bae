use std::time::Duration;

use actix_files::Files;
use actix_rewrite::{Engine, RewriteMap, RewriteMaps, RuleOptions};
use actix_web::{App, HttpServer, middleware::Logger};

use crate::core::configuration::{Configuration, RewriteConfiguration};

const DEFAULT_PORT: u16 = 8080;
const DEFAULT_HOST: &str = "localhost";
const DEFAULT_STATIC_PATH: &str = "/var/www/html/";
const DEFAULT_DOCUMENT: &str = "index.html";
const DEFAULT_REMOTE_PATH: &str = "/";

pub struct HttpAdapter<'a> {
    configuration: &'a Configuration,
}

impl<'a> HttpAdapter<'a> {
    pub fn new(configuration: &'a Configuration) -> Self {
        Self { configuration }
    }

    pub async fn run(&self) -> Result<(), std::io::Error> {
        let host = self
            .configuration
            .network
            .as_ref()
            .and_then(|f| f.host.clone())
            .unwrap_or_else(|| DEFAULT_HOST.to_string());

        let port = self
            .configuration
            .network
            .as_ref()
            .and_then(|f| f.port)
            .unwrap_or(DEFAULT_PORT);

        let site = self.configuration.site.as_ref();
        let static_path = site
            .and_then(|s| s.path.clone())
            .unwrap_or_else(|| DEFAULT_STATIC_PATH.to_string());
        let remote_path = site
            .and_then(|s| s.remote_path.clone())
            .unwrap_or_else(|| DEFAULT_REMOTE_PATH.to_string());
        let index = site
            .and_then(|s| s.index.clone())
            .unwrap_or_else(|| DEFAULT_DOCUMENT.to_string());

        let engine = build_engine(self.configuration.rewrite.as_ref(), &static_path)
            .map_err(std::io::Error::other)?;
        tracing::info!(rules = engine.len(), %host, port, "starting http server");

        HttpServer::new(move || {
            App::new()
                .wrap(engine.clone().middleware())
                .wrap(Logger::default())
                .service(
                    Files::new(&remote_path, &static_path)
                        .index_file(index.as_str())
                        .use_last_modified(true)
                        .prefer_utf8(true),
                )
        })
        .bind(format!("{host}:{port}"))?
        .run()
        .await
    }
}

/// Assemble the rewrite engine: caller maps first, then every IIS file,
/// every Apache file and finally the inline Apache rules.
pub fn build_engine(
    conf: Option<&RewriteConfiguration>,
    document_root: &str,
) -> Result<Engine, actix_rewrite::Error> {
    let Some(conf) = conf else {
        return Ok(Engine::new().document_root(document_root));
    };

    let mut options = RuleOptions::default();
    if let Some(ms) = conf.match_timeout_ms {
        options = options.match_timeout(Duration::from_millis(ms));
    }
    let maps: RewriteMaps = conf
        .maps
        .iter()
        .flatten()
        .map(|(name, map)| {
            let mut rewrite_map = RewriteMap::new(name.as_str());
            if let Some(default) = &map.default_value {
                rewrite_map = rewrite_map.default_value(default.as_str());
            }
            map.entries
                .iter()
                .fold(rewrite_map, |m, (k, v)| m.entry(k.as_str(), v.as_str()))
        })
        .collect();

    let mut engine = Engine::with_options(options)
        .document_root(document_root)
        .rewrite_maps(maps);
    if let Some(name) = &conf.server_name {
        engine = engine.server_name(name.as_str());
    }
    for path in conf.iis.iter().flatten() {
        tracing::debug!(%path, "loading iis rules");
        engine.add_iis_rules_file(path)?;
    }
    for path in conf.apache.iter().flatten() {
        tracing::debug!(%path, "loading apache rules");
        engine.add_apache_rules_file(path)?;
    }
    if let Some(rules) = &conf.rules {
        engine.add_apache_rules(rules)?;
    }
    Ok(engine)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::configuration::load_configuration;
    use assertables::*;

    #[tokio::test]
    async fn test_build_engine_from_configuration() {
        let conf = load_configuration("config.yaml").await.unwrap();
        let engine = build_engine(conf.rewrite.as_ref(), "public");
        assert_ok!(&engine);
        assert_eq!(engine.unwrap().len(), 4);
    }

    #[test]
    fn test_build_engine_errors() {
        assert!(build_engine(None, "public").unwrap().is_empty());

        let conf = RewriteConfiguration {
            rules: Some("RewriteRule ^/a$ /b [P]".to_string()),
            apache: None,
            iis: None,
            maps: None,
            server_name: None,
            match_timeout_ms: None,
        };
        assert_err!(build_engine(Some(&conf), "public"));

        let conf = RewriteConfiguration {
            rules: None,
            iis: Some(vec!["conf/missing.config".to_string()]),
            ..conf
        };
        assert!(matches!(
            build_engine(Some(&conf), "public"),
            Err(actix_rewrite::Error::IoError(_))
        ));
    }
}
