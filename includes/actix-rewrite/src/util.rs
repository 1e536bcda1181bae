//! Utilities Used for Actix Url Rewrite

use std::str::FromStr;

use actix_http::Uri;
use actix_web::HttpRequest;
use url_rewrite::{FileSystem, RequestContext};

use super::error::Error;

/// Build [`url_rewrite::RequestContext`] using [`HttpRequest`] data.
pub fn request_context<'a>(
    req: &HttpRequest,
    fs: &'a dyn FileSystem,
) -> Result<RequestContext<'a>, Error> {
    let uri = req.uri();
    let path_and_query = uri.path_and_query().map(|p| p.as_str()).unwrap_or("/");
    let info = req.connection_info();
    let mut ctx = RequestContext::new(path_and_query)
        .scheme(info.scheme())
        .host(info.host())
        .request_method(req.method().as_str())
        .server_protocol(format!("{:?}", req.version()))
        .file_system(fs)
        .maybe_remote_addr(req.peer_addr())?
        .local_addr(req.app_config().local_addr())?;
    for (name, value) in req.headers() {
        match value.to_str() {
            Ok(value) => ctx = ctx.header(name.as_str(), value),
            Err(_) => tracing::debug!(header = %name, "skipping non-ascii header"),
        }
    }
    Ok(ctx)
}

/// Build new URI combining the scheme and authority of the original
/// request with the rewritten uri from [`Engine::rewrite`](crate::Engine::rewrite)
///
/// Relative results are rooted at `/`.
pub fn join_uri(before: &Uri, after: &str) -> Result<Uri, Error> {
    let after = match after.starts_with('/') || after.contains("://") {
        true => Uri::from_str(after)?,
        false => Uri::from_str(&format!("/{after}"))?,
    };

    let scheme = after
        .scheme()
        .or(before.scheme())
        .map(|scheme| format!("{}://", scheme.as_str()))
        .unwrap_or_default();
    let authority = after
        .authority()
        .or(before.authority())
        .map(|authority| authority.as_str())
        .unwrap_or_default();
    let path = after
        .path_and_query()
        .map(|path| path.as_str())
        .unwrap_or("/");

    let uri = format!("{scheme}{authority}{path}");
    Ok(Uri::from_str(&uri)?)
}
