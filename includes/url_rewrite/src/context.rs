//! Per-request state the rule engine reads from and writes to.
//!
//! A [`RequestContext`] is a snapshot of the incoming request (path,
//! query, headers, addresses) plus a [`FileSystem`] capability used by
//! `IsFile` / `IsDirectory` matches. The [`Engine`](crate::Engine)
//! mutates it in place with the rewritten path and query, or records a
//! terminal [`Resolution`].

use std::{
    collections::HashMap,
    fmt::Debug,
    io,
    net::{SocketAddr, ToSocketAddrs},
    path::{Component, Path, PathBuf},
};

use unicase::UniCase;

use super::extra;

macro_rules! setter {
    ($key:ident, $ref:ident) => {
        #[doc = concat!("Assign value for `", stringify!($ref), "` variable")]
        pub fn $key<S: Into<String>>(mut self, $key: S) -> Self {
            self.$key = Some($key.into());
            self
        }
    };
}

macro_rules! get {
    ($key:expr) => {
        $key.as_deref().unwrap_or("")
    };
}

/// Filesystem predicates consulted by `IsFile` and `IsDirectory` matches.
///
/// Implementations decide how a request string maps onto storage.
/// Errors are treated as a failed match by the engine.
pub trait FileSystem: Send + Sync {
    fn is_file(&self, path: &str) -> io::Result<bool>;
    fn is_dir(&self, path: &str) -> io::Result<bool>;
}

/// [`FileSystem`] with nothing in it.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoFileSystem;

impl FileSystem for NoFileSystem {
    fn is_file(&self, _path: &str) -> io::Result<bool> {
        Ok(false)
    }

    fn is_dir(&self, _path: &str) -> io::Result<bool> {
        Ok(false)
    }
}

static NO_FILE_SYSTEM: NoFileSystem = NoFileSystem;

/// [`FileSystem`] backed by a local directory.
///
/// Candidates are resolved relative to the document root. Any candidate
/// that tries to climb out of the root with `..` is reported as missing.
#[derive(Clone, Debug)]
pub struct LocalFileSystem {
    root: PathBuf,
}

impl LocalFileSystem {
    pub fn new<P: Into<PathBuf>>(root: P) -> Self {
        Self { root: root.into() }
    }

    #[inline]
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn resolve(&self, candidate: &str) -> Option<PathBuf> {
        let relative = Path::new(candidate.trim_start_matches('/'));
        if relative
            .components()
            .any(|c| !matches!(c, Component::Normal(_) | Component::CurDir))
        {
            return None;
        }
        Some(self.root.join(relative))
    }

    fn metadata(&self, candidate: &str) -> io::Result<Option<std::fs::Metadata>> {
        let Some(path) = self.resolve(candidate) else {
            return Ok(None);
        };
        match std::fs::metadata(path) {
            Ok(meta) => Ok(Some(meta)),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err),
        }
    }
}

impl FileSystem for LocalFileSystem {
    fn is_file(&self, path: &str) -> io::Result<bool> {
        Ok(self.metadata(path)?.is_some_and(|m| m.is_file()))
    }

    fn is_dir(&self, path: &str) -> io::Result<bool> {
        Ok(self.metadata(path)?.is_some_and(|m| m.is_dir()))
    }
}

/// Terminal outcome recorded by a rule action.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Resolution {
    Redirect { status: u16, location: String },
    Response { status: u16, reason: Option<String> },
    Abort,
}

/// Snapshot of one request plus the output of rule evaluation.
pub struct RequestContext<'a> {
    path: String,
    query: String,
    original_path: String,
    original_query: String,
    scheme: Option<String>,
    host: Option<String>,
    request_method: Option<String>,
    server_protocol: Option<String>,
    headers: HashMap<UniCase<String>, String>,
    remote_addr: Option<SocketAddr>,
    local_addr: Option<SocketAddr>,
    file_system: &'a dyn FileSystem,
    resolution: Option<Resolution>,
}

impl<'a> RequestContext<'a> {
    /// Build a new context from the request's `path?query`.
    pub fn new(path_and_query: &str) -> Self {
        let (path, query) = extra::split_query(path_and_query);
        Self {
            original_path: path.clone(),
            original_query: query.to_owned(),
            path,
            query: query.to_owned(),
            scheme: None,
            host: None,
            request_method: None,
            server_protocol: None,
            headers: HashMap::new(),
            remote_addr: None,
            local_addr: None,
            file_system: &NO_FILE_SYSTEM,
            resolution: None,
        }
    }

    setter!(scheme, REQUEST_SCHEME);
    setter!(host, HTTP_HOST);
    setter!(request_method, REQUEST_METHOD);
    setter!(server_protocol, SERVER_PROTOCOL);

    /// Add a request header. Names are case-insensitive.
    pub fn header<K: Into<String>, V: Into<String>>(mut self, name: K, value: V) -> Self {
        self.headers.insert(UniCase::new(name.into()), value.into());
        self
    }

    /// Assign value for `REMOTE_ADDR`, `REMOTE_HOST`, and `REMOTE_PORT` variables.
    pub fn remote_addr<A: ToSocketAddrs>(mut self, remote_addr: A) -> io::Result<Self> {
        self.remote_addr = Some(first_addr(remote_addr)?);
        Ok(self)
    }

    /// Assign value for `REMOTE_ADDR`, `REMOTE_HOST`, and `REMOTE_PORT`
    /// variables if address is Some.
    pub fn maybe_remote_addr<A: ToSocketAddrs>(self, remote_addr: Option<A>) -> io::Result<Self> {
        match remote_addr {
            Some(addr) => self.remote_addr(addr),
            None => Ok(self),
        }
    }

    /// Assign value for `LOCAL_ADDR`, `SERVER_ADDR` and `SERVER_PORT` variables.
    pub fn local_addr<A: ToSocketAddrs>(mut self, local_addr: A) -> io::Result<Self> {
        self.local_addr = Some(first_addr(local_addr)?);
        Ok(self)
    }

    /// Use the given [`FileSystem`] for `IsFile` / `IsDirectory` matches.
    pub fn file_system(mut self, fs: &'a dyn FileSystem) -> Self {
        self.file_system = fs;
        self
    }

    /// Current (possibly rewritten) path.
    #[inline]
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Current (possibly rewritten) query-string without the leading `?`.
    #[inline]
    pub fn query(&self) -> &str {
        &self.query
    }

    /// Current path joined with the current query-string.
    pub fn path_and_query(&self) -> String {
        extra::join_query(self.path.clone(), &self.query)
    }

    #[inline]
    pub fn original_path(&self) -> &str {
        &self.original_path
    }

    #[inline]
    pub fn original_query(&self) -> &str {
        &self.original_query
    }

    /// Request scheme, `http` unless configured otherwise.
    pub fn get_scheme(&self) -> &str {
        self.scheme.as_deref().unwrap_or("http")
    }

    /// Request host, `localhost` unless configured otherwise.
    pub fn get_host(&self) -> &str {
        self.host.as_deref().unwrap_or("localhost")
    }

    pub fn get_request_method(&self) -> &str {
        get!(self.request_method)
    }

    pub fn get_server_protocol(&self) -> &str {
        get!(self.server_protocol)
    }

    pub fn get_header(&self, name: &str) -> Option<&str> {
        if name.eq_ignore_ascii_case("host") && self.host.is_some() {
            return self.host.as_deref();
        }
        self.headers
            .get(&UniCase::new(name.to_owned()))
            .map(|v| v.as_str())
    }

    pub fn get_remote_addr(&self) -> Option<SocketAddr> {
        self.remote_addr
    }

    pub fn get_local_addr(&self) -> Option<SocketAddr> {
        self.local_addr
    }

    #[inline]
    pub fn get_file_system(&self) -> &'a dyn FileSystem {
        self.file_system
    }

    /// The original request as an absolute url: `scheme://host/path?query`.
    pub fn full_url(&self) -> String {
        let url = format!(
            "{}://{}{}",
            self.get_scheme(),
            self.get_host(),
            self.original_path
        );
        extra::join_query(url, &self.original_query)
    }

    /// Terminal outcome recorded by the engine, if any.
    #[inline]
    pub fn resolution(&self) -> Option<&Resolution> {
        self.resolution.as_ref()
    }

    /// Returns true if rules changed the path or query of the request.
    pub fn is_rewritten(&self) -> bool {
        self.path != self.original_path || self.query != self.original_query
    }

    pub(crate) fn set_scheme_and_host(&mut self, scheme: &str, host: &str) {
        self.scheme = Some(scheme.to_owned());
        self.host = Some(host.to_owned());
    }

    pub(crate) fn set_path_and_query(&mut self, path: String, query: String) {
        self.path = path;
        self.query = query;
    }

    pub(crate) fn resolve(&mut self, resolution: Resolution) {
        self.resolution = Some(resolution);
    }
}

impl Debug for RequestContext<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RequestContext")
            .field("path", &self.path)
            .field("query", &self.query)
            .field("original_path", &self.original_path)
            .field("original_query", &self.original_query)
            .field("host", &self.host)
            .field("resolution", &self.resolution)
            .finish_non_exhaustive()
    }
}

fn first_addr<A: ToSocketAddrs>(addr: A) -> io::Result<SocketAddr> {
    addr.to_socket_addrs()?
        .next()
        .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidInput, "missing socket address"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_snapshot() {
        let ctx = RequestContext::new("/a/b?x=1")
            .host("example.com")
            .scheme("https")
            .header("User-Agent", "curl");
        assert_eq!(ctx.path(), "/a/b");
        assert_eq!(ctx.query(), "x=1");
        assert_eq!(ctx.full_url(), "https://example.com/a/b?x=1");
        assert_eq!(ctx.get_header("user-agent"), Some("curl"));
        assert_eq!(ctx.get_header("HOST"), Some("example.com"));
        assert!(!ctx.is_rewritten());
    }

    #[test]
    fn test_local_file_system() {
        let fs = LocalFileSystem::new(env!("CARGO_MANIFEST_DIR"));
        assert!(fs.is_file("/src/lib.rs").unwrap());
        assert!(!fs.is_dir("/src/lib.rs").unwrap());
        assert!(fs.is_dir("src").unwrap());
        assert!(!fs.is_file("/src/missing.rs").unwrap());
        assert!(!fs.is_file("/../Cargo.toml").unwrap());
    }
}
