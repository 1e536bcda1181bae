//! Registry of server variables that rewrite templates may reference.
//!
//! Names follow the Apache `%{NAME}` and IIS `{NAME}` conventions.
//! Lookups are case-insensitive and unknown names are refused when the
//! template is compiled, never at request time.

use std::borrow::Cow;

use super::context::RequestContext;
use super::error::PatternError;

/// `TIME_*` variable families.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TimeField {
    Full,
    Year,
    Month,
    Day,
    Hour,
    Minute,
    Second,
    Weekday,
}

impl TimeField {
    fn format(&self) -> &'static str {
        match self {
            Self::Full => "%Y%m%d%H%M%S",
            Self::Year => "%Y",
            Self::Month => "%m",
            Self::Day => "%d",
            Self::Hour => "%H",
            Self::Minute => "%M",
            Self::Second => "%S",
            Self::Weekday => "%w",
        }
    }
}

/// Server variable resolved against the [`RequestContext`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ServerVariable {
    /// Request header by (lowercase) name, e.g. `HTTP_USER_AGENT`.
    Header(String),
    QueryString,
    RequestUri,
    RequestFilename,
    RequestMethod,
    RequestScheme,
    Https,
    HttpUrl,
    RemoteAddr,
    RemoteHost,
    RemotePort,
    LocalAddr,
    ServerName,
    ServerPort,
    ServerProtocol,
    TheRequest,
    Time(TimeField),
    Env(String),
}

impl ServerVariable {
    /// Look up a variable by name.
    pub fn from_name(name: &str) -> Result<Self, PatternError> {
        let unknown = || PatternError::UnknownVariable(name.to_owned());
        if let Some((prefix, key)) = name.split_once(':') {
            return match prefix.to_ascii_uppercase().as_str() {
                "HTTP" if !key.is_empty() => Ok(Self::Header(key.to_ascii_lowercase())),
                "ENV" if !key.is_empty() => Ok(Self::Env(key.to_owned())),
                _ => Err(unknown()),
            };
        }
        let upper = name.to_ascii_uppercase();
        Ok(match upper.as_str() {
            "QUERY_STRING" => Self::QueryString,
            "REQUEST_URI" | "PATH_INFO" => Self::RequestUri,
            "REQUEST_FILENAME" | "SCRIPT_FILENAME" => Self::RequestFilename,
            "REQUEST_METHOD" => Self::RequestMethod,
            "REQUEST_SCHEME" => Self::RequestScheme,
            "HTTPS" => Self::Https,
            "HTTP_URL" => Self::HttpUrl,
            "REMOTE_ADDR" => Self::RemoteAddr,
            "REMOTE_HOST" => Self::RemoteHost,
            "REMOTE_PORT" => Self::RemotePort,
            "LOCAL_ADDR" | "SERVER_ADDR" => Self::LocalAddr,
            "SERVER_NAME" => Self::ServerName,
            "SERVER_PORT" => Self::ServerPort,
            "SERVER_PROTOCOL" => Self::ServerProtocol,
            "THE_REQUEST" => Self::TheRequest,
            "TIME" => Self::Time(TimeField::Full),
            "TIME_YEAR" => Self::Time(TimeField::Year),
            "TIME_MON" | "TIME_MONTH" => Self::Time(TimeField::Month),
            "TIME_DAY" => Self::Time(TimeField::Day),
            "TIME_HOUR" => Self::Time(TimeField::Hour),
            "TIME_MIN" => Self::Time(TimeField::Minute),
            "TIME_SEC" => Self::Time(TimeField::Second),
            "TIME_WDAY" => Self::Time(TimeField::Weekday),
            header if header.len() > 5 && header.starts_with("HTTP_") => {
                Self::Header(header[5..].replace('_', "-").to_ascii_lowercase())
            }
            _ => return Err(unknown()),
        })
    }

    /// Resolve the variable against the current request.
    ///
    /// Missing values resolve to an empty string.
    pub fn resolve<'c>(&self, ctx: &'c RequestContext<'_>) -> Cow<'c, str> {
        match self {
            Self::Header(name) => Cow::Borrowed(ctx.get_header(name).unwrap_or("")),
            Self::QueryString => Cow::Borrowed(ctx.query()),
            Self::RequestUri | Self::RequestFilename => Cow::Borrowed(ctx.path()),
            Self::RequestMethod => Cow::Borrowed(ctx.get_request_method()),
            Self::RequestScheme => Cow::Borrowed(ctx.get_scheme()),
            Self::Https => match ctx.get_scheme().eq_ignore_ascii_case("https") {
                true => Cow::Borrowed("on"),
                false => Cow::Borrowed("off"),
            },
            Self::HttpUrl => Cow::Owned(ctx.path_and_query()),
            Self::RemoteAddr | Self::RemoteHost => addr(ctx.get_remote_addr().map(|a| a.ip().to_string())),
            Self::RemotePort => addr(ctx.get_remote_addr().map(|a| a.port().to_string())),
            Self::LocalAddr => addr(ctx.get_local_addr().map(|a| a.ip().to_string())),
            Self::ServerName => Cow::Borrowed(ctx.get_host()),
            Self::ServerPort => addr(ctx.get_local_addr().map(|a| a.port().to_string())),
            Self::ServerProtocol => Cow::Borrowed(ctx.get_server_protocol()),
            Self::TheRequest => Cow::Owned(format!(
                "{} {} {}",
                ctx.get_request_method(),
                ctx.path_and_query(),
                ctx.get_server_protocol()
            )),
            Self::Time(field) => Cow::Owned(chrono::Local::now().format(field.format()).to_string()),
            Self::Env(key) => Cow::Owned(std::env::var(key).unwrap_or_default()),
        }
    }
}

#[inline]
fn addr(value: Option<String>) -> Cow<'static, str> {
    value.map(Cow::Owned).unwrap_or(Cow::Borrowed(""))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_names() {
        assert_eq!(
            ServerVariable::from_name("HTTP_USER_AGENT"),
            Ok(ServerVariable::Header("user-agent".to_owned()))
        );
        assert_eq!(
            ServerVariable::from_name("http:X-Forwarded-For"),
            Ok(ServerVariable::Header("x-forwarded-for".to_owned()))
        );
        assert_eq!(
            ServerVariable::from_name("query_string"),
            Ok(ServerVariable::QueryString)
        );
        assert_eq!(ServerVariable::from_name("HTTP_URL"), Ok(ServerVariable::HttpUrl));
        assert_eq!(ServerVariable::from_name("HTTPS"), Ok(ServerVariable::Https));
        assert!(matches!(
            ServerVariable::from_name("NOT_A_VARIABLE"),
            Err(PatternError::UnknownVariable(_))
        ));
        assert!(ServerVariable::from_name("HTTP_").is_err());
        assert!(ServerVariable::from_name("FOO:bar").is_err());
    }

    #[test]
    fn test_resolve() {
        let ctx = RequestContext::new("/a/b?x=1")
            .host("example.com")
            .scheme("https")
            .request_method("GET")
            .server_protocol("HTTP/1.1")
            .header("User-Agent", "curl/8")
            .remote_addr("10.0.0.1:5555")
            .unwrap()
            .local_addr("127.0.0.1:8080")
            .unwrap();

        let resolve = |name: &str| {
            ServerVariable::from_name(name)
                .unwrap()
                .resolve(&ctx)
                .into_owned()
        };
        assert_eq!(resolve("HTTP_USER_AGENT"), "curl/8");
        assert_eq!(resolve("HTTP_HOST"), "example.com");
        assert_eq!(resolve("HTTP_REFERER"), "");
        assert_eq!(resolve("QUERY_STRING"), "x=1");
        assert_eq!(resolve("REQUEST_URI"), "/a/b");
        assert_eq!(resolve("HTTP_URL"), "/a/b?x=1");
        assert_eq!(resolve("HTTPS"), "on");
        assert_eq!(resolve("REMOTE_ADDR"), "10.0.0.1");
        assert_eq!(resolve("REMOTE_PORT"), "5555");
        assert_eq!(resolve("SERVER_PORT"), "8080");
        assert_eq!(resolve("THE_REQUEST"), "GET /a/b?x=1 HTTP/1.1");
        assert_eq!(resolve("TIME_YEAR").len(), 4);
    }
}
