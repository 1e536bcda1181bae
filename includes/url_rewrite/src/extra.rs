#[inline]
pub(crate) fn split_query(uri: &str) -> (String, &str) {
    uri.split_once('?')
        .map(|(b, q)| (b.to_owned(), q))
        .unwrap_or_else(|| (uri.to_owned(), ""))
}

#[inline]
pub(crate) fn join_query(mut uri: String, query: &str) -> String {
    if query.is_empty() {
        return uri;
    }
    match uri.contains('?') {
        true => uri.push('&'),
        false => uri.push('?'),
    }
    uri.push_str(query);
    uri
}

/// Join two bare query-strings with `&`, skipping empty sides.
#[inline]
pub(crate) fn join_query_string(first: &str, second: &str) -> String {
    match (first.is_empty(), second.is_empty()) {
        (true, _) => second.to_owned(),
        (_, true) => first.to_owned(),
        _ => format!("{first}&{second}"),
    }
}

/// Split an absolute `scheme://authority/path` into its parts.
///
/// Returns None for relative targets.
pub(crate) fn split_origin(target: &str) -> Option<(&str, &str, &str)> {
    let (scheme, rest) = target.split_once("://")?;
    if scheme.is_empty()
        || !scheme
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'))
    {
        return None;
    }
    let index = rest.find('/').unwrap_or(rest.len());
    Some((scheme, &rest[..index], &rest[index..]))
}
