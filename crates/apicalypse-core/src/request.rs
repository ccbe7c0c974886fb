//! Construction of HTTP requests carrying a rendered query.

use crate::error::{Error, Result};
use crate::filter::FilterSet;
use crate::options::FilterOption;
use crate::whitespace;
use reqwest::{Method, Request};
use tracing::debug;
use url::Url;

/// Where the rendered query is placed in an outgoing request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QueryMode {
    /// The plain query is sent as the request body.
    #[default]
    Body,
    /// The path-escaped query is appended to the URL.
    Url,
}

/// Build a request whose body is the rendered query.
///
/// A blank `method` defaults to `GET`. When the options render to an empty
/// query the request has no body.
///
/// # Errors
///
/// Returns [`Error::BlankArgument`] for a blank URL (checked before any
/// option), [`Error::InvalidMethod`] or [`Error::InvalidEndpoint`] for
/// malformed input, or the first error raised by an option.
pub fn new_request<I>(method: &str, url: &str, options: I) -> Result<Request>
where
    I: IntoIterator,
    I::Item: Into<Option<FilterOption>>,
{
    build(method, url, options, QueryMode::Body)
}

/// Build a request with the path-escaped query appended to `url`.
///
/// The escaped query is appended as-is; callers include any separator they
/// need at the end of `url`.
///
/// # Errors
///
/// Same as [`new_request`].
pub fn new_url_request<I>(method: &str, url: &str, options: I) -> Result<Request>
where
    I: IntoIterator,
    I::Item: Into<Option<FilterOption>>,
{
    build(method, url, options, QueryMode::Url)
}

/// Build a request placing the query according to `mode`.
///
/// # Errors
///
/// Same as [`new_request`].
pub fn build<I>(method: &str, url: &str, options: I, mode: QueryMode) -> Result<Request>
where
    I: IntoIterator,
    I::Item: Into<Option<FilterOption>>,
{
    if whitespace::is_blank(url) {
        return Err(Error::BlankArgument("url"));
    }

    let method = parse_method(method)?;
    let filters = FilterSet::from_options(options)?;

    let request = match mode {
        QueryMode::Body => {
            let mut request = Request::new(method, Url::parse(url)?);
            let body = filters.render();
            if !body.is_empty() {
                *request.body_mut() = Some(body.into());
            }
            request
        }
        QueryMode::Url => {
            let target = format!("{url}{}", filters.render_escaped());
            Request::new(method, Url::parse(&target)?)
        }
    };

    debug!(
        method = %request.method(),
        url = %request.url(),
        ?mode,
        filters = filters.len(),
        "built query request"
    );
    Ok(request)
}

/// Parse an HTTP method, treating a blank method as `GET`.
///
/// # Errors
///
/// Returns [`Error::InvalidMethod`] if the method is not a valid token.
pub fn parse_method(method: &str) -> Result<Method> {
    if whitespace::is_blank(method) {
        return Ok(Method::GET);
    }

    Method::from_bytes(method.as_bytes()).map_err(|_| Error::InvalidMethod(method.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::FilterName;
    use crate::options::{fields, limit, offset};

    const URL: &str = "http://fake.com/";
    const NO_OPTIONS: [FilterOption; 0] = [];

    fn body_text(request: &Request) -> Option<String> {
        request
            .body()
            .and_then(|body| body.as_bytes())
            .map(|bytes| String::from_utf8_lossy(bytes).into_owned())
    }

    #[test]
    fn test_new_request_matrix() {
        for method in ["GET", "POST", ""] {
            let want_method = if method.is_empty() { "GET" } else { method };

            let request = new_request(method, URL, NO_OPTIONS).unwrap();
            assert_eq!(request.method().as_str(), want_method);
            assert_eq!(request.url().as_str(), URL);
            assert!(request.body().is_none());

            let request = new_request(method, URL, [limit(15)]).unwrap();
            assert_eq!(request.method().as_str(), want_method);
            assert_eq!(body_text(&request).as_deref(), Some("limit 15; "));

            let err = new_request(method, URL, [limit(-99)]).unwrap_err();
            assert_eq!(
                err,
                Error::NegativeInput {
                    filter: FilterName::Limit,
                    value: -99
                }
            );

            for options in [vec![], vec![limit(15)], vec![limit(-99)]] {
                let err = new_request(method, "", options).unwrap_err();
                assert_eq!(err, Error::BlankArgument("url"));
            }
        }
    }

    #[test]
    fn test_new_request_multiple_clauses() {
        let request = new_request("POST", URL, [limit(5), offset(10)]).unwrap();
        let body = body_text(&request).unwrap();
        assert!(body.contains("limit 5; "));
        assert!(body.contains("offset 10; "));
    }

    #[test]
    fn test_new_request_invalid_method() {
        let err = new_request("GE T", URL, NO_OPTIONS).unwrap_err();
        assert!(matches!(err, Error::InvalidMethod(_)));
    }

    #[test]
    fn test_new_request_invalid_url() {
        let err = new_request("GET", "not a url", NO_OPTIONS).unwrap_err();
        assert!(matches!(err, Error::InvalidEndpoint(_)));
    }

    #[test]
    fn test_new_request_absent_option() {
        let err = new_request("GET", URL, [Some(limit(1)), None]).unwrap_err();
        assert_eq!(err, Error::NilOption);
    }

    #[test]
    fn test_new_url_request_appends_escaped_query() {
        let request = new_url_request("GET", URL, [fields(["id", "name"])]).unwrap();
        assert_eq!(
            request.url().as_str(),
            "http://fake.com/fields%20id%2Cname%3B%20"
        );
        assert!(request.body().is_none());
    }

    #[test]
    fn test_new_url_request_without_options() {
        let request = new_url_request("", URL, NO_OPTIONS).unwrap();
        assert_eq!(*request.method(), Method::GET);
        assert_eq!(request.url().as_str(), URL);
    }

    #[test]
    fn test_parse_method() {
        assert_eq!(parse_method("").unwrap(), Method::GET);
        assert_eq!(parse_method(" \t").unwrap(), Method::GET);
        assert_eq!(parse_method("POST").unwrap(), Method::POST);
    }
}
