//! `Set-Cookie` handling for refresh responses.

use reqwest::header::{HeaderMap, SET_COOKIE};

/// Attributes the refresh endpoint returns for the cookies it wants set.
#[derive(Debug, Clone, Copy, Default)]
pub struct CookieOptions<'a> {
    pub domain: Option<&'a str>,
    pub path: Option<&'a str>,
    pub max_age: Option<i64>,
}

/// Every `Set-Cookie` header value, in response order. Non-UTF-8 values are dropped.
#[must_use]
pub fn set_cookie_values(headers: &HeaderMap) -> Vec<String> {
    headers
        .get_all(SET_COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .map(str::to_string)
        .collect()
}

/// Value of the cookie called `name` among `Set-Cookie` strings.
#[must_use]
pub fn find_cookie<'a>(set_cookies: &'a [String], name: &str) -> Option<&'a str> {
    set_cookies.iter().find_map(|cookie| {
        let pair = cookie.split(';').next()?;
        let (key, value) = pair.split_once('=')?;
        (key.trim() == name).then(|| value.trim()).filter(|v| !v.is_empty())
    })
}

/// Build a `Set-Cookie` value for a token.
///
/// `Path` defaults to `/`; `Domain` and `Max-Age` are left out when unknown.
#[must_use]
pub fn generate_cookie(name: &str, value: &str, options: &CookieOptions<'_>) -> String {
    let mut parts = vec![format!("{name}={value}")];
    if let Some(domain) = options.domain.filter(|d| !d.is_empty()) {
        parts.push(format!("Domain={domain}"));
    }
    if let Some(max_age) = options.max_age {
        parts.push(format!("Max-Age={max_age}"));
    }
    let path = options.path.filter(|p| !p.is_empty()).unwrap_or("/");
    parts.push(format!("Path={path}"));
    parts.push("HttpOnly".into());
    parts.push("SameSite=Strict".into());
    parts.join("; ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use reqwest::header::HeaderValue;
    use rstest::rstest;

    #[test]
    fn collects_all_set_cookie_headers() {
        let mut headers = HeaderMap::new();
        headers.append(SET_COOKIE, HeaderValue::from_static("DS=session; Path=/"));
        headers.append(SET_COOKIE, HeaderValue::from_static("DSR=refresh; Path=/"));
        headers.append("content-type", HeaderValue::from_static("application/json"));

        assert_eq!(
            set_cookie_values(&headers),
            vec!["DS=session; Path=/", "DSR=refresh; Path=/"]
        );
    }

    #[rstest]
    #[case::first("DS", Some("session"))]
    #[case::second("DSR", Some("refresh"))]
    #[case::prefix_is_not_a_match("D", None)]
    #[case::missing("OTHER", None)]
    fn finds_cookie_by_name(#[case] name: &str, #[case] expected: Option<&str>) {
        let cookies = vec![
            "DS=session; Domain=example.com; Path=/".to_string(),
            "DSR=refresh; HttpOnly".to_string(),
        ];
        assert_eq!(find_cookie(&cookies, name), expected);
    }

    #[test]
    fn empty_cookie_value_is_ignored() {
        let cookies = vec!["DS=; Max-Age=0".to_string()];
        assert_eq!(find_cookie(&cookies, "DS"), None);
    }

    #[test]
    fn generates_cookie_with_all_attributes() {
        let options = CookieOptions {
            domain: Some("example.com"),
            path: Some("/app"),
            max_age: Some(3600),
        };
        assert_eq!(
            generate_cookie("DS", "jwt", &options),
            "DS=jwt; Domain=example.com; Max-Age=3600; Path=/app; HttpOnly; SameSite=Strict"
        );
    }

    #[test]
    fn generates_cookie_with_defaults() {
        assert_eq!(
            generate_cookie("DSR", "jwt", &CookieOptions::default()),
            "DSR=jwt; Path=/; HttpOnly; SameSite=Strict"
        );
    }
}
