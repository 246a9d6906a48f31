use crate::{UrlError, UrlResult};
use url::Url;

/// Returns the authority (lowercase host plus non-default port) of a URL
///
/// Site boundaries are compared against this, so a crawl of a local test
/// server on `127.0.0.1:8080` stays on that port.
///
/// # Examples
///
/// ```
/// use url::Url;
/// use fashion_corpus::url::url_authority;
///
/// let url = Url::parse("https://WWW.Vogue.com/fashion").unwrap();
/// assert_eq!(url_authority(&url), Some("www.vogue.com".to_string()));
///
/// let url = Url::parse("http://127.0.0.1:8080/").unwrap();
/// assert_eq!(url_authority(&url), Some("127.0.0.1:8080".to_string()));
/// ```
pub fn url_authority(url: &Url) -> Option<String> {
    let host = url.host_str()?.to_lowercase();
    match url.port() {
        Some(port) => Some(format!("{}:{}", host, port)),
        None => Some(host),
    }
}

/// Derives the base domain of a site from its base URL
pub fn base_domain(base_url: &str) -> UrlResult<String> {
    let url = Url::parse(base_url).map_err(|e| UrlError::Parse(e.to_string()))?;
    url_authority(&url).ok_or(UrlError::MissingDomain)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_domain_keeps_www() {
        assert_eq!(base_domain("https://www.vogue.com").unwrap(), "www.vogue.com");
    }

    #[test]
    fn test_base_domain_with_path() {
        assert_eq!(
            base_domain("https://www.elle.com/fashion/").unwrap(),
            "www.elle.com"
        );
    }

    #[test]
    fn test_base_domain_with_port() {
        assert_eq!(base_domain("http://127.0.0.1:4000").unwrap(), "127.0.0.1:4000");
    }

    #[test]
    fn test_base_domain_default_port_dropped() {
        assert_eq!(base_domain("https://www.elle.com:443/").unwrap(), "www.elle.com");
    }

    #[test]
    fn test_base_domain_invalid() {
        assert!(matches!(base_domain("not a url"), Err(UrlError::Parse(_))));
        assert!(matches!(
            base_domain("mailto:someone@vogue.com"),
            Err(UrlError::MissingDomain)
        ));
    }
}
