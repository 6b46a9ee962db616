use serde::de::DeserializeOwned;
use url::Url;

use crate::{error::*, http::Response};

pub fn parse_url(url: impl AsRef<str>) -> Result<Url> {
    match Url::parse(url.as_ref()) {
        Ok(url) => Ok(url),
        Err(e) => Err(Error::InvalidSyntaxUrl {
            url: url.as_ref().to_owned(),
            source: e,
        }),
    }
}

/// Make sure `base` ends with `/` so that `Url::join` appends instead of replacing the last segment.
pub fn normalize_base_url(mut base: Url) -> Url {
    if !base.path().ends_with('/') {
        let path = format!("{}/", base.path());
        base.set_path(&path);
    }
    base
}

pub fn ensure_success(resp: Response, requested_url: &Url) -> Result<Response> {
    let got = resp.status();
    if !got.is_success() {
        return Err(Error::UnexpectedResponseCode {
            got,
            requested_url: requested_url.to_string(),
        });
    }
    Ok(resp)
}

pub async fn read_json<T: DeserializeOwned>(resp: Response, requested_url: &Url) -> Result<T> {
    let resp = ensure_success(resp, requested_url)?;
    let bytes = resp.bytes().await?;
    Ok(serde_json::from_slice(&bytes)?)
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_normalize_base_url() {
        let u = normalize_base_url(parse_url("https://example.com/api").unwrap());
        assert_eq!(u.as_str(), "https://example.com/api/");
        assert_eq!(
            u.join("autotest/task").unwrap().as_str(),
            "https://example.com/api/autotest/task"
        );

        let u = normalize_base_url(parse_url("https://example.com/api/").unwrap());
        assert_eq!(u.as_str(), "https://example.com/api/");

        let u = normalize_base_url(parse_url("https://example.com").unwrap());
        assert_eq!(u.as_str(), "https://example.com/");
    }

    #[test]
    fn test_parse_url_error() {
        match parse_url("not a url") {
            Err(Error::InvalidSyntaxUrl { url, .. }) => assert_eq!(url, "not a url"),
            other => panic!("unexpected: {:?}", other),
        }
    }
}
