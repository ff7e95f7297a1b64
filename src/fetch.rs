use anyhow::{Context, Result};
use futures_util::future::try_join_all;
use tracing::debug;

/// True for `http://` and `https://` URLs. Anything else is a local path,
/// including relative paths such as `http_cache/young.txt`.
pub fn is_remote(source: &str) -> bool {
    reqwest::Url::parse(source)
        .map(|url| matches!(url.scheme(), "http" | "https"))
        .unwrap_or(false)
}

/// Reads a source that is either an http(s) URL or a local path.
pub async fn fetch_text(client: &reqwest::Client, source: &str) -> Result<String> {
    let text = if is_remote(source) {
        client
            .get(source)
            .send()
            .await
            .and_then(|resp| resp.error_for_status())
            .with_context(|| format!("Failed to fetch {}", source))?
            .text()
            .await
            .with_context(|| format!("Failed to read body of {}", source))?
    } else {
        tokio::fs::read_to_string(source)
            .await
            .with_context(|| format!("Failed to read {}", source))?
    };
    debug!(source, bytes = text.len(), "Fetched source");
    Ok(text)
}

/// Fetches every source concurrently. Any failure fails the whole batch;
/// results keep the order of `sources`.
#[tracing::instrument(skip_all, fields(sources = sources.len()))]
pub async fn fetch_all(sources: &[String]) -> Result<Vec<String>> {
    let client = reqwest::Client::new();
    try_join_all(sources.iter().map(|s| fetch_text(&client, s))).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[tokio::test]
    async fn local_files_are_read_in_order() {
        let mut a = tempfile::NamedTempFile::new().unwrap();
        let mut b = tempfile::NamedTempFile::new().unwrap();
        write!(a, "first").unwrap();
        write!(b, "second").unwrap();

        let sources = vec![
            a.path().to_string_lossy().into_owned(),
            b.path().to_string_lossy().into_owned(),
        ];
        let texts = fetch_all(&sources).await.unwrap();
        assert_eq!(texts, vec!["first", "second"]);
    }

    #[test]
    fn only_http_schemes_are_remote() {
        assert!(is_remote("http://example.com/young.txt"));
        assert!(is_remote("https://example.com/libs.json"));
        assert!(!is_remote("http_cache/young.txt"));
        assert!(!is_remote("https_mirror/libs.json"));
        assert!(!is_remote("/tmp/http/young.txt"));
    }

    #[tokio::test]
    async fn local_paths_starting_with_http_are_read_from_disk() {
        let cache = tempfile::Builder::new()
            .prefix("http_cache")
            .tempdir_in(".")
            .unwrap();
        std::fs::write(cache.path().join("young.txt"), "2020,종로구,사직동,1").unwrap();

        let name = cache.path().file_name().unwrap().to_string_lossy();
        let source = format!("{}/young.txt", name);
        assert!(source.starts_with("http"));

        let texts = fetch_all(&[source]).await.unwrap();
        assert_eq!(texts, vec!["2020,종로구,사직동,1"]);
    }

    #[tokio::test]
    async fn one_missing_source_fails_the_batch() {
        let mut a = tempfile::NamedTempFile::new().unwrap();
        write!(a, "ok").unwrap();
        let dir = tempfile::tempdir().unwrap();

        let sources = vec![
            a.path().to_string_lossy().into_owned(),
            dir.path().join("missing.txt").to_string_lossy().into_owned(),
        ];
        let err = fetch_all(&sources).await.unwrap_err();
        assert!(err.to_string().contains("missing.txt"));
    }
}
