use anyhow::{Result, bail};

/// Rejects URLs that do not start with one of `allowed_prefixes`.
pub(crate) fn validate_download_url(url: &str, allowed_prefixes: &[String]) -> Result<()> {
    if allowed_prefixes
        .iter()
        .any(|prefix| !prefix.is_empty() && url.starts_with(prefix.as_str()))
    {
        return Ok(());
    }
    bail!(
        "Invalid download url: {url}\n  \
         Allowed prefixes: {}\n  \
         Pass --allow-prefix PREFIX or set allowed_prefix in the config file.",
        allowed_prefixes.join(", ")
    );
}
