//! Best-effort favicon resolution for tracked project websites.
//!
//! Resolution order follows the probe-then-scan heuristic: try the
//! conventional `/favicon.ico` path first, then fall back to scanning the
//! origin's root document for `<link rel="icon">` declarations. Failures stay
//! inside this module; callers only ever see `None`.

use std::sync::LazyLock;
use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use regex::Regex;
use reqwest::Client;
use reqwest::header::CONTENT_TYPE;
use tracing::warn;
use url::Url;

use crate::config::FaviconConfig;

/// Declared size assumed for `<link>` elements without a parseable `sizes`
/// attribute.
pub const DEFAULT_ICON_SIZE: u32 = 32;

/// Link relations that advertise an icon.
const ICON_RELATIONS: &[&str] = &["icon", "shortcut icon", "apple-touch-icon"];

static LINK_TAG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)<link\b[^>]*>").expect("link tag pattern compiles"));

static LINK_ATTR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)([a-z-]+)\s*=\s*(?:"([^"]*)"|'([^']*)'|([^\s>"']+))"#)
        .expect("link attribute pattern compiles")
});

#[derive(Clone)]
pub struct FaviconResolver {
    client: Client,
    probe_timeout: Duration,
    page_timeout: Duration,
    image_timeout: Duration,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IconLink {
    pub href: String,
    pub size: u32,
}

impl FaviconResolver {
    pub fn new(config: &FaviconConfig) -> Result<Self> {
        let probe_timeout = config.probe_timeout();
        let page_timeout = config.page_timeout();
        let image_timeout = config.image_timeout();
        assert!(
            probe_timeout >= Duration::from_millis(100),
            "Probe timeout below 100ms is unsafe"
        );

        let client = Client::builder()
            .build()
            .context("Failed to build favicon HTTP client")?;

        Ok(Self {
            client,
            probe_timeout,
            page_timeout,
            image_timeout,
        })
    }

    /// Resolves the icon URL for a website. Never errors past this boundary:
    /// any network or parse failure is logged and collapses to `None`.
    pub async fn resolve(&self, raw_url: &str) -> Option<Url> {
        let origin = match normalize_origin(raw_url) {
            Ok(origin) => origin,
            Err(err) => {
                warn!("Could not retrieve favicon for {raw_url}: {err}");
                return None;
            }
        };

        match self.resolve_from_origin(&origin).await {
            Ok(found) => found,
            Err(err) => {
                warn!("Could not retrieve favicon for {raw_url}: {err}");
                None
            }
        }
    }

    async fn resolve_from_origin(&self, origin: &Url) -> Result<Option<Url>> {
        let probe = origin
            .join("/favicon.ico")
            .context("Origin does not accept a path")?;
        let probed = self
            .client
            .get(probe.clone())
            .timeout(self.probe_timeout)
            .send()
            .await;
        if let Ok(response) = probed {
            if response.status().is_success() {
                return Ok(Some(probe));
            }
        }

        let page = self
            .client
            .get(origin.clone())
            .timeout(self.page_timeout)
            .send()
            .await
            .context("Root document fetch failed")?;
        if !page.status().is_success() {
            return Err(anyhow!("Root document returned {}", page.status()));
        }
        let html = page
            .text()
            .await
            .context("Root document body could not be read")?;

        let Some(best) = pick_best_icon(&scan_icon_links(&html)) else {
            return Ok(None);
        };
        let resolved = origin
            .join(&best.href)
            .context("Icon href does not resolve against the origin")?;
        Ok(Some(resolved))
    }

    /// Downloads the resolved icon and sniffs the payload. Non-image bodies
    /// (error pages served with a 200, SVG markup) are rejected.
    pub async fn fetch_image(&self, icon_url: &Url) -> Result<(Vec<u8>, String)> {
        let response = self
            .client
            .get(icon_url.clone())
            .timeout(self.image_timeout)
            .send()
            .await
            .with_context(|| format!("Icon fetch failed for {icon_url}"))?;
        if !response.status().is_success() {
            return Err(anyhow!("Icon fetch returned {}", response.status()));
        }

        let declared_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string);

        let bytes = response
            .bytes()
            .await
            .context("Icon body could not be read")?
            .to_vec();
        if bytes.is_empty() {
            return Err(anyhow!("Icon response body is empty"));
        }

        let format = image::guess_format(&bytes)
            .map_err(|_| anyhow!("Icon payload is not a recognized image format"))?;
        let content_type = declared_type.unwrap_or_else(|| format.to_mime_type().to_string());
        Ok((bytes, content_type))
    }
}

/// Normalizes a user-entered website value to its origin URL. Values without
/// an HTTP scheme default to HTTPS.
pub fn normalize_origin(raw: &str) -> Result<Url> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(anyhow!("Website URL cannot be empty"));
    }

    let candidate = if trimmed.starts_with("http://") || trimmed.starts_with("https://") {
        trimmed.to_string()
    } else {
        format!("https://{trimmed}")
    };

    let url = Url::parse(&candidate).with_context(|| format!("Invalid website URL: {trimmed}"))?;
    let origin = url.origin();
    if !origin.is_tuple() {
        return Err(anyhow!("Website URL has no host: {trimmed}"));
    }
    Url::parse(&origin.ascii_serialization()).context("Origin did not serialize to a URL")
}

/// Extracts icon `<link>` declarations from an HTML document. This is an
/// attribute-level scan, not a DOM parse; it only needs rel/href/sizes.
pub fn scan_icon_links(html: &str) -> Vec<IconLink> {
    let mut links = Vec::new();
    for tag in LINK_TAG.find_iter(html) {
        let mut rel = None;
        let mut href = None;
        let mut sizes = None;
        for attr in LINK_ATTR.captures_iter(tag.as_str()) {
            let name = attr.get(1).map_or("", |m| m.as_str()).to_ascii_lowercase();
            let value = attr
                .get(2)
                .or_else(|| attr.get(3))
                .or_else(|| attr.get(4))
                .map_or("", |m| m.as_str());
            match name.as_str() {
                "rel" => rel = Some(value.to_ascii_lowercase()),
                "href" => href = Some(value.to_string()),
                "sizes" => sizes = Some(value.to_string()),
                _ => {}
            }
        }

        let Some(rel) = rel else { continue };
        if !ICON_RELATIONS.contains(&rel.as_str()) {
            continue;
        }
        let Some(href) = href else { continue };
        if href.is_empty() {
            continue;
        }

        links.push(IconLink {
            href,
            size: parse_declared_size(sizes.as_deref()),
        });
    }
    links
}

/// First link with the largest declared size wins.
pub fn pick_best_icon(links: &[IconLink]) -> Option<IconLink> {
    let mut best: Option<&IconLink> = None;
    for link in links {
        if best.is_none_or(|current| link.size > current.size) {
            best = Some(link);
        }
    }
    best.cloned()
}

fn parse_declared_size(sizes: Option<&str>) -> u32 {
    let Some(sizes) = sizes else {
        return DEFAULT_ICON_SIZE;
    };
    sizes
        .split(['x', 'X'])
        .next()
        .and_then(|leading| leading.trim().parse::<u32>().ok())
        .unwrap_or(DEFAULT_ICON_SIZE)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn origin_normalization_defaults_to_https() {
        let origin = normalize_origin("foo.xyz").unwrap();
        assert_eq!(origin.as_str(), "https://foo.xyz/");

        let kept = normalize_origin("http://foo.xyz/app/page?x=1").unwrap();
        assert_eq!(kept.as_str(), "http://foo.xyz/");

        let with_port = normalize_origin("https://foo.xyz:8443/deep").unwrap();
        assert_eq!(with_port.as_str(), "https://foo.xyz:8443/");

        assert!(normalize_origin("").is_err());
        assert!(normalize_origin("https://").is_err());
    }

    #[test]
    fn link_scan_matches_icon_relations_only() {
        let html = r#"
            <html><head>
            <link rel="stylesheet" href="/style.css">
            <link rel="icon" href="/fav32.png" sizes="32x32">
            <link rel='SHORTCUT ICON' href='/legacy.ico'>
            <link rel="apple-touch-icon" sizes="180x180" href="/touch.png">
            <link rel="icon" sizes="bogus" href="/default.png">
            <link rel="icon" sizes="64x64">
            </head></html>
        "#;

        let links = scan_icon_links(html);
        assert_eq!(
            links,
            vec![
                IconLink {
                    href: "/fav32.png".to_string(),
                    size: 32
                },
                IconLink {
                    href: "/legacy.ico".to_string(),
                    size: DEFAULT_ICON_SIZE
                },
                IconLink {
                    href: "/touch.png".to_string(),
                    size: 180
                },
                IconLink {
                    href: "/default.png".to_string(),
                    size: DEFAULT_ICON_SIZE
                },
            ]
        );
    }

    #[test]
    fn unquoted_attributes_are_scanned() {
        let html = r#"<link rel=icon href=/plain.ico sizes=16x16>"#;
        let links = scan_icon_links(html);
        assert_eq!(
            links,
            vec![IconLink {
                href: "/plain.ico".to_string(),
                size: 16
            }]
        );
    }

    #[test]
    fn largest_declared_size_wins_ties_to_first() {
        let links = vec![
            IconLink {
                href: "/a.png".to_string(),
                size: 32,
            },
            IconLink {
                href: "/b.png".to_string(),
                size: 180,
            },
            IconLink {
                href: "/c.png".to_string(),
                size: 180,
            },
        ];
        assert_eq!(pick_best_icon(&links).unwrap().href, "/b.png");
        assert!(pick_best_icon(&[]).is_none());
    }

    #[tokio::test]
    async fn unreachable_host_resolves_to_none() {
        let config = FaviconConfig {
            probe_timeout_ms: Some(500),
            page_timeout_ms: Some(500),
            image_timeout_ms: Some(500),
            concurrency: 10,
        };
        let resolver = FaviconResolver::new(&config).unwrap();
        // Discard port on loopback; nothing listens there.
        assert!(resolver.resolve("http://127.0.0.1:9").await.is_none());
    }
}
