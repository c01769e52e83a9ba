use futures::stream::{self, StreamExt, TryStreamExt};
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION, LINK, USER_AGENT};
use reqwest::StatusCode;
use serde::Deserialize;
use tracing::{debug, info};

use crate::config::Config;
use crate::error::Error;

/// Defensive cap on pagination depth; beyond this the listing is considered
/// malformed.
const MAX_PAGES: usize = 10_000;

/// How many listing pages are fetched at once during collection.
const PAGE_FETCH_CONCURRENCY: usize = 4;

/// One repository as reported by the listing API.
///
/// Immutable once parsed; `full_name` doubles as the local directory name.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct RepoRecord {
    /// `owner/name`, unique within a run.
    pub full_name: String,
    /// HTTPS clone URL.
    pub clone_url: String,
    /// Repository size in kilobytes.
    pub size: u64,
    /// Whether the repository is a fork.
    pub fork: bool,
}

/// GitHub listing client: walks pagination links and collects repository
/// records.
pub struct GitHubClient {
    http: reqwest::Client,
    base_url: String,
}

impl GitHubClient {
    /// Create a client against the public GitHub API.
    pub fn new(config: &Config) -> anyhow::Result<Self> {
        Self::with_base_url(config, "https://api.github.com")
    }

    /// Create a client against an arbitrary API root. Used by tests to point
    /// at a mock server.
    pub fn with_base_url(config: &Config, base_url: &str) -> anyhow::Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/vnd.github.v3+json"));
        headers.insert(
            USER_AGENT,
            HeaderValue::from_static(concat!("repofetch/", env!("CARGO_PKG_VERSION"))),
        );

        if let Some(token) = &config.token {
            let mut value = HeaderValue::from_str(&format!("token {token}"))?;
            value.set_sensitive(true);
            headers.insert(AUTHORIZATION, value);
        }

        let http = reqwest::Client::builder().default_headers(headers).build()?;

        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    /// URL of the first listing page for an account.
    pub fn list_url(&self, account: &str) -> String {
        format!("{}/users/{}/repos", self.base_url, account)
    }

    /// Walk the paginated listing starting at `first_page_url`, following the
    /// `rel="next"` link relation until no further page is advertised.
    ///
    /// Returns every page URL in visitation order, the first page included.
    /// Any non-200 response aborts the walk: a later page might contain
    /// repositories not seen elsewhere, so a partial walk is worthless.
    pub async fn walk_pages(&self, first_page_url: &str) -> Result<Vec<String>, Error> {
        self.walk_pages_limited(first_page_url, MAX_PAGES).await
    }

    async fn walk_pages_limited(
        &self,
        first_page_url: &str,
        max_pages: usize,
    ) -> Result<Vec<String>, Error> {
        let mut pages = vec![first_page_url.to_string()];
        let mut current = first_page_url.to_string();

        loop {
            debug!("Probing listing page: {}", current);
            let response = self.http.get(&current).send().await?;
            let status = response.status();

            if status != StatusCode::OK {
                return Err(fetch_error(status, response.text().await.unwrap_or_default()));
            }

            let next = response
                .headers()
                .get(LINK)
                .and_then(|v| v.to_str().ok())
                .and_then(parse_next_link);

            match next {
                Some(url) => {
                    if pages.len() >= max_pages {
                        return Err(Error::PaginationLimit(pages.len()));
                    }
                    pages.push(url.clone());
                    current = url;
                }
                None => break,
            }
        }

        info!("Discovered {} listing page(s)", pages.len());
        Ok(pages)
    }

    /// Fetch every page and merge the parsed records, page order first and
    /// within-page array order second.
    ///
    /// Pages are independent reads, so they are fetched concurrently; a
    /// single failing page fails the whole collection. When `skip_forks` is
    /// set, records with `fork == true` are dropped.
    pub async fn collect_repos(
        &self,
        page_urls: &[String],
        skip_forks: bool,
    ) -> Result<Vec<RepoRecord>, Error> {
        let pages: Vec<Vec<RepoRecord>> = stream::iter(page_urls)
            .map(|url| self.fetch_page(url))
            .buffered(PAGE_FETCH_CONCURRENCY)
            .try_collect()
            .await?;

        let repos: Vec<RepoRecord> = pages
            .into_iter()
            .flatten()
            .filter(|repo| !(skip_forks && repo.fork))
            .collect();

        info!("Collected {} repositories", repos.len());
        Ok(repos)
    }

    /// Fetch a single listing page and parse its JSON array body.
    async fn fetch_page(&self, url: &str) -> Result<Vec<RepoRecord>, Error> {
        debug!("Fetching listing page: {}", url);
        let response = self.http.get(url).send().await?;
        let status = response.status();

        if status != StatusCode::OK {
            return Err(fetch_error(status, response.text().await.unwrap_or_default()));
        }

        let body = response.text().await?;
        let repos: Vec<RepoRecord> = serde_json::from_str(&body)
            .map_err(|e| fetch_error(status, format!("malformed repository listing: {e}")))?;

        Ok(repos)
    }
}

fn fetch_error(status: StatusCode, body: String) -> Error {
    Error::Fetch {
        status: status.as_u16(),
        body,
    }
}

/// Extract the `rel="next"` target from a `Link` response header (RFC 5988).
///
/// Returns `None` when the header carries no next relation, which terminates
/// the walk.
fn parse_next_link(header: &str) -> Option<String> {
    for part in header.split(',') {
        let mut sections = part.split(';');
        let target = sections.next()?.trim();

        let is_next = sections.any(|param| {
            let param = param.trim();
            param == "rel=\"next\"" || param == "rel=next"
        });

        if is_next && target.starts_with('<') && target.ends_with('>') {
            return Some(target[1..target.len() - 1].to_string());
        }
    }
    None
}
