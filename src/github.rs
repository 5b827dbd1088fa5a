//! GitHub API Client
//!
//! Authenticated REST operations and the paginated fetch layer

use std::collections::BTreeSet;

use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, LINK};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use url::Url;

use crate::config::Reposlug;
use crate::error::{Error, Result};
use crate::page::{page_number, with_page, PageLinks};

/// Production API root
pub const BASE_URL: &str = "https://api.github.com/";

/// Page size requested for every collection
pub const PER_PAGE: u32 = 100;

/// Pull request state filter
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum PullState {
    Open,
    Closed,
    All,
}

impl PullState {
    pub fn as_str(self) -> &'static str {
        match self {
            PullState::Open => "open",
            PullState::Closed => "closed",
            PullState::All => "all",
        }
    }
}

/// A pull request as returned by the list endpoint
///
/// `url` is the API resource (changed files live under it), `issue_url` is
/// the issue resource that owns the labels, `html_url` is for display only.
#[derive(Debug, Clone, Deserialize)]
pub struct PullRequest {
    pub number: u64,
    pub url: String,
    pub issue_url: String,
    pub html_url: String,
    #[serde(default)]
    pub labels: Vec<Label>,
}

impl PullRequest {
    /// The label names currently on this pull request
    pub fn label_names(&self) -> BTreeSet<String> {
        self.labels.iter().map(|label| label.name.clone()).collect()
    }
}

/// A label attached to a pull request
#[derive(Debug, Clone, Deserialize)]
pub struct Label {
    pub name: String,
}

/// One file touched by a pull request
#[derive(Debug, Clone, Deserialize)]
pub struct FileChange {
    pub filename: String,
}

#[derive(Debug, Deserialize)]
struct User {
    login: String,
}

/// GitHub API client
///
/// Wraps a single reqwest client carrying the token header; safe to share
/// across concurrent tasks.
#[derive(Debug, Clone)]
pub struct GitHubClient {
    http: reqwest::Client,
    base_url: Url,
}

impl GitHubClient {
    /// Create a client against the production API
    ///
    /// # Errors
    /// Returns an error if the token is not a valid header value or the
    /// underlying client cannot be built.
    pub fn new(token: &str) -> Result<Self> {
        Self::with_base_url(token, Url::parse(BASE_URL)?)
    }

    /// Create a client against an arbitrary API root
    pub fn with_base_url(token: &str, base_url: Url) -> Result<Self> {
        let mut auth = HeaderValue::from_str(&format!("token {}", token))
            .map_err(|_| Error::config("token contains characters not allowed in a header"))?;
        auth.set_sensitive(true);

        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, auth);

        let http = reqwest::Client::builder()
            .user_agent(concat!("filabel/", env!("CARGO_PKG_VERSION")))
            .default_headers(headers)
            .build()?;

        Ok(Self { http, base_url })
    }

    /// Resolve the login of the token's user
    ///
    /// # Errors
    /// Any non-success response maps to [`Error::Auth`]; this is the one
    /// failure that is fatal to a whole run.
    pub async fn authenticated_user(&self) -> Result<String> {
        let url = self.base_url.join("user")?;
        let response = self.http.get(url).send().await?;
        if !response.status().is_success() {
            return Err(Error::Auth);
        }
        let user: User = response.json().await?;
        Ok(user.login)
    }

    /// List the pull requests of a repository, all pages
    pub async fn list_pull_requests(
        &self,
        slug: &Reposlug,
        state: Option<PullState>,
        base: Option<&str>,
        concurrent: bool,
    ) -> Result<Vec<PullRequest>> {
        let mut url = self
            .base_url
            .join(&format!("repos/{}/{}/pulls", slug.owner, slug.name))?;
        {
            let mut query = url.query_pairs_mut();
            query.append_pair("per_page", &PER_PAGE.to_string());
            if let Some(state) = state {
                query.append_pair("state", state.as_str());
            }
            if let Some(base) = base {
                query.append_pair("base", base);
            }
        }
        self.fetch_all(url, concurrent).await
    }

    /// List the files changed by a pull request, all pages
    pub async fn list_changed_files(
        &self,
        pr: &PullRequest,
        concurrent: bool,
    ) -> Result<Vec<FileChange>> {
        let mut url = Url::parse(&format!("{}/files", pr.url))?;
        url.query_pairs_mut()
            .append_pair("per_page", &PER_PAGE.to_string());
        self.fetch_all(url, concurrent).await
    }

    /// Overwrite the full label set of a pull request's issue
    ///
    /// The server's label set becomes exactly `labels`; this is a single
    /// idempotent call, not additive.
    pub async fn replace_labels(
        &self,
        pr: &PullRequest,
        labels: &BTreeSet<String>,
    ) -> Result<()> {
        let url = format!("{}/labels", pr.issue_url);
        let body: Vec<&str> = labels.iter().map(String::as_str).collect();
        let response = self.http.put(&url).json(&body).send().await?;
        if !response.status().is_success() {
            return Err(Error::LabelUpdate {
                url,
                status: response.status().as_u16(),
            });
        }
        Ok(())
    }

    /// Fetch every page of a collection
    ///
    /// Sequential mode follows each response's `next` relation. Concurrent
    /// mode derives the remaining page range `[next, last]` from page 1's
    /// links and issues one request per page in parallel; merged item order
    /// between pages is not significant. A response advertising `next`
    /// without `last` falls back to sequential following, so `fetch_all`
    /// stays total over any link header. Any failing page aborts the whole
    /// call and already-fetched pages are dropped.
    async fn fetch_all<T: DeserializeOwned>(&self, url: Url, concurrent: bool) -> Result<Vec<T>> {
        let (mut items, links) = self.fetch_page::<T>(url).await?;

        let Some(next) = links.next else {
            return Ok(items);
        };

        if concurrent {
            if let Some(last) = links.last {
                let first_remaining = page_number(&next)?;
                let last_page = page_number(&last)?;
                let requests = (first_remaining..=last_page)
                    .map(|page| self.fetch_page::<T>(with_page(&next, page)));
                for (page_items, _) in futures::future::try_join_all(requests).await? {
                    items.extend(page_items);
                }
                return Ok(items);
            }
        }

        let mut cursor = Some(next);
        while let Some(url) = cursor {
            let (page_items, links) = self.fetch_page::<T>(url).await?;
            items.extend(page_items);
            cursor = links.next;
        }

        Ok(items)
    }

    /// Fetch one page and its pagination links
    async fn fetch_page<T: DeserializeOwned>(&self, url: Url) -> Result<(Vec<T>, PageLinks)> {
        let response = self.http.get(url.clone()).send().await?;
        if !response.status().is_success() {
            return Err(Error::PageFetch {
                url: url.to_string(),
                status: response.status().as_u16(),
            });
        }

        let links = match response.headers().get(LINK) {
            Some(value) => {
                let value = value
                    .to_str()
                    .map_err(|_| Error::PageLink("Link header is not valid UTF-8".to_string()))?;
                PageLinks::parse(value)?
            }
            None => PageLinks::default(),
        };

        let items = response.json().await?;
        Ok((items, links))
    }
}
