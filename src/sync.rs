//! Label Synchronization
//!
//! Drives the per-repository, per-pull-request pipeline: fetch changed
//! files, reconcile labels, apply the result. Failures stay confined to the
//! unit (repository or PR) they occur in.

use std::collections::BTreeSet;

use crate::config::Reposlug;
use crate::github::{GitHubClient, PullRequest, PullState};
use crate::reconcile::{reconcile, Reconciliation};
use crate::rules::LabelRules;

/// Services shared by every unit of work, built once at startup
#[derive(Debug, Clone)]
pub struct Context {
    pub github: GitHubClient,
    pub rules: LabelRules,
}

/// Per-invocation options
#[derive(Debug, Clone, Default)]
pub struct Options {
    /// Filter pulls by state; `None` lists without a state filter
    pub state: Option<PullState>,

    /// Filter pulls by base branch
    pub base: Option<String>,

    /// Remove rule labels whose patterns no longer match
    pub delete_old: bool,

    /// Fan out repositories, pull requests, and page fetches
    pub concurrent: bool,
}

/// Terminal state of a unit of work
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UnitStatus {
    Done,
    Failed(String),
}

impl UnitStatus {
    pub fn is_done(&self) -> bool {
        matches!(self, UnitStatus::Done)
    }
}

/// What happened to one label during reconciliation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LabelAction {
    Added,
    Removed,
    Kept,
}

impl LabelAction {
    pub fn symbol(self) -> char {
        match self {
            LabelAction::Added => '+',
            LabelAction::Removed => '-',
            LabelAction::Kept => '=',
        }
    }
}

/// One label transition, reported per successful pull request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabelDelta {
    pub name: String,
    pub action: LabelAction,
}

/// Outcome of one pull request unit
#[derive(Debug, Clone)]
pub struct PullReport {
    pub html_url: String,
    pub status: UnitStatus,
    /// Label transitions sorted by label name; empty on failure
    pub deltas: Vec<LabelDelta>,
}

/// Outcome of one repository unit
///
/// The repository's own status reflects only whether its PR listing
/// succeeded; individual pull request outcomes live in `pulls`.
#[derive(Debug, Clone)]
pub struct RepoReport {
    pub slug: Reposlug,
    pub status: UnitStatus,
    pub pulls: Vec<PullReport>,
}

/// Process every repository of an invocation
///
/// In concurrent mode each repository runs as an independent future; results
/// are joined in submission order, so the returned reports follow the input
/// order in both modes.
pub async fn process_repositories(
    ctx: &Context,
    slugs: &[Reposlug],
    opts: &Options,
) -> Vec<RepoReport> {
    if opts.concurrent {
        let units = slugs.iter().map(|slug| process_repository(ctx, slug, opts));
        futures::future::join_all(units).await
    } else {
        let mut reports = Vec::with_capacity(slugs.len());
        for slug in slugs {
            reports.push(process_repository(ctx, slug, opts).await);
        }
        reports
    }
}

/// Process a single repository: list its pull requests, then each PR
///
/// A listing failure marks the repository failed and spawns no PR units.
/// A failed PR does not affect its siblings.
pub async fn process_repository(ctx: &Context, slug: &Reposlug, opts: &Options) -> RepoReport {
    let pulls = match ctx
        .github
        .list_pull_requests(slug, opts.state, opts.base.as_deref(), opts.concurrent)
        .await
    {
        Ok(pulls) => pulls,
        Err(err) => {
            return RepoReport {
                slug: slug.clone(),
                status: UnitStatus::Failed(err.to_string()),
                pulls: Vec::new(),
            }
        }
    };

    let reports = if opts.concurrent {
        let units = pulls.iter().map(|pr| process_pull(ctx, pr, opts));
        futures::future::join_all(units).await
    } else {
        let mut reports = Vec::with_capacity(pulls.len());
        for pr in &pulls {
            reports.push(process_pull(ctx, pr, opts).await);
        }
        reports
    };

    RepoReport {
        slug: slug.clone(),
        status: UnitStatus::Done,
        pulls: reports,
    }
}

/// Process a single pull request: fetch files, reconcile, apply labels
async fn process_pull(ctx: &Context, pr: &PullRequest, opts: &Options) -> PullReport {
    let failed = |err: String| PullReport {
        html_url: pr.html_url.clone(),
        status: UnitStatus::Failed(err),
        deltas: Vec::new(),
    };

    let files = match ctx.github.list_changed_files(pr, opts.concurrent).await {
        Ok(files) => files,
        Err(err) => return failed(err.to_string()),
    };

    let computed: BTreeSet<String> = files
        .iter()
        .flat_map(|file| ctx.rules.match_path(&file.filename))
        .collect();
    let current = pr.label_names();
    let result = reconcile(&current, &computed, &ctx.rules.known_labels(), opts.delete_old);

    if let Err(err) = ctx.github.replace_labels(pr, &result.final_labels).await {
        return failed(err.to_string());
    }

    PullReport {
        html_url: pr.html_url.clone(),
        status: UnitStatus::Done,
        deltas: label_deltas(&result, opts.delete_old),
    }
}

/// Flatten a reconciliation into display transitions sorted by label name
///
/// Removed labels are reported only when deletion was requested, matching
/// what was actually applied.
fn label_deltas(result: &Reconciliation, delete_old: bool) -> Vec<LabelDelta> {
    let mut deltas = Vec::new();
    for name in &result.to_add {
        deltas.push(LabelDelta {
            name: name.clone(),
            action: LabelAction::Added,
        });
    }
    if delete_old {
        for name in &result.to_remove {
            deltas.push(LabelDelta {
                name: name.clone(),
                action: LabelAction::Removed,
            });
        }
    }
    for name in &result.to_keep {
        deltas.push(LabelDelta {
            name: name.clone(),
            action: LabelAction::Kept,
        });
    }
    deltas.sort_by(|a, b| a.name.cmp(&b.name));
    deltas
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::github::GitHubClient;
    use serde_json::json;
    use url::Url;
    use wiremock::matchers::{body_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn context(server: &MockServer, rules: &[(&str, &[&str])]) -> Context {
        let base = Url::parse(&format!("{}/", server.uri())).unwrap();
        let github = GitHubClient::with_base_url("test-token", base).unwrap();
        let rules = LabelRules::new(rules.iter().map(|(label, patterns)| {
            (
                label.to_string(),
                patterns.iter().map(|p| p.to_string()).collect::<Vec<_>>(),
            )
        }))
        .unwrap();
        Context { github, rules }
    }

    fn pull_json(server: &MockServer, number: u64, labels: &[&str]) -> serde_json::Value {
        json!({
            "number": number,
            "url": format!("{}/repos/o/r/pulls/{}", server.uri(), number),
            "issue_url": format!("{}/repos/o/r/issues/{}", server.uri(), number),
            "html_url": format!("https://github.com/o/r/pull/{}", number),
            "labels": labels.iter().map(|n| json!({ "name": n })).collect::<Vec<_>>(),
        })
    }

    async fn mount_files(server: &MockServer, number: u64, names: &[&str]) {
        Mock::given(method("GET"))
            .and(path(format!("/repos/o/r/pulls/{}/files", number)))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!(names
                .iter()
                .map(|n| json!({ "filename": n }))
                .collect::<Vec<_>>())))
            .mount(server)
            .await;
    }

    #[tokio::test]
    async fn test_pull_request_pipeline_end_to_end() {
        let server = MockServer::start().await;
        let ctx = context(&server, &[("docs", &["*.md"]), ("code", &["*.go"])]);

        Mock::given(method("GET"))
            .and(path("/repos/o/r/pulls"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!([pull_json(&server, 1, &["docs", "stale"])])),
            )
            .mount(&server)
            .await;
        mount_files(&server, 1, &["readme.md", "main.go"]).await;
        // "stale" is foreign and must survive the overwrite
        Mock::given(method("PUT"))
            .and(path("/repos/o/r/issues/1/labels"))
            .and(body_json(json!(["code", "docs", "stale"])))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
            .expect(1)
            .mount(&server)
            .await;

        let slug: Reposlug = "o/r".parse().unwrap();
        let opts = Options {
            delete_old: true,
            ..Options::default()
        };
        let report = process_repository(&ctx, &slug, &opts).await;

        assert!(report.status.is_done());
        assert_eq!(report.pulls.len(), 1);
        let pr = &report.pulls[0];
        assert!(pr.status.is_done());
        assert_eq!(
            pr.deltas,
            vec![
                LabelDelta {
                    name: "code".to_string(),
                    action: LabelAction::Added
                },
                LabelDelta {
                    name: "docs".to_string(),
                    action: LabelAction::Kept
                },
            ]
        );
    }

    #[tokio::test]
    async fn test_failed_pull_does_not_affect_sibling() {
        let server = MockServer::start().await;
        let ctx = context(&server, &[("docs", &["*.md"])]);

        Mock::given(method("GET"))
            .and(path("/repos/o/r/pulls"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                pull_json(&server, 1, &[]),
                pull_json(&server, 2, &[]),
            ])))
            .mount(&server)
            .await;
        mount_files(&server, 1, &["readme.md"]).await;
        Mock::given(method("GET"))
            .and(path("/repos/o/r/pulls/2/files"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;
        Mock::given(method("PUT"))
            .and(path("/repos/o/r/issues/1/labels"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
            .mount(&server)
            .await;

        let slug: Reposlug = "o/r".parse().unwrap();
        for concurrent in [false, true] {
            let opts = Options {
                delete_old: true,
                concurrent,
                ..Options::default()
            };
            let report = process_repository(&ctx, &slug, &opts).await;

            assert!(report.status.is_done());
            assert!(report.pulls[0].status.is_done());
            assert!(matches!(report.pulls[1].status, UnitStatus::Failed(_)));
            assert_eq!(report.pulls[0].deltas.len(), 1);
        }
    }

    #[tokio::test]
    async fn test_failed_repository_does_not_affect_sibling() {
        let server = MockServer::start().await;
        let ctx = context(&server, &[("docs", &["*.md"])]);

        Mock::given(method("GET"))
            .and(path("/repos/o/bad/pulls"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/repos/o/good/pulls"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
            .mount(&server)
            .await;

        let slugs: Vec<Reposlug> =
            vec!["o/bad".parse().unwrap(), "o/good".parse().unwrap()];
        for concurrent in [false, true] {
            let opts = Options {
                concurrent,
                ..Options::default()
            };
            let reports = process_repositories(&ctx, &slugs, &opts).await;

            // Report order always follows input order
            assert_eq!(reports[0].slug.to_string(), "o/bad");
            assert!(matches!(reports[0].status, UnitStatus::Failed(_)));
            assert!(reports[0].pulls.is_empty());
            assert_eq!(reports[1].slug.to_string(), "o/good");
            assert!(reports[1].status.is_done());
        }
    }

    #[tokio::test]
    async fn test_update_failure_marks_pull_failed() {
        let server = MockServer::start().await;
        let ctx = context(&server, &[("docs", &["*.md"])]);

        Mock::given(method("GET"))
            .and(path("/repos/o/r/pulls"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!([pull_json(&server, 1, &[])])),
            )
            .mount(&server)
            .await;
        mount_files(&server, 1, &["readme.md"]).await;
        Mock::given(method("PUT"))
            .and(path("/repos/o/r/issues/1/labels"))
            .respond_with(ResponseTemplate::new(403))
            .mount(&server)
            .await;

        let slug: Reposlug = "o/r".parse().unwrap();
        let report = process_repository(&ctx, &slug, &Options::default()).await;

        assert!(report.status.is_done());
        assert!(matches!(report.pulls[0].status, UnitStatus::Failed(_)));
        assert!(report.pulls[0].deltas.is_empty());
    }

    #[test]
    fn test_label_deltas_sorted_and_filtered() {
        let result = Reconciliation {
            to_add: BTreeSet::from(["zeta".to_string()]),
            to_remove: BTreeSet::from(["alpha".to_string()]),
            to_keep: BTreeSet::from(["mid".to_string()]),
            final_labels: BTreeSet::new(),
        };

        let with_delete = label_deltas(&result, true);
        assert_eq!(
            with_delete
                .iter()
                .map(|d| (d.name.as_str(), d.action.symbol()))
                .collect::<Vec<_>>(),
            vec![("alpha", '-'), ("mid", '='), ("zeta", '+')]
        );

        let without_delete = label_deltas(&result, false);
        assert_eq!(
            without_delete
                .iter()
                .map(|d| (d.name.as_str(), d.action.symbol()))
                .collect::<Vec<_>>(),
            vec![("mid", '='), ("zeta", '+')]
        );
    }
}
