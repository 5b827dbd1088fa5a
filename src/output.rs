//! Terminal Output
//!
//! Colored rendering of repository and pull request reports

use colored::{ColoredString, Colorize};

use crate::sync::{LabelAction, PullReport, RepoReport, UnitStatus};

fn status_word(status: &UnitStatus) -> ColoredString {
    match status {
        UnitStatus::Done => "OK".green().bold(),
        UnitStatus::Failed(_) => "FAIL".red().bold(),
    }
}

fn delta_line(name: &str, action: LabelAction) -> String {
    let line = format!("    {} {}", action.symbol(), name);
    match action {
        LabelAction::Added => line.green().to_string(),
        LabelAction::Removed => line.red().to_string(),
        LabelAction::Kept => line,
    }
}

/// Render one pull request unit as display lines
pub fn render_pull(report: &PullReport) -> String {
    let mut out = format!(
        "  {} {} - {}",
        "PR".bold(),
        report.html_url,
        status_word(&report.status)
    );
    for delta in &report.deltas {
        out.push('\n');
        out.push_str(&delta_line(&delta.name, delta.action));
    }
    out
}

/// Render one repository unit, including its pull requests
pub fn render_repository(report: &RepoReport) -> String {
    let mut out = format!(
        "{} {} - {}",
        "REPO".bold(),
        report.slug,
        status_word(&report.status)
    );
    for pull in &report.pulls {
        out.push('\n');
        out.push_str(&render_pull(pull));
    }
    out
}

/// Print the reports of a whole invocation in order
pub fn print_reports(reports: &[RepoReport]) {
    for report in reports {
        println!("{}", render_repository(report));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Reposlug;
    use crate::sync::LabelDelta;

    fn sample_report() -> RepoReport {
        RepoReport {
            slug: "octocat/spoon-knife".parse::<Reposlug>().unwrap(),
            status: UnitStatus::Done,
            pulls: vec![PullReport {
                html_url: "https://github.com/octocat/spoon-knife/pull/1".to_string(),
                status: UnitStatus::Done,
                deltas: vec![
                    LabelDelta {
                        name: "code".to_string(),
                        action: LabelAction::Added,
                    },
                    LabelDelta {
                        name: "docs".to_string(),
                        action: LabelAction::Removed,
                    },
                    LabelDelta {
                        name: "stale".to_string(),
                        action: LabelAction::Kept,
                    },
                ],
            }],
        }
    }

    #[test]
    fn test_render_repository_shape() {
        colored::control::set_override(false);
        let rendered = render_repository(&sample_report());
        let lines: Vec<&str> = rendered.lines().collect();
        assert_eq!(lines[0], "REPO octocat/spoon-knife - OK");
        assert_eq!(
            lines[1],
            "  PR https://github.com/octocat/spoon-knife/pull/1 - OK"
        );
        assert_eq!(lines[2], "    + code");
        assert_eq!(lines[3], "    - docs");
        assert_eq!(lines[4], "    = stale");
    }

    #[test]
    fn test_render_failed_units() {
        colored::control::set_override(false);
        let report = RepoReport {
            slug: "o/broken".parse::<Reposlug>().unwrap(),
            status: UnitStatus::Failed("HTTP 404".to_string()),
            pulls: Vec::new(),
        };
        assert_eq!(render_repository(&report), "REPO o/broken - FAIL");

        let pull = PullReport {
            html_url: "https://github.com/o/r/pull/2".to_string(),
            status: UnitStatus::Failed("HTTP 500".to_string()),
            deltas: Vec::new(),
        };
        assert_eq!(
            render_pull(&pull),
            "  PR https://github.com/o/r/pull/2 - FAIL"
        );
    }
}
