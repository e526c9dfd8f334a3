//! engine::report
//!
//! Recovery instructions for files the service failed to reconcile during
//! Release.
//!
//! Small failure sets list every path with the command that recovers it;
//! above the display threshold only the counts are shown.

use crate::protocol::ReleaseOutcome;
use crate::ui::output::format_list;

const UPDATE_RECOVERY: &str = "    git checkout -- ";
const DELETE_RECOVERY: &str = "    git clean -f ";

/// Render the report for `outcome`, or `None` when nothing failed.
pub fn render_release_outcome(outcome: &ReleaseOutcome, threshold: usize) -> Option<String> {
    if !outcome.has_failures() {
        return None;
    }

    let mut lines = Vec::new();
    if outcome.failure_count() > threshold {
        if outcome.failed_update_count > 0 {
            lines.push(summary("update", outcome.failed_update_count));
        }
        if outcome.failed_delete_count > 0 {
            lines.push(summary("delete", outcome.failed_delete_count));
        }
    } else {
        if !outcome.failed_update_paths.is_empty() {
            lines.push(listing(
                "update",
                &outcome.failed_update_paths,
                UPDATE_RECOVERY,
            ));
        }
        if !outcome.failed_delete_paths.is_empty() {
            lines.push(listing(
                "delete",
                &outcome.failed_delete_paths,
                DELETE_RECOVERY,
            ));
        }
    }

    Some(lines.join("\n"))
}

fn summary(action: &str, count: usize) -> String {
    format!(
        "GVFS failed to {action} {count} files, run 'git status' to check the status of files in the repo"
    )
}

fn listing(action: &str, paths: &[String], recovery: &str) -> String {
    let mut sorted: Vec<&String> = paths.iter().collect();
    sorted.sort_by_cached_key(|path| path.to_lowercase());

    format!(
        "GVFS was unable to {action} the following files. To recover, close all handles to the files and run these commands:\n{}",
        format_list(&sorted, recovery)
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn outcome(updates: &[&str], deletes: &[&str]) -> ReleaseOutcome {
        ReleaseOutcome {
            failed_update_count: updates.len(),
            failed_delete_count: deletes.len(),
            failed_update_paths: updates.iter().map(|p| p.to_string()).collect(),
            failed_delete_paths: deletes.iter().map(|p| p.to_string()).collect(),
        }
    }

    #[test]
    fn nothing_failed() {
        assert_eq!(render_release_outcome(&outcome(&[], &[]), 100), None);
    }

    #[test]
    fn update_paths_sorted_case_insensitively() {
        let text = render_release_outcome(&outcome(&["B.txt", "a.txt"], &[]), 100).unwrap();

        let a = text.find("git checkout -- a.txt").unwrap();
        let b = text.find("git checkout -- B.txt").unwrap();
        assert!(a < b);
        assert!(!text.contains("git clean"));
    }

    #[test]
    fn full_listing() {
        let text = render_release_outcome(
            &outcome(&["src/Main.rs", "README.md", "docs/a.md"], &["old/Gone.txt", "junk"]),
            100,
        )
        .unwrap();

        insta::assert_snapshot!(text, @r"
        GVFS was unable to update the following files. To recover, close all handles to the files and run these commands:
            git checkout -- docs/a.md
            git checkout -- README.md
            git checkout -- src/Main.rs
        GVFS was unable to delete the following files. To recover, close all handles to the files and run these commands:
            git clean -f junk
            git clean -f old/Gone.txt
        ");
    }

    #[test]
    fn summary_above_threshold() {
        let text = render_release_outcome(&outcome(&["a", "b"], &["c"]), 2).unwrap();
        assert_eq!(
            text,
            "GVFS failed to update 2 files, run 'git status' to check the status of files in the repo\n\
             GVFS failed to delete 1 files, run 'git status' to check the status of files in the repo"
        );
    }

    #[test]
    fn threshold_is_inclusive_for_listing() {
        let text = render_release_outcome(&outcome(&["a", "b"], &["c"]), 3).unwrap();
        assert!(text.contains("git clean -f c"));
    }

    #[test]
    fn summary_omits_zero_counts() {
        let text = render_release_outcome(&outcome(&[], &["a", "b"]), 1).unwrap();
        assert!(!text.contains("update"));
        assert!(text.starts_with("GVFS failed to delete 2 files"));
    }
}
