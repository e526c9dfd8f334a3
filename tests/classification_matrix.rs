//! Classification matrix.
//!
//! Every row is a git invocation and the locking decision the hooks must
//! reach for it. Under-classifying stalls read-only commands behind the
//! lock; over-classifying lets a mutating command race the service.
//!
//! # Test Categories
//!
//! 1. **Read-only verbs** - never contact the service
//! 2. **Status** - availability check when optional locks are off
//! 3. **Reset** - `--soft` leaves the working tree alone
//! 4. **Aliases** - skipped; git re-runs the hooks for the expansion
//! 5. **Everything else** - requires the lock

use std::collections::HashMap;

use gvfs_hooks::engine::classify::{
    classify, is_known_command, LockDecision, GIT_OPTIONAL_LOCKS, KNOWN_COMMANDS,
    NO_LOCK_COMMANDS,
};
use gvfs_hooks::git::{AliasResolver, NoAliases};

use LockDecision::{AvailabilityCheckOnly, NoLockNeeded, RequiresLock};

// =============================================================================
// Test Fixtures
// =============================================================================

/// Aliases configured for the matrix.
struct ConfiguredAliases;

impl AliasResolver for ConfiguredAliases {
    fn is_alias(&self, verb: &str) -> bool {
        matches!(verb, "co" | "st" | "unstage" | "checkout")
    }
}

fn no_env() -> HashMap<String, String> {
    HashMap::new()
}

fn optional_locks(value: &str) -> HashMap<String, String> {
    HashMap::from([(GIT_OPTIONAL_LOCKS.to_string(), value.to_string())])
}

fn check(verb: &str, args: &[&str], env: HashMap<String, String>, expected: LockDecision) {
    assert_eq!(
        classify(verb, args, env.clone(), ConfiguredAliases),
        expected,
        "git {verb} {args:?} with {env:?}"
    );
}

// =============================================================================
// Matrix
// =============================================================================

#[test]
fn read_only_verbs() {
    for verb in NO_LOCK_COMMANDS {
        check(verb, &[], no_env(), NoLockNeeded);
        check(verb, &["--help"], no_env(), NoLockNeeded);
        check(&format!("git-{verb}"), &[], no_env(), NoLockNeeded);
        check(&verb.to_uppercase(), &[], no_env(), NoLockNeeded);
    }
}

#[test]
fn read_only_set_is_exact() {
    let mut verbs: Vec<&str> = NO_LOCK_COMMANDS.to_vec();
    verbs.sort_unstable();
    assert_eq!(
        verbs,
        [
            "blame",
            "branch",
            "cat-file",
            "check-attr",
            "check-ignore",
            "check-mailmap",
            "commit-graph",
            "config",
            "credential",
            "diff",
            "diff-files",
            "diff-index",
            "diff-tree",
            "difftool",
            "fetch",
            "for-each-ref",
            "hash-object",
            "help",
            "index-pack",
            "log",
            "ls-files",
            "ls-tree",
            "merge-base",
            "multi-pack-index",
            "name-rev",
            "push",
            "remote",
            "rev-list",
            "rev-parse",
            "show",
            "show-ref",
            "submodule",
            "symbolic-ref",
            "tag",
            "unpack-objects",
            "update-ref",
            "version",
            "web--browse",
        ]
    );
}

#[test]
fn status_rows() {
    check("status", &[], no_env(), RequiresLock);
    check("status", &["-s"], no_env(), RequiresLock);
    check("status", &["--no-lock-index"], no_env(), AvailabilityCheckOnly);
    check("Git-Status", &["--no-lock-index"], no_env(), AvailabilityCheckOnly);
    check("status", &["--no-lock-index=x"], no_env(), RequiresLock);

    for off in ["false", "FALSE", "no", "off", "0"] {
        check("status", &[], optional_locks(off), AvailabilityCheckOnly);
    }
    for on in ["true", "1", "yes", ""] {
        check("status", &[], optional_locks(on), RequiresLock);
    }
}

#[test]
fn optional_locks_do_not_leak_to_other_verbs() {
    check("commit", &[], optional_locks("0"), RequiresLock);
    check("log", &[], optional_locks("0"), NoLockNeeded);
}

#[test]
fn reset_rows() {
    check("reset", &["--soft"], no_env(), NoLockNeeded);
    check("reset", &["--soft", "HEAD~1"], no_env(), NoLockNeeded);
    check("reset", &["HEAD~1", "--soft"], no_env(), NoLockNeeded);
    check("reset", &["--hard"], no_env(), RequiresLock);
    check("reset", &["--mixed"], no_env(), RequiresLock);
    check("reset", &[], no_env(), RequiresLock);
    check("commit", &["--soft"], no_env(), RequiresLock);
}

#[test]
fn alias_rows() {
    check("co", &["main"], no_env(), NoLockNeeded);
    check("st", &[], no_env(), NoLockNeeded);
    check("unstage", &["file"], no_env(), NoLockNeeded);
    check("CO", &[], no_env(), NoLockNeeded);
}

#[test]
fn alias_cannot_shadow_builtin() {
    check("checkout", &["main"], no_env(), RequiresLock);
}

#[test]
fn mutating_rows() {
    for verb in [
        "add", "am", "apply", "checkout", "cherry-pick", "clean", "commit", "merge", "mv",
        "pull", "rebase", "restore", "revert", "rm", "stash", "switch", "update-index",
        "worktree",
    ] {
        check(verb, &[], no_env(), RequiresLock);
    }
}

#[test]
fn unknown_verb_without_alias_requires_lock() {
    assert_eq!(
        classify("frobnicate", &["--now"], no_env(), NoAliases),
        RequiresLock
    );
    assert_eq!(classify("", &[] as &[&str], no_env(), NoAliases), RequiresLock);
}

#[test]
fn known_set_covers_read_only_set() {
    for verb in NO_LOCK_COMMANDS.iter().chain(KNOWN_COMMANDS) {
        assert!(is_known_command(verb), "{verb}");
    }
    assert!(!is_known_command("co"));
}
