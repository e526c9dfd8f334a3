//! engine::classify
//!
//! Decides whether a git invocation needs the working-set lock.
//!
//! # Rules
//!
//! Evaluated in order, first match wins:
//!
//! 1. The verb is normalized: lowercased, leading `git-` removed.
//! 2. `status` with `--no-lock-index`, or with `GIT_OPTIONAL_LOCKS` set to
//!    `false`, `no`, `off` or `0`, only checks availability.
//! 3. Verbs in [`NO_LOCK_COMMANDS`] never take the lock.
//! 4. `reset --soft` does not touch the working tree.
//! 5. A verb git does not know that resolves to a configured alias is
//!    skipped; git re-runs the hooks for the expanded command.
//! 6. Everything else requires the lock.
//!
//! # Invariants
//!
//! - Classification is total and never fails.
//! - The result depends only on the verb, the arguments, the environment
//!   and alias configuration, so the pre-command and post-command hooks of
//!   one git invocation always agree.

use std::collections::HashMap;

use crate::git::AliasResolver;

/// Environment variable git uses to make optional locks opt-out.
pub const GIT_OPTIONAL_LOCKS: &str = "GIT_OPTIONAL_LOCKS";

/// `status` flag asking git not to refresh the index.
pub const NO_LOCK_INDEX: &str = "--no-lock-index";

/// Verbs that never mutate the working tree or index.
pub const NO_LOCK_COMMANDS: &[&str] = &[
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
    "help",
    "hash-object",
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
    "symbolic-ref",
    "submodule",
    "tag",
    "unpack-objects",
    "update-ref",
    "version",
    "web--browse",
];

/// Git commands that are never looked up as aliases, beyond
/// [`NO_LOCK_COMMANDS`]. Git ignores aliases that shadow these.
pub const KNOWN_COMMANDS: &[&str] = &[
    "add",
    "am",
    "annotate",
    "apply",
    "archive",
    "bisect",
    "bundle",
    "checkout",
    "checkout-index",
    "cherry",
    "cherry-pick",
    "clean",
    "clone",
    "commit",
    "commit-tree",
    "count-objects",
    "describe",
    "fast-export",
    "fast-import",
    "fetch-pack",
    "filter-branch",
    "format-patch",
    "fsck",
    "gc",
    "grep",
    "gui",
    "init",
    "ls-remote",
    "maintenance",
    "merge",
    "merge-file",
    "merge-index",
    "mktag",
    "mktree",
    "mv",
    "notes",
    "pack-objects",
    "pack-refs",
    "prune",
    "pull",
    "range-diff",
    "read-tree",
    "rebase",
    "reflog",
    "repack",
    "replace",
    "rerere",
    "reset",
    "restore",
    "revert",
    "rm",
    "send-pack",
    "shortlog",
    "show-branch",
    "sparse-checkout",
    "stash",
    "status",
    "stripspace",
    "switch",
    "update-index",
    "verify-pack",
    "worktree",
    "write-tree",
];

/// Verbs rejected outright in a GVFS enlistment, with the reason shown.
pub const BLOCKED_COMMANDS: &[(&str, &str)] = &[(
    "gui",
    "To access the 'git gui' in a GVFS repo, please invoke 'git-gui' instead.",
)];

/// What the hooks must do for a git invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LockDecision {
    /// Take the lock before git runs and release it afterwards.
    RequiresLock,
    /// Do not contact the service.
    NoLockNeeded,
    /// Wait until the lock is free, but do not take it.
    AvailabilityCheckOnly,
}

impl LockDecision {
    pub fn needs_service(self) -> bool {
        self != LockDecision::NoLockNeeded
    }
}

/// Read access to environment variables.
pub trait EnvLookup {
    fn var(&self, name: &str) -> Option<String>;
}

/// The real process environment.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessEnv;

impl EnvLookup for ProcessEnv {
    fn var(&self, name: &str) -> Option<String> {
        std::env::var(name).ok()
    }
}

impl EnvLookup for HashMap<String, String> {
    fn var(&self, name: &str) -> Option<String> {
        self.get(name).cloned()
    }
}

impl<T: EnvLookup + ?Sized> EnvLookup for &T {
    fn var(&self, name: &str) -> Option<String> {
        (**self).var(name)
    }
}

/// Lowercase and strip a leading `git-`.
pub fn normalize_verb(verb: &str) -> String {
    let lower = verb.to_lowercase();
    match lower.strip_prefix("git-") {
        Some(rest) => rest.to_string(),
        None => lower,
    }
}

/// Whether git knows `verb` as a built-in command.
pub fn is_known_command(verb: &str) -> bool {
    NO_LOCK_COMMANDS.contains(&verb) || KNOWN_COMMANDS.contains(&verb)
}

/// The message for a verb that must not run in an enlistment.
pub fn blocked_reason(verb: &str) -> Option<&'static str> {
    let verb = normalize_verb(verb);
    BLOCKED_COMMANDS
        .iter()
        .find(|(blocked, _)| *blocked == verb)
        .map(|(_, reason)| *reason)
}

fn optional_locks_disabled(value: &str) -> bool {
    ["false", "no", "off", "0"]
        .iter()
        .any(|off| value.eq_ignore_ascii_case(off))
}

/// Classifier bound to an environment and an alias resolver.
#[derive(Debug, Clone, Copy)]
pub struct Classifier<E, A> {
    env: E,
    aliases: A,
}

impl<E: EnvLookup, A: AliasResolver> Classifier<E, A> {
    pub fn new(env: E, aliases: A) -> Self {
        Self { env, aliases }
    }

    /// Classify `verb` invoked with `args` (arguments after the verb).
    pub fn classify<S: AsRef<str>>(&self, verb: &str, args: &[S]) -> LockDecision {
        let verb = normalize_verb(verb);
        let has_arg = |flag: &str| args.iter().any(|a| a.as_ref() == flag);

        if verb == "status"
            && (has_arg(NO_LOCK_INDEX)
                || self
                    .env
                    .var(GIT_OPTIONAL_LOCKS)
                    .is_some_and(|v| optional_locks_disabled(&v)))
        {
            return LockDecision::AvailabilityCheckOnly;
        }

        if NO_LOCK_COMMANDS.contains(&verb.as_str()) {
            return LockDecision::NoLockNeeded;
        }

        if verb == "reset" && has_arg("--soft") {
            return LockDecision::NoLockNeeded;
        }

        if !is_known_command(&verb) && self.aliases.is_alias(&verb) {
            return LockDecision::NoLockNeeded;
        }

        LockDecision::RequiresLock
    }
}

/// One-shot classification.
pub fn classify<S, E, A>(verb: &str, args: &[S], env: E, aliases: A) -> LockDecision
where
    S: AsRef<str>,
    E: EnvLookup,
    A: AliasResolver,
{
    Classifier::new(env, aliases).classify(verb, args)
}
