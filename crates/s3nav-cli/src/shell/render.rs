//! Text rendering of navigation state and outcomes.

use std::fmt::Write;

use s3nav_core::{EntryKind, Error, NavigationState, Outcome};

/// Title of the focused list: `Buckets`, or `bucket/prefix`.
pub fn title(state: &NavigationState) -> String {
    match state.bucket() {
        None => "Buckets".to_string(),
        Some(bucket) => format!("{bucket}/{}", state.prefix),
    }
}

/// Renders the focused list under a header naming the identity.
pub fn view(state: &NavigationState, identity: &str) -> String {
    let mut out = format!("[{identity}] {}\n", title(state));

    if state.at_bucket_level() {
        push_labels(&mut out, &state.bucket_names);
        return out;
    }

    if state.entries.is_empty() {
        out.push_str("  (empty)\n");
    }
    for entry in &state.entries {
        let marker = match entry.kind() {
            EntryKind::UpDir | EntryKind::Folder => 'd',
            EntryKind::Object => '-',
        };
        let _ = writeln!(out, "  {marker} {}", entry.label());
    }
    out
}

/// Renders a filtered view.
pub fn search_results(state: &NavigationState, identity: &str, labels: &[String]) -> String {
    let mut out = format!(
        "[{identity}] {} (search: {} match{})\n",
        title(state),
        labels.len(),
        if labels.len() == 1 { "" } else { "es" }
    );
    push_labels(&mut out, labels);
    out
}

/// Renders the result of a successful intent.
pub fn outcome(state: &NavigationState, identity: &str, outcome: &Outcome) -> String {
    match outcome {
        Outcome::BucketOpened
        | Outcome::Navigated
        | Outcome::AtBucketRoot
        | Outcome::Refreshed
        | Outcome::Restored(_) => view(state, identity),
        Outcome::Filtered(labels) => search_results(state, identity, labels),
        Outcome::Previewed { key, preview } => format!("--- {key} ---\n{preview}\n"),
        Outcome::Deleted { key, refresh } => format!(
            "Deleted {key}\n{}{}",
            stale_warning(refresh.as_ref()),
            view(state, identity)
        ),
        Outcome::Refused { label } => {
            format!("'{label}' is a folder; only objects can be deleted or renamed\n")
        }
        Outcome::Renamed { from, to, refresh } => format!(
            "Renamed {from} -> {to}\n{}{}",
            stale_warning(refresh.as_ref()),
            view(state, identity)
        ),
        Outcome::RenameIncomplete {
            from,
            to,
            error,
            refresh,
        } => format!(
            "Copied {from} -> {to} but {from} could not be removed: {error}\n{}{}",
            stale_warning(refresh.as_ref()),
            view(state, identity)
        ),
        Outcome::BucketCreated(created) if created.original => {
            format!("Created bucket {}\n{}", created.name, view(state, identity))
        }
        Outcome::BucketCreated(created) => format!(
            "Name was taken, created bucket {} instead\n{}",
            created.name,
            view(state, identity)
        ),
    }
}

/// Notes that the listing below predates a committed mutation.
fn stale_warning(refresh: Option<&Error>) -> String {
    refresh
        .map(|e| format!("Warning: listing not refreshed: {e}\n"))
        .unwrap_or_default()
}

fn push_labels(out: &mut String, labels: &[String]) {
    if labels.is_empty() {
        out.push_str("  (empty)\n");
    }
    for label in labels {
        let _ = writeln!(out, "  {label}");
    }
}
