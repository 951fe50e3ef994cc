//! Classification of a finished do-file run into a single commit action.
//!
//! A do-file may write its result to stdout (the capture sink) or to `$3`
//! (the explicit sink), never both. The decision is made once, from sizes and
//! existence alone, so applying it is a single rename or a single delete.

/// What a do-file did wrong, when it broke the single-output contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Violation {
    /// A task wrote bytes to `$3`; tasks have no artifact.
    TaskWroteExplicit,
    /// A file target received output on both stdout and `$3`.
    DualOutput,
}

/// The action that finalizes one build attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommitOutcome {
    /// Rename the capture sink onto the target path.
    PromoteCapture,
    /// Rename the explicit sink onto the target path.
    PromoteExplicit,
    /// No output was produced: remove any previously built target.
    DeleteStale,
    /// Task target finished cleanly; nothing to commit.
    NoOp,
    Violation(Violation),
}

/// Post-run state of both sinks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SinkState {
    /// Bytes written to stdout; always 0 for tasks, whose stdout is not captured.
    pub capture_len: u64,
    /// Size of `$3`, or `None` if the script never created it.
    pub explicit_len: Option<u64>,
}

/// Decide how to commit a successful run.
///
/// For file targets mere existence of `$3` counts, so a zero-byte `$3` still
/// wins over empty stdout and produces an empty target.
pub fn classify(is_task: bool, state: SinkState) -> CommitOutcome {
    if is_task {
        return match state.explicit_len {
            Some(len) if len > 0 => CommitOutcome::Violation(Violation::TaskWroteExplicit),
            _ => CommitOutcome::NoOp,
        };
    }

    let capture_has_data = state.capture_len > 0;
    let explicit_exists = state.explicit_len.is_some();
    match (capture_has_data, explicit_exists) {
        (false, false) => CommitOutcome::DeleteStale,
        (true, false) => CommitOutcome::PromoteCapture,
        (false, true) => CommitOutcome::PromoteExplicit,
        (true, true) => CommitOutcome::Violation(Violation::DualOutput),
    }
}
