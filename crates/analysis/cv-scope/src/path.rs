//! Path-sensitive facts about a function body
//!
//! Scoping only needs to know whether a variable may have been initialized on
//! some path reaching the end of its scope. [`IncidentLog`] is a small
//! structured-control-flow analyser that answers this for bodies made of
//! sequences and branches.

use cv_types::VariableId;
use rustc_hash::FxHashSet;
use std::mem;

/// Something that happened on a control-flow path
#[derive(Copy, Clone, Debug, Hash, Eq, PartialEq)]
pub enum PathIncident {
    /// A value was stored into the variable
    InitializedVariable(VariableId),
}

/// Collaborator tracking incidents along control-flow paths
pub trait PathAnalyser {
    /// Record that `incident` happened on the current path
    fn record(&mut self, incident: PathIncident);

    /// Whether `incident` happened on at least one path reaching this point
    fn has_potentially(&self, incident: PathIncident) -> bool;

    /// Whether `incident` happened on every path reaching this point
    fn has_certainly(&self, incident: PathIncident) -> bool;
}

#[derive(Debug, Clone, Default)]
struct PathState {
    certain: FxHashSet<PathIncident>,
    potential: FxHashSet<PathIncident>,
}

/// Incident tracker for structured control flow
///
/// Branches are opened with [`IncidentLog::begin_branch`] and closed with
/// [`IncidentLog::end_branch`]. Once every branch of a construct is closed,
/// [`IncidentLog::end_mutually_exclusive_branches`] merges them for constructs
/// where exactly one branch runs (an `if` with an `else`), and
/// [`IncidentLog::end_uncertain_branches`] for constructs that may run none of
/// them (an `if` without `else`, loops).
#[derive(Debug, Clone)]
pub struct IncidentLog {
    paths: Vec<PathState>,
    finished: Vec<Vec<PathState>>,
}

impl IncidentLog {
    /// A log for a body with no incidents yet
    pub fn new() -> Self {
        Self {
            paths: vec![PathState::default()],
            finished: vec![Vec::new()],
        }
    }

    fn current(&self) -> &PathState {
        let index = self.paths.len() - 1;
        &self.paths[index]
    }

    fn current_mut(&mut self) -> &mut PathState {
        let index = self.paths.len() - 1;
        &mut self.paths[index]
    }

    /// Start a branch that inherits everything recorded so far
    pub fn begin_branch(&mut self) {
        let state = self.current().clone();
        self.paths.push(state);
        self.finished.push(Vec::new());
    }

    /// Close the current branch and keep it for the next merge
    pub fn end_branch(&mut self) {
        if self.paths.len() < 2 {
            return;
        }
        if let Some(state) = self.paths.pop() {
            self.finished.pop();
            if let Some(siblings) = self.finished.last_mut() {
                siblings.push(state);
            }
        }
    }

    /// Merge closed branches of which exactly one runs
    pub fn end_mutually_exclusive_branches(&mut self) {
        let branches = self.take_finished();
        let mut certain: Option<FxHashSet<PathIncident>> = None;
        let mut potential = FxHashSet::default();
        for branch in branches {
            certain = Some(match certain {
                Some(so_far) => so_far.intersection(&branch.certain).copied().collect(),
                None => branch.certain,
            });
            potential.extend(branch.potential);
        }
        let current = self.current_mut();
        if let Some(certain) = certain {
            current.certain.extend(certain);
        }
        current.potential.extend(potential);
    }

    /// Merge closed branches of which any number may run
    pub fn end_uncertain_branches(&mut self) {
        let branches = self.take_finished();
        let current = self.current_mut();
        for branch in branches {
            current.potential.extend(branch.potential);
        }
    }

    fn take_finished(&mut self) -> Vec<PathState> {
        self.finished.last_mut().map(mem::take).unwrap_or_default()
    }
}

impl Default for IncidentLog {
    fn default() -> Self {
        Self::new()
    }
}

impl PathAnalyser for IncidentLog {
    fn record(&mut self, incident: PathIncident) {
        let current = self.current_mut();
        current.certain.insert(incident);
        current.potential.insert(incident);
    }

    fn has_potentially(&self, incident: PathIncident) -> bool {
        self.current().potential.contains(&incident)
    }

    fn has_certainly(&self, incident: PathIncident) -> bool {
        self.current().certain.contains(&incident)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn init(id: u32) -> PathIncident {
        PathIncident::InitializedVariable(VariableId(id))
    }

    #[test]
    fn test_straight_line_is_certain() {
        let mut log = IncidentLog::new();
        log.record(init(0));
        assert!(log.has_certainly(init(0)));
        assert!(log.has_potentially(init(0)));
        assert!(!log.has_potentially(init(1)));
    }

    #[test]
    fn test_exclusive_branches_intersect() {
        let mut log = IncidentLog::new();
        log.begin_branch();
        log.record(init(0));
        log.record(init(1));
        log.end_branch();
        log.begin_branch();
        log.record(init(0));
        log.end_branch();
        log.end_mutually_exclusive_branches();

        assert!(log.has_certainly(init(0)));
        assert!(!log.has_certainly(init(1)));
        assert!(log.has_potentially(init(1)));
    }

    #[test]
    fn test_uncertain_branches_are_only_potential() {
        let mut log = IncidentLog::new();
        log.begin_branch();
        log.record(init(2));
        log.end_branch();
        log.end_uncertain_branches();

        assert!(!log.has_certainly(init(2)));
        assert!(log.has_potentially(init(2)));
    }

    #[test]
    fn test_branch_sees_earlier_incidents() {
        let mut log = IncidentLog::new();
        log.record(init(0));
        log.begin_branch();
        assert!(log.has_certainly(init(0)));
        log.end_branch();
        log.end_uncertain_branches();
        assert!(log.has_certainly(init(0)));
    }
}
