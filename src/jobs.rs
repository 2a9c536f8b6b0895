//! Job manager.
//!
//! Each background pipeline is spawned into its own process group (pgid ==
//! the leader's pid, set by `crate::exec::external` via `setpgid`), so a
//! single `killpg` reaches every process in the pipeline regardless of how
//! many stages it has. Liveness is polled with a non-blocking `waitpid(-pgid,
//! WNOHANG)`, matching the reap loop in `redox-os-ion`'s `shell::job`/
//! `pipe_exec` (see `other_examples/5e432c4a_Eijebong-ion__src-shell-job.rs.rs`).

use std::collections::HashMap;

use nix::sys::signal::{killpg, Signal};
use nix::sys::wait::{waitpid, WaitPidFlag, WaitStatus};
use nix::unistd::Pid;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobState {
    Running,
    Stopped,
    Done(i32),
    Signaled(i32),
}

impl JobState {
    pub fn is_finished(&self) -> bool {
        matches!(self, JobState::Done(_) | JobState::Signaled(_))
    }

    /// Single-letter status marker as shown by the `jobs` builtin.
    pub fn marker(&self) -> &'static str {
        match self {
            JobState::Running => "Running",
            JobState::Stopped => "Stopped",
            JobState::Done(0) => "Done",
            JobState::Done(_) => "Exit",
            JobState::Signaled(_) => "Terminated",
        }
    }
}

#[derive(Debug, Clone)]
pub struct Job {
    pub id: i32,
    pub pgid: Pid,
    pub command: String,
    pub state: JobState,
    pub background: bool,
}

#[derive(Debug, Default)]
pub struct JobManager {
    jobs: HashMap<i32, Job>,
    /// Job ids in most-recently-touched-first order, used to resolve `%+`/`%-`.
    recency: Vec<i32>,
}

impl JobManager {
    pub fn new() -> Self {
        Self { jobs: HashMap::new(), recency: Vec::new() }
    }

    pub fn add(&mut self, id: i32, pgid: Pid, command: String, background: bool) {
        self.jobs.insert(id, Job { id, pgid, command, state: JobState::Running, background });
        self.touch(id);
    }

    fn touch(&mut self, id: i32) {
        self.recency.retain(|&j| j != id);
        self.recency.insert(0, id);
    }

    pub fn get(&self, id: i32) -> Option<&Job> {
        self.jobs.get(&id)
    }

    pub fn get_mut(&mut self, id: i32) -> Option<&mut Job> {
        self.jobs.get_mut(&id)
    }

    pub fn remove(&mut self, id: i32) -> Option<Job> {
        self.recency.retain(|&j| j != id);
        self.jobs.remove(&id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Job> {
        self.jobs.values()
    }

    pub fn current(&self) -> Option<&Job> {
        self.recency.first().and_then(|id| self.jobs.get(id))
    }

    pub fn previous(&self) -> Option<&Job> {
        self.recency.get(1).and_then(|id| self.jobs.get(id))
    }

    /// Resolve a job designator: `%3`, `%+`, `%-`, `%%`, `+`, `-`, or a bare
    /// number.
    pub fn resolve(&self, designator: &str) -> Option<&Job> {
        let trimmed = designator.strip_prefix('%').unwrap_or(designator);
        match trimmed {
            "+" | "%" | "" => self.current(),
            "-" => self.previous(),
            n => n.parse::<i32>().ok().and_then(|id| self.jobs.get(&id)),
        }
    }

    /// Send `sig` to every process in the job's process group.
    pub fn signal(&mut self, id: i32, sig: Signal) -> Result<(), nix::Error> {
        let pgid = self.jobs.get(&id).map(|j| j.pgid).ok_or(nix::Error::ESRCH)?;
        killpg(pgid, sig)
    }

    /// Non-blocking reap of one job's process group; updates and returns its
    /// new state if it changed.
    pub fn poll(&mut self, id: i32) -> Option<JobState> {
        let pgid = self.jobs.get(&id)?.pgid;
        let flags = WaitPidFlag::WNOHANG | WaitPidFlag::WUNTRACED | WaitPidFlag::WCONTINUED;
        match waitpid(Pid::from_raw(-pgid.as_raw()), Some(flags)) {
            Ok(WaitStatus::Exited(_, code)) => self.set_state(id, JobState::Done(code)),
            Ok(WaitStatus::Signaled(_, sig, _)) => self.set_state(id, JobState::Signaled(sig as i32)),
            Ok(WaitStatus::Stopped(_, _)) => self.set_state(id, JobState::Stopped),
            Ok(WaitStatus::Continued(_)) => self.set_state(id, JobState::Running),
            _ => None,
        }
    }

    fn set_state(&mut self, id: i32, state: JobState) -> Option<JobState> {
        let job = self.jobs.get_mut(&id)?;
        if job.state != state {
            job.state = state;
            Some(state)
        } else {
            None
        }
    }

    /// Poll every tracked job once; returns ids whose state changed.
    pub fn poll_all(&mut self) -> Vec<i32> {
        let ids: Vec<i32> = self.jobs.keys().copied().collect();
        ids.into_iter().filter(|&id| self.poll(id).is_some()).collect()
    }

    /// Drop jobs that have finished and been reported (the `jobs` builtin
    /// calls this after printing a `Done`/`Terminated` line once).
    pub fn sweep_finished(&mut self) {
        let done: Vec<i32> = self.jobs.iter().filter(|(_, j)| j.state.is_finished()).map(|(&id, _)| id).collect();
        for id in done {
            self.remove(id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mgr_with_two() -> JobManager {
        let mut m = JobManager::new();
        m.add(1, Pid::from_raw(100), "sleep 5".into(), true);
        m.add(2, Pid::from_raw(200), "sleep 10".into(), true);
        m
    }

    #[test]
    fn current_and_previous_track_recency() {
        let m = mgr_with_two();
        assert_eq!(m.current().unwrap().id, 2);
        assert_eq!(m.previous().unwrap().id, 1);
    }

    #[test]
    fn resolve_designators() {
        let m = mgr_with_two();
        assert_eq!(m.resolve("%1").unwrap().id, 1);
        assert_eq!(m.resolve("%+").unwrap().id, 2);
        assert_eq!(m.resolve("%-").unwrap().id, 1);
        assert!(m.resolve("%9").is_none());
    }

    #[test]
    fn job_state_marker_done_vs_exit() {
        assert_eq!(JobState::Done(0).marker(), "Done");
        assert_eq!(JobState::Done(1).marker(), "Exit");
        assert!(JobState::Done(1).is_finished());
        assert!(!JobState::Running.is_finished());
    }

    #[test]
    fn remove_drops_from_recency() {
        let mut m = mgr_with_two();
        m.remove(2);
        assert_eq!(m.current().unwrap().id, 1);
    }
}
