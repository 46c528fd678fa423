//! Trajectory recorder (component 4.F)
//!
//! Appends `(t, dt, flattened_state)` for every `store_every_n`-th
//! accepted step, always forcing the first and the terminal sample
//! regardless of the decimation residue. Buffers grow by fixed
//! chunks rather than the source's repeated concatenation, keeping
//! append amortized O(1).

use crate::body::State;

const CHUNK: usize = 50_000;

/// Parallel growable arrays holding the recorded trajectory.
pub struct Trajectory {
    store_every_n: u64,
    step_index: u64,
    pub sol_time: Vec<f64>,
    pub sol_dt: Vec<f64>,
    pub sol_state: Vec<Vec<f64>>,
}

impl Trajectory {
    pub fn new(store_every_n: u64) -> Self {
        Trajectory {
            store_every_n: store_every_n.max(1),
            step_index: 0,
            sol_time: Vec::with_capacity(CHUNK),
            sol_dt: Vec::with_capacity(CHUNK),
            sol_state: Vec::with_capacity(CHUNK),
        }
    }

    pub fn len(&self) -> usize {
        self.sol_time.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sol_time.is_empty()
    }

    fn reserve_if_full(&mut self) {
        if self.sol_time.len() == self.sol_time.capacity() {
            self.sol_time.reserve(CHUNK);
            self.sol_dt.reserve(CHUNK);
            self.sol_state.reserve(CHUNK);
        }
    }

    fn push(&mut self, state: &State) {
        self.reserve_if_full();
        self.sol_time.push(state.t);
        self.sol_dt.push(state.dt);
        self.sol_state.push(state.flatten());
    }

    /// Record `state` if `step_index` falls on the decimation
    /// boundary, or unconditionally for the very first sample.
    /// Returns whether the sample was appended.
    pub fn record_if_due(&mut self, state: &State) -> bool {
        let due = self.step_index == 0 || self.step_index % self.store_every_n == 0;
        if due {
            self.push(state);
        }
        self.step_index += 1;
        due
    }

    /// Force-append the terminal state even if it doesn't fall on the
    /// decimation boundary, unless the last recorded sample is
    /// already this exact state.
    pub fn force_last(&mut self, state: &State) {
        if self.sol_time.last().copied() != Some(state.t) {
            self.push(state);
        }
    }

    /// Keep every `divide_factor`-th recorded sample, always
    /// preserving the final entry, matching the source's trim
    /// semantics so saved files stay reproducible.
    pub fn trim(&mut self, divide_factor: usize) {
        if divide_factor <= 1 || self.sol_time.is_empty() {
            return;
        }
        let last = self.sol_time.len() - 1;
        let mut kept_time = Vec::new();
        let mut kept_dt = Vec::new();
        let mut kept_state = Vec::new();
        for i in (0..self.sol_time.len()).step_by(divide_factor) {
            kept_time.push(self.sol_time[i]);
            kept_dt.push(self.sol_dt[i]);
            kept_state.push(self.sol_state[i].clone());
        }
        if kept_time.last().copied() != Some(self.sol_time[last]) {
            kept_time.push(self.sol_time[last]);
            kept_dt.push(self.sol_dt[last]);
            kept_state.push(self.sol_state[last].clone());
        }
        self.sol_time = kept_time;
        self.sol_dt = kept_dt;
        self.sol_state = kept_state;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::G;

    fn two_body(t: f64) -> State {
        let mut s = State::new(
            vec![1.0 / G, 1.0 / G],
            vec![[1.0, 0.0, 0.0], [-1.0, 0.0, 0.0]],
            vec![[0.0, 0.5, 0.0], [0.0, -0.5, 0.0]],
            0.01,
        )
        .unwrap();
        s.t = t;
        s
    }

    #[test]
    fn first_and_every_nth_step_is_recorded() {
        let mut traj = Trajectory::new(3);
        for step in 0..10 {
            traj.record_if_due(&two_body(step as f64));
        }
        assert_eq!(traj.sol_time, vec![0.0, 3.0, 6.0, 9.0]);
    }

    #[test]
    fn force_last_appends_terminal_sample_once() {
        let mut traj = Trajectory::new(4);
        for step in 0..6 {
            traj.record_if_due(&two_body(step as f64));
        }
        traj.force_last(&two_body(5.0));
        assert_eq!(*traj.sol_time.last().unwrap(), 5.0);

        let before = traj.len();
        traj.force_last(&two_body(5.0));
        assert_eq!(traj.len(), before);
    }

    #[test]
    fn sol_time_is_strictly_increasing_and_starts_at_t0() {
        let mut traj = Trajectory::new(2);
        for step in 0..20 {
            traj.record_if_due(&two_body(step as f64 * 0.5));
        }
        assert_eq!(traj.sol_time[0], 0.0);
        for w in traj.sol_time.windows(2) {
            assert!(w[1] > w[0]);
        }
    }

    #[test]
    fn trim_keeps_every_nth_and_forces_last() {
        let mut traj = Trajectory::new(1);
        for step in 0..10 {
            traj.record_if_due(&two_body(step as f64));
        }
        traj.trim(3);
        assert_eq!(traj.sol_time, vec![0.0, 3.0, 6.0, 9.0]);
    }
}
