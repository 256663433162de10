//! Step-by-step replay of stored bootstrap iterations
//!
//! A cursor walks the persisted draws one sampled cell (or one whole
//! iteration) at a time. It holds no timer of its own: a consumer calls
//! [`ReplayCursor::tick`] at whatever pace it renders.

use serde::Serialize;

use crate::bootstrap::{IterationRecord, SampledCell};
use crate::distribution::ReserveDistribution;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum PlaybackState {
    /// Nothing revealed yet
    Ready,
    Playing,
    Paused,
    /// Every iteration has been revealed
    Complete,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum StepMode {
    /// Reveal one sampled cell per step
    #[default]
    Cell,
    /// Reveal a whole iteration per step
    Iteration,
}

/// Position of the cursor: the last revealed cell of an iteration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Frame {
    pub iteration: usize,
    pub cell: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ReplayCursor {
    iterations: usize,
    cells: usize,
    mode: StepMode,
    state: PlaybackState,
    position: Option<Frame>,
}

impl ReplayCursor {
    /// Cursor over `iterations` iterations of `cells` draws each
    pub fn new(iterations: usize, cells: usize) -> Self {
        let state = if iterations == 0 || cells == 0 {
            PlaybackState::Complete
        } else {
            PlaybackState::Ready
        };
        Self {
            iterations,
            cells,
            mode: StepMode::default(),
            state,
            position: None,
        }
    }

    pub fn for_records(records: &[IterationRecord]) -> Self {
        let cells = records.first().map_or(0, IterationRecord::cell_count);
        Self::new(records.len(), cells)
    }

    pub fn with_mode(mut self, mode: StepMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn set_mode(&mut self, mode: StepMode) {
        self.mode = mode;
    }

    pub fn mode(&self) -> StepMode {
        self.mode
    }

    pub fn state(&self) -> PlaybackState {
        self.state
    }

    pub fn position(&self) -> Option<Frame> {
        self.position
    }

    pub fn iterations(&self) -> usize {
        self.iterations
    }

    pub fn cells(&self) -> usize {
        self.cells
    }

    pub fn play(&mut self) {
        if self.state != PlaybackState::Complete {
            self.state = PlaybackState::Playing;
        }
    }

    pub fn pause(&mut self) {
        if self.state == PlaybackState::Playing {
            self.state = PlaybackState::Paused;
        }
    }

    pub fn toggle(&mut self) {
        match self.state {
            PlaybackState::Playing => self.pause(),
            _ => self.play(),
        }
    }

    /// Advance one step if playing
    pub fn tick(&mut self) -> Option<Frame> {
        match self.state {
            PlaybackState::Playing => self.step(),
            _ => None,
        }
    }

    /// Advance one step regardless of play state
    ///
    /// Returns the new position, or `None` once the last iteration has been
    /// passed and the cursor is complete.
    pub fn step(&mut self) -> Option<Frame> {
        if self.state == PlaybackState::Complete {
            return None;
        }
        let last_cell = self.cells - 1;
        let next = match (self.position, self.mode) {
            (None, StepMode::Cell) => Frame { iteration: 0, cell: 0 },
            (None, StepMode::Iteration) => Frame { iteration: 0, cell: last_cell },
            (Some(f), StepMode::Cell) if f.cell < last_cell => Frame {
                iteration: f.iteration,
                cell: f.cell + 1,
            },
            (Some(f), StepMode::Cell) => Frame { iteration: f.iteration + 1, cell: 0 },
            (Some(f), StepMode::Iteration) => Frame {
                iteration: f.iteration + 1,
                cell: last_cell,
            },
        };

        if next.iteration >= self.iterations {
            self.finish();
            return None;
        }
        if self.state == PlaybackState::Ready {
            self.state = PlaybackState::Paused;
        }
        self.position = Some(next);
        Some(next)
    }

    /// Reveal everything at once
    pub fn run_all(&mut self) {
        if self.iterations > 0 && self.cells > 0 {
            self.finish();
        }
    }

    pub fn reset(&mut self) {
        *self = Self::new(self.iterations, self.cells).with_mode(self.mode);
    }

    fn finish(&mut self) {
        self.position = Some(Frame {
            iteration: self.iterations - 1,
            cell: self.cells - 1,
        });
        self.state = PlaybackState::Complete;
    }

    /// Iterations whose every draw has been revealed
    pub fn completed_iterations(&self) -> usize {
        match self.position {
            None => 0,
            Some(f) if f.cell + 1 == self.cells => f.iteration + 1,
            Some(f) => f.iteration,
        }
    }

    /// Current record and its draws revealed so far
    pub fn current<'r>(
        &self,
        records: &'r [IterationRecord],
    ) -> Option<(&'r IterationRecord, &'r [SampledCell])> {
        let frame = self.position?;
        let record = records.get(frame.iteration)?;
        Some((record, record.revealed(frame.cell)))
    }

    /// Distribution over the completed iterations only
    pub fn revealed_distribution(&self, records: &[IterationRecord]) -> ReserveDistribution {
        ReserveDistribution::from_samples(
            records
                .iter()
                .take(self.completed_iterations())
                .map(|r| r.reserve),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bootstrap::{BootstrapConfig, BootstrapEngine};
    use crate::triangle::samples;

    #[test]
    fn test_cell_mode_walks_every_draw() {
        let mut cursor = ReplayCursor::new(2, 3);
        assert_eq!(cursor.state(), PlaybackState::Ready);

        let frames: Vec<Frame> = std::iter::from_fn(|| cursor.step()).collect();
        let expected: Vec<Frame> = (0..2)
            .flat_map(|iteration| (0..3).map(move |cell| Frame { iteration, cell }))
            .collect();
        assert_eq!(frames, expected);
        assert_eq!(cursor.state(), PlaybackState::Complete);
        assert_eq!(cursor.completed_iterations(), 2);
        assert_eq!(cursor.step(), None);
    }

    #[test]
    fn test_iteration_mode_and_mode_switch() {
        let mut cursor = ReplayCursor::new(3, 4).with_mode(StepMode::Iteration);
        assert_eq!(cursor.step(), Some(Frame { iteration: 0, cell: 3 }));
        assert_eq!(cursor.completed_iterations(), 1);

        cursor.set_mode(StepMode::Cell);
        assert_eq!(cursor.step(), Some(Frame { iteration: 1, cell: 0 }));
        assert_eq!(cursor.completed_iterations(), 1);

        cursor.set_mode(StepMode::Iteration);
        assert_eq!(cursor.step(), Some(Frame { iteration: 2, cell: 3 }));
        assert_eq!(cursor.step(), None);
        assert_eq!(cursor.state(), PlaybackState::Complete);
        assert_eq!(cursor.completed_iterations(), 3);
    }

    #[test]
    fn test_play_pause_toggle() {
        let mut cursor = ReplayCursor::new(1, 2);
        assert_eq!(cursor.tick(), None);

        cursor.toggle();
        assert_eq!(cursor.state(), PlaybackState::Playing);
        assert_eq!(cursor.tick(), Some(Frame { iteration: 0, cell: 0 }));

        cursor.pause();
        assert_eq!(cursor.state(), PlaybackState::Paused);
        assert_eq!(cursor.tick(), None);

        cursor.play();
        assert_eq!(cursor.tick(), Some(Frame { iteration: 0, cell: 1 }));
        assert_eq!(cursor.tick(), None);
        assert_eq!(cursor.state(), PlaybackState::Complete);

        cursor.play();
        assert_eq!(cursor.state(), PlaybackState::Complete);
    }

    #[test]
    fn test_run_all_and_reset() {
        let mut cursor = ReplayCursor::new(5, 10).with_mode(StepMode::Iteration);
        cursor.run_all();
        assert_eq!(cursor.state(), PlaybackState::Complete);
        assert_eq!(cursor.completed_iterations(), 5);

        cursor.reset();
        assert_eq!(cursor.state(), PlaybackState::Ready);
        assert_eq!(cursor.position(), None);
        assert_eq!(cursor.mode(), StepMode::Iteration);
        assert_eq!(cursor.completed_iterations(), 0);
    }

    #[test]
    fn test_empty_cursor_is_complete() {
        let mut cursor = ReplayCursor::for_records(&[]);
        assert_eq!(cursor.state(), PlaybackState::Complete);
        assert_eq!(cursor.step(), None);
        cursor.run_all();
        assert_eq!(cursor.position(), None);
    }

    #[test]
    fn test_replay_over_records() {
        let config = BootstrapConfig::default().with_iterations(3);
        let engine = BootstrapEngine::new(&samples::raa(), config).unwrap();
        let run = engine.run();
        let mut cursor = ReplayCursor::for_records(&run.records);
        assert_eq!(cursor.cells(), 55);

        for _ in 0..10 {
            cursor.step();
        }
        let (record, revealed) = cursor.current(&run.records).unwrap();
        assert_eq!(record.iteration, 0);
        assert_eq!(revealed, &record.samples[..10]);
        assert!(cursor.revealed_distribution(&run.records).is_empty());

        // jumping ahead counts the skipped iteration as completed
        cursor.set_mode(StepMode::Iteration);
        assert_eq!(cursor.step(), Some(Frame { iteration: 1, cell: 54 }));
        let partial = cursor.revealed_distribution(&run.records);
        assert_eq!(partial.samples(), &run.reserves()[..2]);
    }
}
