use super::context::{BlendMode, ProgramHandle};
use super::texture::TextureId;


/// The render state a quad needs: texture, blend mode and resolved program.
/// Two consecutive quads share a draw call exactly when their states are equal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BatchState {
    pub texture: TextureId,
    pub blend_mode: BlendMode,
    pub program: ProgramHandle,
}

/// A maximal range of consecutive slots sharing one [`BatchState`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Run {
    pub start: usize,
    pub size: usize,
    pub state: BatchState,
}
impl Run {
    pub fn end(&self) -> usize {
        self.start + self.size
    }
}


/// Splits `states` into runs, in submission order.
pub fn runs(states: &[BatchState]) -> Runs<'_> {
    Runs { states, cursor: 0 }
}

/// Iterator returned by [`runs`].
#[derive(Debug, Clone)]
pub struct Runs<'a> {
    states: &'a [BatchState],
    cursor: usize,
}
impl<'a> Iterator for Runs<'a> {
    type Item = Run;

    fn next(&mut self) -> Option<Run> {
        let start = self.cursor;
        let state = *self.states.get(start)?;
        let size = self.states[start..]
            .iter()
            .take_while(|other| **other == state)
            .count();
        self.cursor += size;
        Some(Run { start, size, state })
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    fn state(texture: u64, blend_mode: BlendMode, program: u32) -> BatchState {
        BatchState {
            texture: TextureId(texture),
            blend_mode,
            program: ProgramHandle(program),
        }
    }

    #[test]
    fn empty_has_no_runs() {
        assert_eq!(runs(&[]).count(), 0);
    }

    #[test]
    fn same_state_is_one_run() {
        let states = vec![state(1, BlendMode::Normal, 1); 50];
        let all: Vec<_> = runs(&states).collect();
        assert_eq!(all, vec![Run { start: 0, size: 50, state: states[0] }]);
    }

    #[test]
    fn each_field_splits_a_run() {
        let states = [
            state(1, BlendMode::Normal, 1),
            state(1, BlendMode::Normal, 1),
            state(2, BlendMode::Normal, 1),
            state(2, BlendMode::Add, 1),
            state(2, BlendMode::Add, 7),
            state(2, BlendMode::Add, 7),
            state(1, BlendMode::Normal, 1),
        ];
        let sizes: Vec<_> = runs(&states).map(|r| (r.start, r.size)).collect();
        assert_eq!(sizes, vec![(0, 2), (2, 1), (3, 1), (4, 2), (6, 1)]);
    }

    #[test]
    fn runs_tile_the_range() {
        let states: Vec<_> = (0..97u64).map(|i| state(i / 10 % 3, BlendMode::Normal, 0)).collect();
        let mut expected_start = 0;
        for run in runs(&states) {
            assert_eq!(run.start, expected_start);
            assert!(run.size > 0);
            assert!(states[run.start..run.end()].iter().all(|s| *s == run.state));
            expected_start = run.end();
        }
        assert_eq!(expected_start, states.len());
    }
}
