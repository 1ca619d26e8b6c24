//! Global numbering of continuous and switching inputs
//!
//! The final symbolic model labels its transitions with ids from a single
//! contiguous range `1..=n`. The range is partitioned into a continuous
//! part and a switching part, continuous first:
//!
//! 1. ascending over the modes, every mode receives a contiguous block of
//!    ids, one per local input of its symbolic dynamics
//! 2. ascending over the hybrid automaton's transition list, every
//!    switching transition receives the next id after the last continuous
//!    one
//!
//! [`GlobalInputMap`] records both phases and answers forward and inverse
//! queries in constant time; classification is a range check plus a
//! partition point over the monotone block-offset table.

use std::collections::HashMap;
use std::fmt;
use std::ops::RangeInclusive;

/// Classification of a global input id
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InputClass {
    /// A continuous control of one mode
    Continuous {
        /// Mode the input belongs to
        mode: usize,
        /// Local input symbol within the mode
        local: usize,
    },
    /// A switching event
    Switching {
        /// Id of the hybrid transition
        transition: u32,
    },
    /// Outside both ranges
    Invalid,
}

impl fmt::Display for InputClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InputClass::Continuous { mode, local } => {
                write!(f, "continuous input {local} of mode {mode}")
            }
            InputClass::Switching { transition } => {
                write!(f, "switching transition {transition}")
            }
            InputClass::Invalid => write!(f, "invalid input"),
        }
    }
}

/// Bijective numbering of all inputs of a timed hybrid symbolic model
#[derive(Debug, Clone, PartialEq)]
pub struct GlobalInputMap {
    /// Ids allocated before each mode's block
    block_offsets: Vec<usize>,
    /// Block length per mode
    block_sizes: Vec<usize>,
    n_continuous: usize,
    /// Hybrid transition ids in enumeration order
    switching: Vec<u32>,
    /// Inverse of `switching`
    switching_pos: HashMap<u32, usize>,
    /// One label per switching position
    labels: Vec<String>,
}

impl GlobalInputMap {
    /// Allocate global ids for the given per-mode input counts and hybrid
    /// transitions
    ///
    /// `mode_input_counts[k - 1]` is the number of local inputs of mode
    /// `k`; `switching` yields `(transition_id, source_mode, target_mode)`
    /// in the automaton's enumeration order.
    pub fn new(
        mode_input_counts: &[usize],
        switching: impl IntoIterator<Item = (u32, usize, usize)>,
    ) -> Self {
        let mut block_offsets = Vec::with_capacity(mode_input_counts.len());
        let mut allocated = 0;
        for &count in mode_input_counts {
            block_offsets.push(allocated);
            allocated += count;
        }

        let mut transitions = Vec::new();
        let mut switching_pos = HashMap::new();
        let mut labels = Vec::new();
        for (id, source, target) in switching {
            switching_pos.insert(id, transitions.len());
            labels.push(format!("SWITCH {source} -> {target}"));
            transitions.push(id);
        }

        GlobalInputMap {
            block_offsets,
            block_sizes: mode_input_counts.to_vec(),
            n_continuous: allocated,
            switching: transitions,
            switching_pos,
            labels,
        }
    }

    /// Total number of global input ids
    pub fn n_inputs(&self) -> usize {
        self.n_continuous + self.switching.len()
    }

    /// Number of continuous global input ids
    pub fn n_continuous(&self) -> usize {
        self.n_continuous
    }

    /// Number of switching global input ids
    pub fn n_switching(&self) -> usize {
        self.switching.len()
    }

    /// The contiguous range of continuous ids
    pub fn continuous_range(&self) -> RangeInclusive<usize> {
        1..=self.n_continuous
    }

    /// The contiguous range of switching ids
    pub fn switching_range(&self) -> RangeInclusive<usize> {
        self.n_continuous + 1..=self.n_inputs()
    }

    /// Global id of a mode's local input, if both exist
    pub fn continuous_id(&self, mode: usize, local: usize) -> Option<usize> {
        if mode == 0 || mode > self.block_sizes.len() {
            return None;
        }
        if local == 0 || local > self.block_sizes[mode - 1] {
            return None;
        }

        Some(self.block_offsets[mode - 1] + local)
    }

    /// Global id of a hybrid transition, if it exists
    pub fn switching_id(&self, transition: u32) -> Option<usize> {
        self.switching_pos
            .get(&transition)
            .map(|pos| self.n_continuous + pos + 1)
    }

    /// Classify a global input id by range membership
    ///
    /// The owning mode of a continuous id is the last block starting
    /// below it; `block_offsets` is monotone, so a partition point over
    /// it resolves the block without scanning.
    pub fn classify(&self, id: usize) -> InputClass {
        if id == 0 || id > self.n_inputs() {
            return InputClass::Invalid;
        }

        if id <= self.n_continuous {
            let mode = self.block_offsets.partition_point(|&offset| offset < id);
            return InputClass::Continuous {
                mode,
                local: id - self.block_offsets[mode - 1],
            };
        }

        InputClass::Switching {
            transition: self.switching[id - self.n_continuous - 1],
        }
    }

    /// Check whether the id names a continuous input
    pub fn is_continuous(&self, id: usize) -> bool {
        id >= 1 && id <= self.n_continuous
    }

    /// Check whether the id names a switching event
    pub fn is_switching(&self, id: usize) -> bool {
        id > self.n_continuous && id <= self.n_inputs()
    }

    /// Human-readable label of a switching id
    pub fn switching_label(&self, id: usize) -> Option<&str> {
        if !self.is_switching(id) {
            return None;
        }
        Some(self.labels[id - self.n_continuous - 1].as_str())
    }
}

impl fmt::Display for GlobalInputMap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} inputs ({} continuous, {} switching)",
            self.n_inputs(),
            self.n_continuous(),
            self.n_switching()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Three modes with 2, 3 and 2 inputs plus four switching transitions
    fn example_map() -> GlobalInputMap {
        GlobalInputMap::new(&[2, 3, 2], [(1, 1, 2), (2, 2, 3), (3, 3, 1), (4, 1, 3)])
    }

    #[test]
    fn test_range_partition() {
        let map = example_map();

        assert_eq!(map.n_inputs(), 11);
        assert_eq!(map.n_continuous(), 7);
        assert_eq!(map.n_switching(), 4);
        assert_eq!(map.continuous_range(), 1..=7);
        assert_eq!(map.switching_range(), 8..=11);
    }

    #[test]
    fn test_continuous_phase_is_mode_ascending() {
        let map = example_map();

        assert_eq!(map.continuous_id(1, 1), Some(1));
        assert_eq!(map.continuous_id(1, 2), Some(2));
        assert_eq!(map.continuous_id(2, 1), Some(3));
        assert_eq!(map.continuous_id(2, 3), Some(5));
        assert_eq!(map.continuous_id(3, 1), Some(6));
        assert_eq!(map.continuous_id(3, 2), Some(7));

        assert_eq!(map.continuous_id(1, 3), None);
        assert_eq!(map.continuous_id(4, 1), None);
        assert_eq!(map.continuous_id(0, 1), None);
        assert_eq!(map.continuous_id(1, 0), None);
    }

    #[test]
    fn test_switching_phase_follows_enumeration_order() {
        let map = example_map();

        assert_eq!(map.switching_id(1), Some(8));
        assert_eq!(map.switching_id(2), Some(9));
        assert_eq!(map.switching_id(3), Some(10));
        assert_eq!(map.switching_id(4), Some(11));
        assert_eq!(map.switching_id(9), None);
    }

    #[test]
    fn test_classification_inverts_allocation() {
        let map = example_map();

        for id in map.continuous_range() {
            match map.classify(id) {
                InputClass::Continuous { mode, local } => {
                    assert_eq!(map.continuous_id(mode, local), Some(id));
                }
                other => panic!("Id {id} classified as {other}"),
            }
            assert!(map.is_continuous(id));
            assert!(!map.is_switching(id));
        }

        for id in map.switching_range() {
            match map.classify(id) {
                InputClass::Switching { transition } => {
                    assert_eq!(map.switching_id(transition), Some(id));
                }
                other => panic!("Id {id} classified as {other}"),
            }
            assert!(map.is_switching(id));
            assert!(!map.is_continuous(id));
        }

        assert_eq!(map.classify(0), InputClass::Invalid);
        assert_eq!(map.classify(12), InputClass::Invalid);
    }

    #[test]
    fn test_switching_labels() {
        let map = example_map();

        assert_eq!(map.switching_label(8), Some("SWITCH 1 -> 2"));
        assert_eq!(map.switching_label(11), Some("SWITCH 1 -> 3"));
        assert_eq!(map.switching_label(7), None);
        assert_eq!(map.switching_label(12), None);
    }

    #[test]
    fn test_modes_without_inputs_get_empty_blocks() {
        let map = GlobalInputMap::new(&[2, 0, 1], []);

        assert_eq!(map.n_inputs(), 3);
        assert_eq!(map.continuous_id(2, 1), None);
        assert_eq!(map.continuous_id(3, 1), Some(3));
        assert_eq!(
            map.classify(3),
            InputClass::Continuous { mode: 3, local: 1 }
        );
        assert!(map.switching_range().is_empty());
    }
}
