//! Bounded store of frames that triggered an alert

use std::collections::VecDeque;

/// Most recent alert frames across the whole run, oldest evicted first
#[derive(Debug, Clone)]
pub struct EvidenceBuffer<F> {
    frames: VecDeque<F>,
    capacity: usize,
}

impl<F> EvidenceBuffer<F> {
    pub fn new(capacity: usize) -> Self {
        Self { frames: VecDeque::with_capacity(capacity), capacity }
    }

    pub fn push(&mut self, frame: F) {
        self.frames.push_back(frame);
        while self.frames.len() > self.capacity {
            self.frames.pop_front();
        }
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Oldest to newest
    pub fn iter(&self) -> impl Iterator<Item = &F> {
        self.frames.iter()
    }

    pub fn latest(&self) -> Option<&F> {
        self.frames.back()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_fourth_push_evicts_first() {
        let mut buffer = EvidenceBuffer::new(3);
        for trigger in 1..=4 {
            buffer.push(trigger);
        }
        assert_eq!(buffer.iter().copied().collect::<Vec<_>>(), vec![2, 3, 4]);
        assert_eq!(buffer.latest(), Some(&4));
    }

    #[test]
    fn test_empty_buffer() {
        let buffer: EvidenceBuffer<u8> = EvidenceBuffer::new(3);
        assert!(buffer.is_empty());
        assert_eq!(buffer.capacity(), 3);
        assert!(buffer.latest().is_none());
    }

    proptest! {
        #[test]
        fn prop_never_exceeds_capacity(capacity in 1usize..8, pushes in 0usize..64) {
            let mut buffer = EvidenceBuffer::new(capacity);
            for i in 0..pushes {
                buffer.push(i);
                prop_assert!(buffer.len() <= capacity);
            }
            let kept: Vec<usize> = buffer.iter().copied().collect();
            let expected: Vec<usize> = (pushes.saturating_sub(capacity)..pushes).collect();
            prop_assert_eq!(kept, expected);
        }
    }
}
