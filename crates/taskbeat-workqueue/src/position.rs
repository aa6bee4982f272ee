//! Fixed-slot tracker.

use crate::error::QueueError;

/// One slot of a [`PositionQueue`].
#[derive(Debug, Clone, PartialEq)]
pub enum Slot<T> {
    Unfilled { position: usize },
    Filled(T),
}

impl<T> Slot<T> {
    pub fn is_filled(&self) -> bool {
        matches!(self, Slot::Filled(_))
    }
}

/// A fixed number of positions filled in arbitrary order.
///
/// `len()` counts filled slots only; the tracker is `full()` once every
/// position holds a value.
#[derive(Debug, Clone)]
pub struct PositionQueue<T> {
    length: usize,
    slots: Vec<Slot<T>>,
}

impl<T> PositionQueue<T> {
    pub fn new(length: usize) -> Self {
        Self {
            length,
            slots: (0..length).map(|position| Slot::Unfilled { position }).collect(),
        }
    }

    /// Total number of positions.
    pub fn length(&self) -> usize {
        self.length
    }

    /// Fill `position`, replacing any previous value.
    pub fn set(&mut self, position: usize, value: T) -> Result<(), QueueError> {
        let slot = self
            .slots
            .get_mut(position)
            .ok_or(QueueError::PositionOutOfRange {
                position,
                length: self.length,
            })?;
        *slot = Slot::Filled(value);
        Ok(())
    }

    pub fn get(&self, position: usize) -> Option<&T> {
        match self.slots.get(position) {
            Some(Slot::Filled(value)) => Some(value),
            _ => None,
        }
    }

    /// Filled values in position order.
    pub fn filled(&self) -> Vec<&T> {
        self.slots
            .iter()
            .filter_map(|slot| match slot {
                Slot::Filled(value) => Some(value),
                Slot::Unfilled { .. } => None,
            })
            .collect()
    }

    /// Number of filled slots.
    pub fn len(&self) -> usize {
        self.slots.iter().filter(|s| s.is_filled()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn full(&self) -> bool {
        self.len() == self.length
    }

    pub fn slots(&self) -> &[Slot<T>] {
        &self.slots
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_is_unfilled() {
        let queue: PositionQueue<u32> = PositionQueue::new(3);
        assert_eq!(queue.length(), 3);
        assert_eq!(queue.len(), 0);
        assert!(queue.is_empty());
        assert!(!queue.full());
        assert_eq!(queue.slots()[2], Slot::Unfilled { position: 2 });
    }

    #[test]
    fn test_fill_out_of_order() {
        let mut queue = PositionQueue::new(3);
        queue.set(2, "c").unwrap();
        queue.set(0, "a").unwrap();

        assert_eq!(queue.len(), 2);
        assert!(!queue.full());
        assert_eq!(queue.filled(), vec![&"a", &"c"]);
        assert!(queue.get(1).is_none());

        queue.set(1, "b").unwrap();
        assert!(queue.full());
        assert_eq!(queue.filled(), vec![&"a", &"b", &"c"]);
    }

    #[test]
    fn test_overwrite_keeps_count() {
        let mut queue = PositionQueue::new(2);
        queue.set(0, 1).unwrap();
        queue.set(0, 2).unwrap();

        assert_eq!(queue.len(), 1);
        assert_eq!(queue.get(0), Some(&2));
    }

    #[test]
    fn test_out_of_range() {
        let mut queue = PositionQueue::new(2);
        let err = queue.set(2, ()).unwrap_err();
        assert!(matches!(
            err,
            QueueError::PositionOutOfRange {
                position: 2,
                length: 2
            }
        ));
        assert!(queue.is_empty());
    }

    #[test]
    fn test_zero_length_is_full() {
        let queue: PositionQueue<()> = PositionQueue::new(0);
        assert!(queue.full());
        assert!(queue.filled().is_empty());
    }
}
