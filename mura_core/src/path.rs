//! Bounded, arrival-ordered position history.

use crate::position::Position;
use std::collections::VecDeque;

/// Default history window, matching the remote query limit.
pub const DEFAULT_MAX_PATH_LEN: usize = 500;

/// The polyline history of accepted positions.
///
/// Order is arrival order, never timestamp order. Once `max_len` is reached
/// each push evicts the oldest entry.
#[derive(Debug, Clone, PartialEq)]
pub struct Path {
    points: VecDeque<Position>,
    max_len: usize,
}

impl Path {
    /// Creates an empty path holding at most `max_len` points (minimum 1).
    pub fn new(max_len: usize) -> Self {
        let max_len = max_len.max(1);
        Self {
            points: VecDeque::with_capacity(max_len.min(DEFAULT_MAX_PATH_LEN)),
            max_len,
        }
    }

    /// Appends a point, returning the evicted one if the cap was hit.
    pub fn push(&mut self, position: Position) -> Option<Position> {
        let evicted = if self.points.len() >= self.max_len {
            self.points.pop_front()
        } else {
            None
        };
        self.points.push_back(position);
        evicted
    }

    /// Replaces the whole history. Keeps the newest `max_len` points.
    pub fn replace<I>(&mut self, positions: I)
    where
        I: IntoIterator<Item = Position>,
    {
        self.points.clear();
        for p in positions {
            self.push(p);
        }
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn max_len(&self) -> usize {
        self.max_len
    }

    /// Most recently appended point.
    pub fn last(&self) -> Option<&Position> {
        self.points.back()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Position> {
        self.points.iter()
    }

    /// Copies the path out, oldest first.
    pub fn to_vec(&self) -> Vec<Position> {
        self.points.iter().copied().collect()
    }
}

impl Default for Path {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_PATH_LEN)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn p(i: usize) -> Position {
        Position::BOGOTA.offset(i as f64 * 1e-5, 0.0)
    }

    #[test]
    fn test_push_evicts_oldest() {
        let mut path = Path::new(3);
        assert_eq!(path.push(p(0)), None);
        assert_eq!(path.push(p(1)), None);
        assert_eq!(path.push(p(2)), None);
        assert_eq!(path.push(p(3)), Some(p(0)));

        assert_eq!(path.to_vec(), vec![p(1), p(2), p(3)]);
        assert_eq!(path.last(), Some(&p(3)));
    }

    #[test]
    fn test_replace_keeps_newest_window() {
        let mut path = Path::new(2);
        path.push(p(9));
        path.replace((0..5).map(p));
        assert_eq!(path.to_vec(), vec![p(3), p(4)]);

        path.replace(std::iter::empty());
        assert!(path.is_empty());
    }

    #[test]
    fn test_zero_cap_is_raised_to_one() {
        let mut path = Path::new(0);
        path.push(p(0));
        path.push(p(1));
        assert_eq!(path.max_len(), 1);
        assert_eq!(path.to_vec(), vec![p(1)]);
    }
}
