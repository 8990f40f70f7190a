//! Scope frames for composites the decoder has entered.

use crate::codec::tag::Type;
use crate::error::BipfError;

/// An entered Array or Object: where its payload starts and how long it is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Frame {
    pub ty: Type,
    pub start: u64,
    pub len: u64,
}

impl Frame {
    /// Offset one past the last payload byte. Sibling scans stop here.
    pub fn end(&self) -> u64 {
        self.start + self.len
    }
}

/// Stack of entered scopes, innermost last.
#[derive(Debug, Clone)]
pub struct ScopeStack {
    frames: Vec<Frame>,
    max_depth: usize,
}

impl ScopeStack {
    pub fn new(max_depth: usize) -> Self {
        Self {
            frames: Vec::new(),
            max_depth,
        }
    }

    /// Pushes a frame, failing once `max_depth` frames are open.
    pub fn push(&mut self, frame: Frame) -> Result<(), BipfError> {
        if self.frames.len() >= self.max_depth {
            return Err(BipfError::DepthLimit(self.max_depth));
        }
        self.frames.push(frame);
        Ok(())
    }

    pub fn pop(&mut self) -> Option<Frame> {
        self.frames.pop()
    }

    pub fn top(&self) -> Option<&Frame> {
        self.frames.last()
    }

    pub fn depth(&self) -> usize {
        self.frames.len()
    }

    /// End of the innermost scope, or `outer` at top level.
    pub fn boundary(&self, outer: u64) -> u64 {
        self.top().map_or(outer, Frame::end)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame(start: u64, len: u64) -> Frame {
        Frame {
            ty: Type::Array,
            start,
            len,
        }
    }

    #[test]
    fn boundary_tracks_innermost_frame() {
        let mut stack = ScopeStack::new(8);
        assert_eq!(stack.boundary(100), 100);

        stack.push(frame(2, 50)).unwrap();
        assert_eq!(stack.boundary(100), 52);

        stack.push(frame(10, 5)).unwrap();
        assert_eq!(stack.boundary(100), 15);
        assert_eq!(stack.depth(), 2);

        assert_eq!(stack.pop(), Some(frame(10, 5)));
        assert_eq!(stack.boundary(100), 52);
    }

    #[test]
    fn depth_limit() {
        let mut stack = ScopeStack::new(2);
        stack.push(frame(0, 10)).unwrap();
        stack.push(frame(1, 5)).unwrap();
        assert!(matches!(
            stack.push(frame(2, 1)),
            Err(BipfError::DepthLimit(2))
        ));
        assert_eq!(stack.depth(), 2);
    }
}
