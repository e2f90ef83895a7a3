//! Wrapping frame sequence counter.

/// A single byte counter written into every outbound frame.
///
/// `next` takes `&mut self`; sharing a counter between tasks means putting it
/// behind the same lock as the transport writer so a value is never reused.
#[derive(Debug, Clone, Default)]
pub struct SequenceCounter {
    next: u8,
}

impl SequenceCounter {
    /// Create a counter starting at 0.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a counter starting at `seed`.
    pub fn with_seed(seed: u8) -> Self {
        SequenceCounter { next: seed }
    }

    /// Return the current value and advance, wrapping after 255.
    pub fn next(&mut self) -> u8 {
        let value = self.next;
        self.next = self.next.wrapping_add(1);
        value
    }

    /// The value the next call to [`SequenceCounter::next`] will return.
    pub fn peek(&self) -> u8 {
        self.next
    }
}
