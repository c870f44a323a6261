use std::fmt;

/// A single slot of a [`PinEntry`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PinDigit {
    Empty,
    Filled(char),
}

impl PinDigit {
    pub fn to_char(self) -> Option<char> {
        match self {
            PinDigit::Empty => None,
            PinDigit::Filled(c) => Some(c),
        }
    }

    pub fn is_filled(self) -> bool {
        matches!(self, PinDigit::Filled(_))
    }
}

/// Fixed-length digit buffer backing the PIN entry UI.
///
/// The length is fixed at construction and never changes. Every edit
/// returns a new value, so a stale reference held by a rendering pass
/// never observes a half-applied edit, and the type is safe to share
/// across threads.
#[derive(Clone, PartialEq, Eq)]
pub struct PinEntry {
    digits: Vec<PinDigit>,
}

impl PinEntry {
    /// Create an entry of `size` empty slots. `size` must be positive.
    pub fn empty(size: usize) -> Self {
        assert!(size > 0, "pin entry size must be positive");
        Self {
            digits: vec![PinDigit::Empty; size],
        }
    }

    pub fn size(&self) -> usize {
        self.digits.len()
    }

    pub fn digits(&self) -> &[PinDigit] {
        &self.digits
    }

    /// Rebuild the entry from `text`, mapping character positions to slots.
    ///
    /// A non-digit character leaves its slot empty instead of shifting later
    /// digits left: filtering is per index, not a compacting re-pack.
    /// Characters past the entry size are ignored.
    pub fn fill_with(&self, text: &str) -> Self {
        let mut digits = vec![PinDigit::Empty; self.digits.len()];
        for (i, c) in text.chars().take(self.digits.len()).enumerate() {
            if c.is_ascii_digit() {
                digits[i] = PinDigit::Filled(c);
            }
        }
        Self { digits }
    }

    /// Fill the first empty slot with `c`. No-op when the entry is already
    /// complete or `c` is not an ASCII digit.
    pub fn add_digit(&self, c: char) -> Self {
        if !c.is_ascii_digit() || self.is_complete() {
            return self.clone();
        }
        let mut digits = self.digits.clone();
        if let Some(slot) = digits.iter_mut().find(|d| !d.is_filled()) {
            *slot = PinDigit::Filled(c);
        }
        Self { digits }
    }

    /// Clear the rightmost filled slot. No-op when the entry is empty.
    pub fn delete_last(&self) -> Self {
        let mut digits = self.digits.clone();
        if let Some(slot) = digits.iter_mut().rev().find(|d| d.is_filled()) {
            *slot = PinDigit::Empty;
        }
        Self { digits }
    }

    /// Reset every slot to empty.
    pub fn clear(&self) -> Self {
        Self::empty(self.digits.len())
    }

    pub fn is_complete(&self) -> bool {
        self.digits.iter().all(|d| d.is_filled())
    }

    pub fn is_empty(&self) -> bool {
        self.digits.iter().all(|d| !d.is_filled())
    }

    /// Concatenation of the filled slots, in order. A partially filled
    /// entry yields a string shorter than `size`.
    pub fn to_text(&self) -> String {
        self.digits.iter().filter_map(|d| d.to_char()).collect()
    }
}

impl fmt::Debug for PinEntry {
    // Never print the digits themselves.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let filled = self.digits.iter().filter(|d| d.is_filled()).count();
        write!(f, "PinEntry({}/{})", filled, self.digits.len())
    }
}
