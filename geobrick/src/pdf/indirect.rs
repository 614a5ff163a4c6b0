use std::fmt::Display;

/// Identifies an indirect object: `(number, generation)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObjectId {
    pub number: u32,
    pub generation: u16,
}

impl ObjectId {
    pub const fn new(number: u32, generation: u16) -> Self {
        Self { number, generation }
    }

    /// Index of this object inside the xref entry table.
    pub(crate) fn index(&self) -> usize {
        self.number as usize - 1
    }
}

impl From<u32> for ObjectId {
    fn from(number: u32) -> Self {
        Self::new(number, 0)
    }
}

impl Display for ObjectId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {} R", self.number, self.generation)
    }
}
