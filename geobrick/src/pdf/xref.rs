use super::ObjectId;

/// Slot of the cross-reference table for one object number.
///
/// The offset stays `0` until the object body is written. An entry that is
/// neither written nor free has not been touched by the current section; in
/// incremental mode such entries are left out of the xref table.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct XrefEntry {
    /// The position of the `obj` line in bytes, starting from the beginning
    /// of the file.
    pub offset: u64,
    pub generation: u16,
    pub free: bool,
}

impl XrefEntry {
    /// Whether this entry belongs into the xref section written next.
    pub fn is_written(&self) -> bool {
        self.offset != 0 || self.free
    }
}

/// Hands out object numbers and keeps track of where each object lands in
/// the output.
///
/// Object numbers are 1-based, the entry for object `n` lives at index
/// `n - 1`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct XrefTable(Vec<XrefEntry>);

impl XrefTable {
    pub fn new() -> Self {
        Self(Vec::new())
    }

    /// Reserve the next object number.
    pub fn allocate(&mut self) -> ObjectId {
        self.0.push(XrefEntry::default());
        // object numbers are bounded by the 10 digit xref format long before u32 overflows
        ObjectId::new(self.0.len() as u32, 0)
    }

    /// Make sure at least `min_count` object numbers are known.
    pub fn resize(&mut self, min_count: usize) {
        if self.0.len() < min_count {
            self.0.resize(min_count, XrefEntry::default());
        }
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn entries(&self) -> &[XrefEntry] {
        &self.0[..]
    }

    /// Record the offset of an object that is about to be written.
    ///
    /// Panics if the object is unknown or was already written in this
    /// section.
    pub(crate) fn record(&mut self, id: ObjectId, offset: u64) {
        let entry = self
            .0
            .get_mut(id.index())
            .unwrap_or_else(|| panic!("object {} was never allocated", id));
        assert_eq!(entry.offset, 0, "object {} written twice", id);
        entry.offset = offset;
        entry.generation = id.generation;
    }

    /// Maximal runs of consecutive written entries, as `(first object number,
    /// entries)`.
    pub fn written_runs(&self) -> Vec<(u32, &[XrefEntry])> {
        let mut runs = Vec::new();
        let mut i = 0;
        while i < self.0.len() {
            if !self.0[i].is_written() {
                i += 1;
                continue;
            }
            let start = i;
            while i < self.0.len() && self.0[i].is_written() {
                i += 1;
            }
            runs.push((start as u32 + 1, &self.0[start..i]));
        }
        runs
    }

    /// Entries that were allocated but never received an offset.
    pub fn unwritten(&self) -> impl Iterator<Item = ObjectId> + '_ {
        self.0
            .iter()
            .enumerate()
            .filter(|(_, e)| !e.is_written())
            .map(|(i, e)| ObjectId::new(i as u32 + 1, e.generation))
    }
}
