use super::{Dictionary, Object, ObjectId};

pub const TRAILER: &[u8] = b"trailer";
pub const K_SIZE: &[u8] = b"Size";
pub const K_PREVIOUS: &[u8] = b"Prev";
pub const K_ROOT: &[u8] = b"Root";
pub const K_INFO: &[u8] = b"Info";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TrailerError {
    InvalidSize,
    MissingSize,
    InvalidRoot,
    MissingRoot,
    InvalidPrevious,
    InvalidInfo,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Trailer {
    /// One more than the highest object number used in the PDF document
    pub size: usize,

    /// Byte offset to the previous xref section
    pub previous: Option<u64>,

    /// Reference to the catalog.
    pub root: ObjectId,

    /// Document information dictionary.
    pub info: Option<ObjectId>,
}

impl From<Trailer> for Dictionary {
    fn from(trailer: Trailer) -> Self {
        let mut dict = Dictionary::default();
        dict.insert(K_SIZE.into(), Object::from(trailer.size));
        dict.insert(K_ROOT.into(), Object::Reference(trailer.root));
        if let Some(info) = trailer.info {
            dict.insert(K_INFO.into(), Object::Reference(info));
        }
        if let Some(prev) = trailer.previous {
            dict.insert(K_PREVIOUS.into(), Object::Integer(prev as i64));
        }
        dict
    }
}

impl TryFrom<&Dictionary> for Trailer {
    type Error = TrailerError;

    fn try_from(dict: &Dictionary) -> Result<Self, Self::Error> {
        Ok(Trailer {
            size: dict
                .get(K_SIZE)
                .ok_or(TrailerError::MissingSize)?
                .integer()
                .ok_or(TrailerError::InvalidSize)?
                .try_into()
                .map_err(|_| TrailerError::InvalidSize)?,

            previous: dict
                .get(K_PREVIOUS)
                .map(|o| o.integer().ok_or(TrailerError::InvalidPrevious))
                .transpose()?
                .map(TryInto::try_into)
                .transpose()
                .map_err(|_| TrailerError::InvalidPrevious)?,

            root: dict
                .get(K_ROOT)
                .ok_or(TrailerError::MissingRoot)?
                .reference()
                .ok_or(TrailerError::InvalidRoot)?,

            info: dict
                .get(K_INFO)
                .map(|o| o.reference().ok_or(TrailerError::InvalidInfo))
                .transpose()?,
        })
    }
}

/// What an existing file tells us before new sections are appended to it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TrailerState {
    /// Offset of the xref section the last `startxref` points to.
    pub last_start_xref: u64,
    /// `/Size` of the last trailer.
    pub last_xref_size: usize,
    pub catalog: Option<ObjectId>,
    pub info: Option<ObjectId>,
    pub xmp: Option<ObjectId>,
    /// Set by the first update. Forces an xref section at close even if no
    /// object was written.
    pub can_update: bool,
}
