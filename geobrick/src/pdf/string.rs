use std::ops::Deref;

/// PDF string. Holds either raw bytes or text; text with characters outside
/// of ASCII is encoded as UTF-16BE when serialized.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct PdfString(Vec<u8>);

impl PdfString {
    pub fn is_ascii(&self) -> bool {
        self.0.is_ascii()
    }
}

impl From<Vec<u8>> for PdfString {
    fn from(v: Vec<u8>) -> Self {
        PdfString(v)
    }
}

impl From<&str> for PdfString {
    fn from(v: &str) -> Self {
        PdfString(v.as_bytes().to_vec())
    }
}

impl Deref for PdfString {
    type Target = Vec<u8>;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl std::fmt::Debug for PdfString {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("PdfString")
            .field(&String::from_utf8_lossy(&self.0[..]))
            .finish()
    }
}

impl std::fmt::Display for PdfString {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", &String::from_utf8_lossy(&self.0[..]))
    }
}
