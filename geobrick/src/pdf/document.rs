//! Keys and type names of the document level dictionaries.

pub(crate) const K_METADATA: &[u8] = b"Metadata";
pub(crate) const K_VP: &[u8] = b"VP";
pub(crate) const K_LGIDICT: &[u8] = b"LGIDict";

/// Dictionary type names
pub(crate) mod dict_types {
    pub const CATALOG: &str = "Catalog";
    pub const PAGES: &str = "Pages";
    pub const XOBJECT: &str = "XObject";
    pub const METADATA: &str = "Metadata";
    pub const OCG: &str = "OCG";
}
