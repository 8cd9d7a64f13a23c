//! Builds access-restricted paginated documents from episode page images.
//!
//! Pure transform: no blob store or repository knowledge, independently
//! testable without network dependencies.

mod builder;

pub use builder::{build_document, PAGE_WIDTH_PT};

/// One raw page image as extracted from an archive. The filename is the
/// path of the image within its episode directory and is the sole input
/// to page ordering.
#[derive(Debug, Clone)]
pub struct PageImage {
    pub filename: String,
    pub bytes: Vec<u8>,
}

/// Access restrictions applied to every built document: a required open
/// password, a separate owner credential, and no print/modify/extract
/// permissions.
#[derive(Debug, Clone)]
pub struct AccessRestrictions {
    pub open_password: String,
    pub owner_password: String,
}

impl AccessRestrictions {
    pub fn new(open_password: impl Into<String>, owner_password: impl Into<String>) -> Self {
        Self {
            open_password: open_password.into(),
            owner_password: owner_password.into(),
        }
    }
}

/// A finished document artifact.
#[derive(Debug)]
pub struct BuiltDocument {
    pub bytes: Vec<u8>,
    pub page_count: usize,
}
