pub mod document;
pub mod session;

pub use document::{Document, DocumentFile, FormField, NewDocument, NumericField, FORM_FIELDS};
pub use session::{AdminSession, PortalSession};
