mod form;
mod normalize;
mod types;

pub use form::{FILE_FIELDS, RawForm, UploadedFile};
pub use normalize::RequestNormalizer;
pub use types::*;
