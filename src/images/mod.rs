pub mod form;
pub mod services;

pub use form::FormData;
pub use services::{check_media_type, discard_image, upload_image, UploadItem};
