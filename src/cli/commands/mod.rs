//! CLI command implementations.

mod ocr;
mod recognize;
mod status;

pub use ocr::cmd_ocr;
pub use recognize::cmd_recognize;
pub use status::cmd_check_config;
