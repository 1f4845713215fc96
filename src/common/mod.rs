pub use content_type::ContentType;
pub use limits::Config as LimitsConfig;
pub use method::Method;
pub use status_code::StatusCode;

mod content_type;
pub mod limits;
mod method;
mod status_code;
