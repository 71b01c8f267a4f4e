pub mod retry;
pub mod text;

pub use retry::RetryPolicy;
pub use text::truncate_chars;
