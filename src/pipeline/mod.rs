pub mod import;
pub mod structuring;
