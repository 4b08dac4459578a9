pub mod pdf;
pub mod util;
