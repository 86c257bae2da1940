pub mod content;
pub mod file;
pub mod quota;
pub mod share;
pub mod user;

pub use content::*;
pub use file::*;
pub use quota::*;
pub use share::*;
pub use user::*;
