pub mod user;
pub mod department;
pub mod announcement;
pub mod attendance;

pub use user::*;
pub use department::*;
pub use announcement::*;
pub use attendance::*;
