pub mod collection;
pub mod item;
pub mod search;
pub mod user;

pub use collection::*;
pub use item::*;
pub use search::*;
pub use user::*;
