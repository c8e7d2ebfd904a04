pub mod index_info;
pub mod load_index;
pub mod lookup;
pub mod search;

pub use index_info::*;
pub use load_index::*;
pub use lookup::*;
pub use search::*;
