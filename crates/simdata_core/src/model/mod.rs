mod cell;
mod index;
mod record;
mod summary;
mod table;
mod value;

pub use cell::Cell;
pub use index::{IndexLevel, OBJ_TYPE};
pub use record::{Entry, Log, OutputRecord, OutputRecordBuilder, Parameters, Variables};
pub use table::Table;
pub use value::{Value, ValueMap};
