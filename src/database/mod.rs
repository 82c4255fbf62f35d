pub mod record;
pub mod store;

pub use record::PlateauMonitorRecord;
pub use store::{MySqlStore, RecordStore, StoreSession};
