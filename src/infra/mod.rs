pub mod fs_object_store;
pub mod sqlite_summary_store;

pub use fs_object_store::FsObjectStore;
pub use sqlite_summary_store::SqliteSummaryStore;
