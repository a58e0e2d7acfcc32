mod entry_detail;
mod entry_list;
mod status;

pub use entry_list::EntryListView;
pub use status::StatusView;
