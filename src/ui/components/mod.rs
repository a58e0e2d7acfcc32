mod category_picker;
mod input;
mod key_result;
mod search_input;

pub use category_picker::{CategoryEvent, CategoryPicker};
pub use key_result::KeyResult;
pub use search_input::{SearchEvent, SearchInput};
