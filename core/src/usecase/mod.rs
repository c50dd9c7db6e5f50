pub mod dispatch;

pub use dispatch::{Dispatcher, Intent, SUBMIT_DEBOUNCE};
