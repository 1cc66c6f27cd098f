//! Controller Layer
//!
//! The item state controller and the pieces it is built from: the edit
//! session state machine and the shared visible-item list.

mod edit_session;
mod shared_list;
mod item_state;

pub use edit_session::EditSessionMachine;
pub use shared_list::{SharedItemList, VisibleItems, DEFAULT_GRACE};
pub use item_state::{ItemStateController, ItemStateError, ItemStateResult};
