//! Page model and the widgets patched into it

pub mod message_log;
pub mod page;
