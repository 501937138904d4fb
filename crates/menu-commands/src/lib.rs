//! # Menu Commands
//!
//! Turns an inbound SMS body into a [`Command`] and renders the text replies.
//!
//! Two commands are understood:
//! - `menu` lists every item
//! - `no: 1,2 address: 5 Oak St` orders items 1 and 2 for delivery to the address
//!
//! ```rust,ignore
//! use menu_commands::{parse, Command};
//!
//! assert_eq!(parse("MENU"), Command::ShowMenu);
//! ```

mod command;
mod format;

pub use command::{parse, parse_with, Command, OrderError, ParseMode};
pub use format::{
    capitalize_first, format_help, format_invalid_order, format_item, format_menu,
    format_order_confirmation, format_store_unavailable, order_total, ORDER_EXAMPLE,
};
