use menu_store::MenuItem;
use rust_decimal::Decimal;

use crate::OrderError;

/// Literal example of the order command shown to customers.
pub const ORDER_EXAMPLE: &str = "no: 1,2,3 \n address: ...";

const USAGE_HEADER: &str = "To place order, use the format (e.g):";

/// `"<id>. <name> | $<price>"`
pub fn format_item(item: &MenuItem) -> String {
    format!("{}. {} | ${}", item.id, item.name, item.price)
}

fn item_lines(items: &[MenuItem]) -> Vec<String> {
    items.iter().map(format_item).collect()
}

fn usage() -> String {
    format!("{}\n{}", USAGE_HEADER, ORDER_EXAMPLE)
}

/// One line per item, blank line between items, then how to order.
///
/// The ordering instructions are always present, even for an empty menu.
pub fn format_menu(items: &[MenuItem]) -> String {
    let mut lines = if items.is_empty() {
        vec!["The menu is empty right now.".to_string()]
    } else {
        item_lines(items)
    };
    lines.push(usage());
    lines.join("\n\n")
}

/// Sum of the prices of the items that were found, or `None` if it overflows `Decimal`.
pub fn order_total(items: &[MenuItem]) -> Option<Decimal> {
    items
        .iter()
        .try_fold(Decimal::ZERO, |total, item| total.checked_add(item.price))
}

/// Item lines, total and address. `None` when the total cannot be represented.
pub fn format_order_confirmation(items: &[MenuItem], address: &str) -> Option<String> {
    let total = order_total(items)?;
    let mut lines = item_lines(items);
    lines.push(format!("Total: ${}", total));
    lines.push(format!("Address: {}", capitalize_first(address)));
    Some(lines.join("\n\n"))
}

pub fn format_help() -> String {
    "Invalid command sent.\n\nAvailable commands:\n1. menu".to_string()
}

pub fn format_invalid_order(error: &OrderError) -> String {
    format!(
        "Sorry, we could not read your order: {}.\n\n{}",
        error,
        usage()
    )
}

pub fn format_store_unavailable() -> String {
    "Sorry, our menu is unavailable right now. Please try again later.".to_string()
}

/// Upper-case only the first character; the rest is left as sent.
pub fn capitalize_first(text: &str) -> String {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
