use serde::{Deserialize, Serialize};

const MENU: &str = "menu";
const ORDER_MARKER: &str = "no:";
const ADDRESS_MARKER: &str = "address:";
const ADDRESS_WORD: &str = "address";

/// What an inbound SMS asks for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    ShowMenu,
    PlaceOrder { item_ids: Vec<i64>, address: String },
    /// Started like an order but could not be read as one.
    InvalidOrder { raw_body: String, error: OrderError },
    Unknown { raw_body: String },
}

impl Command {
    /// Short label for logs.
    pub fn name(&self) -> &'static str {
        match self {
            Command::ShowMenu => "show_menu",
            Command::PlaceOrder { .. } => "place_order",
            Command::InvalidOrder { .. } => "invalid_order",
            Command::Unknown { .. } => "unknown",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum OrderError {
    #[error("the \"address:\" part is missing")]
    MissingAddress,
    #[error("the address is empty")]
    EmptyAddress,
    #[error("{0:?} is not an item number")]
    InvalidItemId(String),
    #[error("no item numbers were given")]
    NoItems,
}

/// How forgiving the order parser is.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParseMode {
    /// `no: <ids> address: <text>` with comma separated numeric ids; any bad id rejects the order.
    #[default]
    Strict,
    /// Ids may be separated by commas or spaces and bad ids are dropped; the address
    /// marker may be written `address`, `address -`, `address=` and so on.
    Permissive,
}

/// Classify `body` with [`ParseMode::Strict`].
pub fn parse(body: &str) -> Command {
    parse_with(body, ParseMode::Strict)
}

/// Classify `body`. Keywords are matched ignoring ASCII case and surrounding whitespace;
/// the address keeps the case it was sent with.
pub fn parse_with(body: &str, mode: ParseMode) -> Command {
    let trimmed = body.trim();

    if trimmed.eq_ignore_ascii_case(MENU) {
        return Command::ShowMenu;
    }

    if let Some(rest) = strip_prefix_ignore_ascii_case(trimmed, ORDER_MARKER) {
        return match parse_order(rest, mode) {
            Ok((item_ids, address)) => Command::PlaceOrder { item_ids, address },
            Err(error) => Command::InvalidOrder {
                raw_body: body.to_string(),
                error,
            },
        };
    }

    Command::Unknown {
        raw_body: body.to_string(),
    }
}

fn parse_order(rest: &str, mode: ParseMode) -> Result<(Vec<i64>, String), OrderError> {
    let (ids_text, address) = match mode {
        ParseMode::Strict => {
            let at = find_ignore_ascii_case(rest, ADDRESS_MARKER).ok_or(OrderError::MissingAddress)?;
            (&rest[..at], &rest[at + ADDRESS_MARKER.len()..])
        }
        ParseMode::Permissive => {
            let at = find_ignore_ascii_case(rest, ADDRESS_WORD).ok_or(OrderError::MissingAddress)?;
            let after = rest[at + ADDRESS_WORD.len()..]
                .trim_start_matches(|c: char| matches!(c, ':' | '-' | '=') || c.is_whitespace());
            (&rest[..at], after)
        }
    };

    let address = address.trim();
    if address.is_empty() {
        return Err(OrderError::EmptyAddress);
    }

    let item_ids = match mode {
        ParseMode::Strict => strict_ids(ids_text)?,
        ParseMode::Permissive => permissive_ids(ids_text),
    };
    if item_ids.is_empty() {
        return Err(OrderError::NoItems);
    }

    Ok((item_ids, address.to_string()))
}

fn strict_ids(text: &str) -> Result<Vec<i64>, OrderError> {
    if text.trim().is_empty() {
        return Ok(Vec::new());
    }
    text.split(',')
        .map(str::trim)
        .map(|token| {
            token
                .parse::<i64>()
                .map_err(|_| OrderError::InvalidItemId(token.to_string()))
        })
        .collect()
}

fn permissive_ids(text: &str) -> Vec<i64> {
    text.split(|c: char| c == ',' || c.is_whitespace())
        .filter_map(|token| token.parse::<i64>().ok())
        .collect()
}

fn strip_prefix_ignore_ascii_case<'a>(s: &'a str, prefix: &str) -> Option<&'a str> {
    let head = s.as_bytes().get(..prefix.len())?;
    // prefix is ASCII, so a match ends on a char boundary
    head.eq_ignore_ascii_case(prefix.as_bytes())
        .then(|| &s[prefix.len()..])
}

fn find_ignore_ascii_case(haystack: &str, needle: &str) -> Option<usize> {
    haystack
        .as_bytes()
        .windows(needle.len())
        .position(|window| window.eq_ignore_ascii_case(needle.as_bytes()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn order(ids: &[i64], address: &str) -> Command {
        Command::PlaceOrder {
            item_ids: ids.to_vec(),
            address: address.to_string(),
        }
    }

    fn invalid(body: &str, error: OrderError) -> Command {
        Command::InvalidOrder {
            raw_body: body.to_string(),
            error,
        }
    }

    #[test]
    fn menu_is_case_insensitive() {
        for body in ["menu", "Menu", "MENU", "mEnU"] {
            assert_eq!(parse(body), Command::ShowMenu, "{body}");
        }
    }

    #[test]
    fn menu_tolerates_surrounding_whitespace() {
        assert_eq!(parse("  menu\n"), Command::ShowMenu);
    }

    #[test]
    fn menu_must_be_the_whole_body() {
        assert_eq!(
            parse("menu please"),
            Command::Unknown {
                raw_body: "menu please".into()
            }
        );
    }

    #[test]
    fn parses_order() {
        assert_eq!(parse("no: 1,2 address: 5 Oak St"), order(&[1, 2], "5 Oak St"));
    }

    #[test]
    fn order_keywords_ignore_case_but_address_keeps_it() {
        assert_eq!(
            parse("NO: 3 , 1 ADDRESS: 12 Marina Road, Lagos"),
            order(&[3, 1], "12 Marina Road, Lagos")
        );
    }

    #[test]
    fn order_across_lines() {
        assert_eq!(parse("no: 1,2,3 \n address: lekki phase 1"), order(&[1, 2, 3], "lekki phase 1"));
    }

    #[test]
    fn order_keeps_duplicate_ids() {
        assert_eq!(parse("no:2,2 address:home"), order(&[2, 2], "home"));
    }

    #[test]
    fn order_without_address_marker() {
        assert_eq!(parse("no: 1,2"), invalid("no: 1,2", OrderError::MissingAddress));
    }

    #[test]
    fn order_with_empty_address() {
        assert_eq!(
            parse("no: 1 address:   "),
            invalid("no: 1 address:   ", OrderError::EmptyAddress)
        );
    }

    #[test]
    fn strict_rejects_non_numeric_id() {
        assert_eq!(
            parse("no: 1,two address: Lagos"),
            invalid("no: 1,two address: Lagos", OrderError::InvalidItemId("two".into()))
        );
    }

    #[test]
    fn strict_rejects_trailing_comma() {
        assert_eq!(
            parse("no: 1, address: Lagos"),
            invalid("no: 1, address: Lagos", OrderError::InvalidItemId(String::new()))
        );
    }

    #[test]
    fn strict_requires_colon_after_address() {
        assert_eq!(
            parse("no: 1 address Lagos"),
            invalid("no: 1 address Lagos", OrderError::MissingAddress)
        );
    }

    #[test]
    fn order_without_ids() {
        assert_eq!(
            parse("no: address: Lagos"),
            invalid("no: address: Lagos", OrderError::NoItems)
        );
    }

    #[test]
    fn permissive_drops_bad_ids() {
        assert_eq!(
            parse_with("no: 1, two, 4, address: Lagos", ParseMode::Permissive),
            order(&[1, 4], "Lagos")
        );
    }

    #[test]
    fn permissive_accepts_space_separated_ids_and_loose_marker() {
        assert_eq!(
            parse_with("no: 1 3 address - 5 Oak St", ParseMode::Permissive),
            order(&[1, 3], "5 Oak St")
        );
        assert_eq!(
            parse_with("no:2 Address=Ikeja", ParseMode::Permissive),
            order(&[2], "Ikeja")
        );
    }

    #[test]
    fn permissive_with_no_valid_ids() {
        assert_eq!(
            parse_with("no: x,y address: Lagos", ParseMode::Permissive),
            invalid("no: x,y address: Lagos", OrderError::NoItems)
        );
    }

    #[test]
    fn permissive_still_needs_an_address() {
        assert_eq!(
            parse_with("no: 1,2", ParseMode::Permissive),
            invalid("no: 1,2", OrderError::MissingAddress)
        );
    }

    #[test]
    fn anything_else_is_unknown() {
        for body in ["", "hello", "order 1,2", "number: 1 address: x", "n o: 1"] {
            assert_eq!(
                parse(body),
                Command::Unknown {
                    raw_body: body.to_string()
                }
            );
        }
    }

    #[test]
    fn non_ascii_bodies_do_not_panic() {
        assert_eq!(
            parse("no: 1 address: Ọ̀yọ́ Street"),
            order(&[1], "Ọ̀yọ́ Street")
        );
        assert!(matches!(parse("ñó: 1"), Command::Unknown { .. }));
    }

    #[test]
    fn parse_mode_from_config_value() {
        #[derive(Deserialize)]
        struct Holder {
            mode: ParseMode,
        }
        let holder: Holder = serde_json::from_str(r#"{"mode":"permissive"}"#).unwrap();
        assert_eq!(holder.mode, ParseMode::Permissive);
        assert_eq!(ParseMode::default(), ParseMode::Strict);
    }
}
