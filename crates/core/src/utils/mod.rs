pub mod json_values;
pub mod text_match;
pub mod time_utils;

pub use json_values::{decimal_from_json, first_decimal, first_field, first_string, string_from_json};
pub use text_match::{normalize_term, terms_equal, terms_overlap, tokenize};
pub use time_utils::{period_key, Season};
