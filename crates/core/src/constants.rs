use rust_decimal::Decimal;
use rust_decimal_macros::dec;

/// Priority assigned to rules that do not declare one. Lower wins.
pub const DEFAULT_RULE_PRIORITY: i32 = 50;

/// A computed fee may exceed the sale amount by at most this factor.
pub const FEE_TOLERANCE_FACTOR: Decimal = dec!(1.01);

/// Numerator of the specificity score (`SPECIFICITY_NUMERATOR / category count`).
pub const SPECIFICITY_NUMERATOR: f64 = 1000.0;

/// Shortest term allowed to match inside a longer one.
pub const MIN_PARTIAL_TERM_LENGTH: usize = 3;

/// Decimal places for currency amounts
pub const CURRENCY_PRECISION: u32 = 2;

/// Decimal places for rates shown in audit trails
pub const RATE_DISPLAY_PRECISION: u32 = 4;

/// How many runner-up rules are kept on a match decision
pub const MATCH_DECISION_TOP_CANDIDATES: usize = 3;

/// Placeholder group for line items with no value on the requested dimension
pub const UNASSIGNED_DIMENSION_VALUE: &str = "Unassigned";

/// Territory labels too generic to filter sales data on.
pub const ABSTRACT_TERRITORIES: &[&str] = &[
    "primary",
    "secondary",
    "domestic",
    "international",
    "worldwide",
    "global",
    "north",
    "south",
    "east",
    "west",
    "northeast",
    "northwest",
    "southeast",
    "southwest",
];

/// Words that carry no meaning when comparing product categories.
pub const GENERIC_CATEGORY_WORDS: &[&str] = &[
    "and", "or", "the", "of", "for", "with", "a", "an", "all", "other", "products", "product",
    "items", "item", "goods", "category", "categories", "type", "types", "misc", "various",
    "tier", "grade", "level", "class",
];

/// Filler words ignored when deciding whether a territory label is abstract.
pub const TERRITORY_FILLER_WORDS: &[&str] =
    &["territory", "territories", "region", "regions", "market", "markets", "zone", "area"];
