use rand::Rng;
use std::fmt;

/// Number of digits following the entity prefix, e.g. `ORD` + `48213`.
pub const ID_DIGITS: usize = 5;

const ID_MIN: u32 = 10_000;
const ID_MAX: u32 = 99_999;

/// Entity families that carry a prefixed, fixed-width identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityPrefix {
    Product,
    Customer,
    Order,
    Transaction,
}

impl EntityPrefix {
    pub fn as_str(&self) -> &'static str {
        match self {
            EntityPrefix::Product => "PROD",
            EntityPrefix::Customer => "CUST",
            EntityPrefix::Order => "ORD",
            EntityPrefix::Transaction => "TXN",
        }
    }
}

impl fmt::Display for EntityPrefix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Generate a new identifier such as `PROD40521`.
///
/// The numeric part is drawn uniformly from 10000..=99999, so it never has a
/// leading zero. Collisions are possible; stores reject them with a distinct
/// duplicate error rather than overwriting.
pub fn generate_id(prefix: EntityPrefix) -> String {
    let number = rand::thread_rng().gen_range(ID_MIN..=ID_MAX);
    format!("{}{:0width$}", prefix.as_str(), number, width = ID_DIGITS)
}
