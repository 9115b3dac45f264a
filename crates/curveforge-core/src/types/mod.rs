//! Core value types: dates, tenors, frequencies and currencies.

mod currency;
mod date;
mod frequency;
mod tenor;

pub use currency::Currency;
pub use date::Date;
pub use frequency::Frequency;
pub use tenor::Tenor;
