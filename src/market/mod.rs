pub mod history;
pub mod price_book;
pub mod price_source;
