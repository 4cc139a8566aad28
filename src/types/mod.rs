pub mod market_calendar;
pub mod price;
pub mod session;
pub mod symbol;
pub mod trading_hours;
