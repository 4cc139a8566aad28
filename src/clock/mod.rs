pub mod clock;
pub mod time_of_day;
