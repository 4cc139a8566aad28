pub mod forecast_cache;
