pub mod trend_refresh;
