//! Constants for the WAQI integration

pub const DOMAIN: &str = "waqi";

pub const CONF_API_TOKEN: &str = "api_token";
pub const CONF_KEYWORD: &str = "keyword";
pub const CONF_STATION: &str = "station";
pub const CONF_UPDATE_INTERVAL: &str = "update_interval";

/// Seconds between updates
pub const DEFAULT_UPDATE_INTERVAL: u64 = 900;
/// Seconds; the form rejects anything lower
pub const MIN_UPDATE_INTERVAL: i64 = 1;

// Setup method selection
pub const FLOW_TYPE: &str = "flow_type";
pub const FLOW_SEARCH: &str = "search";
pub const FLOW_FEED: &str = "feed";
pub const FLOW_SEARCH_LABEL: &str = "Find stations from an area/city name";
pub const FLOW_FEED_LABEL: &str = "Enter the station ID";

// Step ids
pub const STEP_USER: &str = "user";
pub const STEP_USER_SEARCH: &str = "user_search";
pub const STEP_PICK_STATION: &str = "pick_station";
pub const STEP_USER_FEED: &str = "user_feed";
pub const STEP_INIT: &str = "init";

// Form error and abort reason keys
pub const ERROR_API_OVER_QUOTA: &str = "api_over_quota";
pub const ERROR_API_TOKEN_INVALID: &str = "api_token_invalid";
pub const ERROR_NO_MATCHING_STATIONS: &str = "no_matching_stations_found";
pub const ERROR_NO_STATION_FEED: &str = "no_station_feed_found";
pub const ERROR_UNKNOWN: &str = "unknown";
pub const ABORT_ALREADY_CONFIGURED: &str = ha_data_entry_flow::ABORT_ALREADY_CONFIGURED;
