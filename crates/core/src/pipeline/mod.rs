pub mod annotate_still_use_case;
pub mod asset_locator;
pub mod detection_worker;
pub mod live_feed_use_case;
pub mod pipeline_error;
pub mod pipeline_logger;
