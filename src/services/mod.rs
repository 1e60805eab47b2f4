//! Services layer
//!
//! Business logic that coordinates the stores and the resource file area.
//! Route handlers stay thin and delegate here.
//!
//! ## Services
//!
//! - **Downloads**: serve a resource file and record the download
//! - **Tracking**: analytics events and link clicks

pub mod downloads;
pub mod tracking;

pub use downloads::{Download, DownloadService, DOWNLOAD_CATEGORY};
pub use tracking::{LinkClickRequest, TrackEventRequest, TrackingService, SCHEDULING_CLICK};
