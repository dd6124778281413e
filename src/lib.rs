pub mod ad;
pub mod clock;
pub mod config;
pub mod creative;
pub mod error;
pub mod events;
pub mod fetch;
pub mod models;
pub mod quartile;
pub mod scheduler;
pub mod slot;

pub use ad::{get_vpaid_ad, VpaidNonLinear, VPAID_VERSION};
pub use config::AdConfig;
pub use creative::CreativeKind;
pub use error::{Result, VpaidError};
pub use events::{AdEvent, EventArgs};
