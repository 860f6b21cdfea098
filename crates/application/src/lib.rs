//! Application services and ports.

#![forbid(unsafe_code)]

mod attribution_service;
mod event_service;
mod lifecycle_service;
mod ports;
mod throttle_service;

pub use attribution_service::{AttributionService, AuditTrail};
pub use event_service::{AttributedChange, ChangeRecordSink, EventService};
pub use lifecycle_service::{LifecycleRunReport, LifecycleService, RequestRecordStore};
pub use ports::Clock;
pub use throttle_service::{ThrottleService, ThrottleStatus, WindowSnapshot, WindowStore};
