pub mod dispatch;
pub mod identity;
pub mod namespace;
pub mod permission;
pub mod subject;

pub use dispatch::dispatch;
