pub mod bounds;
pub mod error;
pub mod outline;
pub mod projection;
pub mod view;
