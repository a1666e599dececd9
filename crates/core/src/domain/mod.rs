pub mod approval;
pub mod invoice;
pub mod notification;
pub mod session;
pub mod supplier;
pub mod tenant;
pub mod transport;
