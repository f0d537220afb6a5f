//! Domain layer: the booking aggregate, its payment ledger, and the ports the
//! engine needs from the outside world.

pub mod audit;
pub mod booking;
pub mod ledger;
pub mod money;
pub mod payment;
pub mod ports;
pub mod reconciliation;
pub mod rejection;
