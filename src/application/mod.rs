//! Application layer orchestrating the booking lifecycle.
//!
//! `BookingEngine` is the entry point for every operation. It serialises
//! mutations per booking through `BookingLocks` and delegates the rules to the
//! pure transitions in `domain`.

pub mod engine;
pub mod locks;
