//! Core module containing the main functionality of atbench
//!
//! This module provides:
//! - Transport layer (serial port and simulated modem)
//! - Transaction engine that frames AT responses
//! - Session management and off-thread dispatch
//! - Batch execution with pacing and cancellation
//! - Reported entries for the presentation layer
//! - Device-side modem emulator

pub mod batch;
pub mod emulator;
pub mod engine;
pub mod logger;
pub mod session;
pub mod transaction;
pub mod transport;
