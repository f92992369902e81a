//! Core library for the `rtc-loadgen` CLI.
//!
//! This crate provides the building blocks used by the binary: the
//! controller protocol client, the load routines and their scheduler, the
//! timing-log sink and the HTTP control surface. The primary user-facing
//! interface is the `rtc-loadgen` command-line application; library APIs may
//! evolve as the CLI grows.
pub mod args;
pub mod config;
pub mod control;
pub mod error;
pub mod routines;
pub mod rtc;
pub mod scheduler;
pub mod sink;
