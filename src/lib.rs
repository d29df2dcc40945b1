//! virttop: a live terminal dashboard for libvirt hypervisors.
//!
//! This library exposes the core modules for use by the binary and by tests.

pub mod app;
pub mod collectors;
pub mod config;
pub mod controller;
pub mod hypervisor;
pub mod layout;
pub mod lifecycle;
pub mod logging;
pub mod model;
pub mod view;
