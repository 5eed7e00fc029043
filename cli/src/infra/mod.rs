//! Infrastructure layer — concrete implementations of application port traits.
//!
//! This module contains all I/O-performing code: process execution,
//! filesystem access, container engine control, HTTP fetching, network
//! probing, and terminal prompting.
//!
//! Imports from `crate::domain` and `crate::application::ports` are allowed.
//! Imports from `crate::commands` or `crate::output` are forbidden.

pub mod command_runner;
pub mod docker;
pub mod fetch;
pub mod fs;
pub mod network;
pub mod notify;
pub mod prompt;
