//! lightspawn - lighttpd launcher for PHP projects
//!
//! This library exposes the building blocks of the `lightspawn` binary:
//! web root scanning, rewrite rule rendering, the server abstraction and the
//! restart supervisor.

pub mod cli;
pub mod config;
pub mod constants;
pub mod logging;
pub mod models;
pub mod output;
pub mod project;
pub mod render;
pub mod rules;
pub mod scan;
pub mod server;
pub mod supervisor;
pub mod tail;
pub mod writer;
