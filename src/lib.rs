// Library target for the integration tests and criterion benchmarks.
// The binary entry point is main.rs; this file re-declares the module tree so
// that tests and benches can import types via `vocabdr::ingest::*` /
// `vocabdr::session::*`. The terminal front end is only reachable from the
// binary, so suppress dead_code warnings.
#![allow(dead_code)]

pub mod config;
pub mod generator;
pub mod ingest;
pub mod session;
pub mod store;
