//! Resume generation pipeline: JD keyword extraction, candidate selection,
//! rewrite verification, document assembly, and the orchestration around them.

pub mod assembler;
pub mod handlers;
pub mod keywords;
pub mod orchestrator;
pub mod selector;
pub mod verifier;
pub mod worker;
