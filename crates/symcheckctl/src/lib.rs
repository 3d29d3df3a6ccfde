//! symcheckctl - interactive symptom checker
//!
//! Concrete network collaborators (SPARQL graph, reference articles, chat
//! assistant) and the terminal front end around `symcheck_common`.

pub mod assistant;
pub mod commands;
pub mod demo;
pub mod errors;
pub mod html;
pub mod interactive;
pub mod logging;
pub mod medline;
pub mod prompts;
pub mod render;
pub mod sparql;
pub mod wikipedia;
