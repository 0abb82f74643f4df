//! # Campus Assist
//!
//! A student-facing assistant for one college: question answering grounded
//! in the college's own information, a grade / CGPA calculator, and a small
//! productivity dashboard, served as a web form UI and a CLI.
//!
//! ## Architecture
//!
//! ```text
//! ┌────────────┐   ┌─────────────┐   ┌──────────────┐
//! │ Knowledge  │──▶│ Chunk+Embed │──▶│ Vector store │
//! │  corpus    │   │  (ingest)   │   │   (SQLite)   │
//! └─────┬──────┘   └─────────────┘   └──────┬───────┘
//!       │ static                     indexed │
//!       └──────────────┬─────────────────────┘
//!                      ▼
//!               ┌─────────────┐    ┌────────────┐
//!               │  Retriever  │──▶ │ Chat model │
//!               └─────────────┘    └─────┬──────┘
//!                                        ▼
//!                 ┌──────────┐     ┌──────────┐
//!                 │   CLI    │     │ Web UI   │ ◀── grade calculator
//!                 │ (campus) │     │ (axum)   │
//!                 └──────────┘     └──────────┘
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing |
//! | [`error`] | Domain error taxonomy |
//! | [`models`] | Core data types |
//! | [`knowledge`] | Built-in college corpus and FAQ |
//! | [`chunk`] | Overlapping text chunking |
//! | [`embedding`] | Embedding provider abstraction |
//! | [`llm`] | Chat-completion client |
//! | [`http`] | Retrying JSON requests |
//! | [`db`] | Database connection |
//! | [`store`] | Persisted vector store |
//! | [`ingest`] | Corpus → store pipeline |
//! | [`retrieve`] | Static and indexed retrieval |
//! | [`answer`] | Prompting and answer classification |
//! | [`grade`] | Grade / CGPA calculator |
//! | [`session`] | Per-browser session state |
//! | [`actions`] | UI actions over a session |
//! | [`render`] | HTML rendering |
//! | [`export`] | PDF export |
//! | [`server`] | HTTP server |

pub mod actions;
pub mod answer;
pub mod chunk;
pub mod config;
pub mod db;
pub mod embedding;
pub mod error;
pub mod export;
pub mod grade;
pub mod http;
pub mod ingest;
pub mod knowledge;
pub mod llm;
pub mod models;
pub mod render;
pub mod retrieve;
pub mod server;
pub mod session;
pub mod store;
