//! # calc_core - Calculator Client Core
//!
//! `calc_core` holds the stateful part of a calculator front end: it turns
//! panel input into requests for a remote compute service, formats the
//! answers, and keeps a small persisted history of past calculations.
//! No arithmetic happens here.
//!
//! ## Design Philosophy
//!
//! - **Explicit state**: one [`Session`] owns everything a window shows
//! - **JSON-First**: requests, responses and history are serde types
//! - **Typed errors**: validation, transport and computation failures are
//!   distinct [`CalcError`] variants
//! - **Swappable edges**: the compute service and durable storage sit behind
//!   traits, so tests run without a network or a disk
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use calc_core::{CalculationClient, HistoryStore, HttpTransport, Session};
//! use calc_core::storage::FileStore;
//!
//! # async fn run() -> calc_core::CalcResult<()> {
//! let client = CalculationClient::new(HttpTransport::new("http://localhost:5000", None)?);
//! let history = HistoryStore::load(FileStore::open("/tmp/calc")?);
//! let mut session = Session::new(client, history);
//!
//! session.set_num1("5");
//! session.set_num2("3");
//! session.submit_basic().await?;
//! assert_eq!(session.display(), "8");
//! # Ok(())
//! # }
//! ```
//!
//! ## Modules
//!
//! - [`request`] / [`response`] - wire types for the compute service
//! - [`client`] - HTTP client and transport seam
//! - [`format`] - result rounding and number display
//! - [`history`] - bounded, persisted calculation log
//! - [`replay`] - parsing stored expressions back into inputs
//! - [`storage`] - durable key-value stores
//! - [`input`] / [`ui_state`] - panel contents, active tab, angle unit
//! - [`session`] - orchestration of all of the above
//! - [`errors`] - structured error types

pub mod client;
pub mod errors;
pub mod format;
pub mod history;
pub mod input;
pub mod replay;
pub mod request;
pub mod response;
pub mod session;
pub mod storage;
pub mod symbols;
pub mod ui_state;

// Re-export commonly used types at crate root for convenience
pub use client::{CalculationClient, ComputeTransport, HttpTransport};
pub use errors::{CalcError, CalcResult};
pub use format::{round_result, DisplayValue};
pub use history::{HistoryEntry, HistoryLog, HistoryStore};
pub use request::{AngleMode, CalculationRequest, Operator, ScientificFunction};
pub use response::CalculationResult;
pub use session::{Completion, PendingCalculation, Session};
pub use ui_state::{Tab, UiState};
