//! # Calculator Session
//!
//! Everything one calculator window holds: both input panels, the shared
//! display field, the result area, the error banner, the tab/angle state and
//! the history store. Front ends forward user actions here and read the
//! fields back to draw.
//!
//! ## Flow
//!
//! ```text
//! submit ── panel.to_request ──► client.calculate ──► round_result ──► history.record
//!              │ Validation            │ Transport / Computation
//!              └──────────────┬────────┘
//!                             ▼
//!                        error banner (history untouched)
//! ```
//!
//! ## Overlapping requests
//!
//! [`Session::begin_basic`] / [`Session::begin_scientific`] hand out a
//! [`PendingCalculation`] tagged with a sequence token; the caller runs it
//! without holding the session and passes the outcome to
//! [`Session::finish`]. Only the most recently issued request is applied;
//! older responses are dropped, successful ones included. A superseded
//! success therefore never reaches the display or the history: with
//! overlapping requests, history gains one entry per applied result, not per
//! successful service call.

use tracing::{debug, warn};

use crate::client::CalculationClient;
use crate::errors::CalcResult;
use crate::format::DisplayValue;
use crate::history::{HistoryItems, HistoryStore};
use crate::input::{BasicPanel, ScientificPanel};
use crate::replay::Replay;
use crate::request::{AngleMode, CalculationRequest, Operator, ScientificFunction};
use crate::ui_state::{Tab, UiState};

/// A validated request waiting for the compute service
#[derive(Debug, Clone, PartialEq)]
pub struct PendingCalculation {
    token: u64,
    request: CalculationRequest,
}

impl PendingCalculation {
    pub fn token(&self) -> u64 {
        self.token
    }

    pub fn request(&self) -> &CalculationRequest {
        &self.request
    }

    /// Send the request through `client`
    pub async fn run(&self, client: &CalculationClient) -> CalcResult<f64> {
        client.calculate(&self.request).await
    }
}

/// What [`Session::finish`] did with a response
#[derive(Debug, Clone, PartialEq)]
pub enum Completion {
    /// The formatted result is on display and recorded in history
    Applied(DisplayValue),
    /// A newer request was issued meanwhile; the response was ignored
    Stale,
}

/// State of one calculator window
pub struct Session {
    ui: UiState,
    basic: BasicPanel,
    scientific: ScientificPanel,
    display: String,
    result: Option<DisplayValue>,
    error: Option<String>,
    history: HistoryStore,
    client: CalculationClient,
    issued: u64,
}

impl Session {
    pub fn new(client: CalculationClient, history: HistoryStore) -> Self {
        Session {
            ui: UiState::new(),
            basic: BasicPanel::default(),
            scientific: ScientificPanel::default(),
            display: "0".to_string(),
            result: None,
            error: None,
            history,
            client,
            issued: 0,
        }
    }

    // ------------------------------------------------------------------
    // Read side
    // ------------------------------------------------------------------

    pub fn ui(&self) -> &UiState {
        &self.ui
    }

    pub fn basic(&self) -> &BasicPanel {
        &self.basic
    }

    pub fn scientific(&self) -> &ScientificPanel {
        &self.scientific
    }

    /// Shared display field
    pub fn display(&self) -> &str {
        &self.display
    }

    /// Result area, `None` while hidden
    pub fn result(&self) -> Option<&DisplayValue> {
        self.result.as_ref()
    }

    /// Error banner, `None` while hidden
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn history(&self) -> &HistoryStore {
        &self.history
    }

    /// Lazy history list
    pub fn render_history(&self) -> HistoryItems<'_> {
        self.history.render()
    }

    pub fn client(&self) -> &CalculationClient {
        &self.client
    }

    // ------------------------------------------------------------------
    // Panel editing
    // ------------------------------------------------------------------

    pub fn set_num1(&mut self, text: impl Into<String>) {
        self.basic.num1 = text.into();
        self.display = self.basic.display_text();
    }

    pub fn set_operator(&mut self, operator: Operator) {
        self.basic.operator = operator;
        self.display = self.basic.display_text();
    }

    pub fn set_num2(&mut self, text: impl Into<String>) {
        self.basic.num2 = text.into();
        self.display = self.basic.display_text();
    }

    pub fn set_scientific_num(&mut self, text: impl Into<String>) {
        self.scientific.num = text.into();
        self.display = self.scientific.display_text(self.ui.angle_mode());
    }

    pub fn clear_basic_inputs(&mut self) {
        self.basic.clear();
        self.reset_output();
    }

    pub fn clear_scientific_inputs(&mut self) {
        self.scientific.clear();
        self.reset_output();
    }

    fn reset_output(&mut self) {
        self.display = "0".to_string();
        self.result = None;
        self.error = None;
    }

    // ------------------------------------------------------------------
    // Mode / tab
    // ------------------------------------------------------------------

    /// Show another panel. Neither panel's contents are touched.
    pub fn switch_tab(&mut self, tab: Tab) {
        self.ui.switch_tab(tab);
    }

    /// Change the angle unit and refresh the display label. Nothing is recomputed.
    pub fn set_angle_mode(&mut self, mode: AngleMode) {
        self.ui.set_angle_mode(mode);
        self.display = self.scientific.display_text(mode);
    }

    /// Flip between degrees and radians
    pub fn toggle_angle_mode(&mut self) -> AngleMode {
        let mode = self.ui.toggle_angle_mode();
        self.display = self.scientific.display_text(mode);
        mode
    }

    // ------------------------------------------------------------------
    // Calculations
    // ------------------------------------------------------------------

    /// Validate the basic panel and issue a request
    pub fn begin_basic(&mut self) -> CalcResult<PendingCalculation> {
        self.hide_output();
        let request = self.basic.to_request();
        self.issue(request)
    }

    /// Validate the scientific panel and issue a request for `function`
    pub fn begin_scientific(&mut self, function: ScientificFunction) -> CalcResult<PendingCalculation> {
        self.hide_output();
        let request = self.scientific.to_request(function, self.ui.angle_mode());
        self.issue(request)
    }

    fn issue(&mut self, request: CalcResult<CalculationRequest>) -> CalcResult<PendingCalculation> {
        match request {
            Ok(request) => {
                self.issued += 1;
                debug!(token = self.issued, expression = %request.expression(), "issued calculation");
                Ok(PendingCalculation {
                    token: self.issued,
                    request,
                })
            }
            Err(e) => {
                self.error = Some(e.user_message());
                Err(e)
            }
        }
    }

    /// Apply the outcome of `pending`.
    ///
    /// Success rounds the value onto the display and result area and records
    /// the raw value in history. Any error goes to the banner and leaves
    /// history alone. Responses to superseded requests are dropped.
    pub fn finish(&mut self, pending: PendingCalculation, outcome: CalcResult<f64>) -> CalcResult<Completion> {
        if pending.token != self.issued {
            debug!(
                token = pending.token,
                latest = self.issued,
                "dropping response to superseded request"
            );
            return Ok(Completion::Stale);
        }

        let value = match outcome {
            Ok(value) => value,
            Err(e) => {
                self.error = Some(e.user_message());
                return Err(e);
            }
        };

        let formatted = DisplayValue::Number(value).formatted();
        self.display = formatted.to_string();
        self.result = Some(formatted.clone());

        if let Err(e) = self.history.record(pending.request.expression(), value) {
            warn!(error = %e, "calculation history was not saved");
        }

        Ok(Completion::Applied(formatted))
    }

    /// Validate, send and apply the basic panel in one step
    pub async fn submit_basic(&mut self) -> CalcResult<Completion> {
        let pending = self.begin_basic()?;
        self.complete(pending).await
    }

    /// Validate, send and apply a scientific function in one step
    pub async fn submit_scientific(&mut self, function: ScientificFunction) -> CalcResult<Completion> {
        let pending = self.begin_scientific(function)?;
        self.complete(pending).await
    }

    async fn complete(&mut self, pending: PendingCalculation) -> CalcResult<Completion> {
        let client = self.client.clone();
        let outcome = pending.run(&client).await;
        self.finish(pending, outcome)
    }

    fn hide_output(&mut self) {
        self.error = None;
        self.result = None;
    }

    // ------------------------------------------------------------------
    // History
    // ------------------------------------------------------------------

    /// Load history entry `index` (0 = newest) back into the panels.
    ///
    /// Returns `None` when there is no such entry.
    pub fn replay(&mut self, index: usize) -> Option<Replay> {
        let replay = self.history.render().nth(index)?.replay();
        debug!(index, ?replay, "replaying history entry");

        match &replay {
            Replay::Basic(operands) => {
                self.ui.switch_tab(Tab::Basic);
                if let Some(operands) = operands {
                    self.basic.fill(*operands);
                    self.display = self.basic.display_text();
                }
            }
            Replay::Scientific { num, .. } => {
                self.ui.switch_tab(Tab::Scientific);
                self.scientific.fill(*num);
                self.display = self.scientific.display_text(self.ui.angle_mode());
            }
        }

        Some(replay)
    }

    /// Clear history after asking `confirm`. See [`HistoryStore::clear`].
    pub fn clear_history(&mut self, confirm: impl FnOnce(&str) -> bool) -> CalcResult<bool> {
        self.history.clear(confirm)
    }
}
