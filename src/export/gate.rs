//! In-progress gating for export pathways.
//!
//! Each (pathway, receipt) pair moves Idle → InProgress → Idle. Holding an
//! [`ExportTicket`] is what InProgress means; dropping it, on success, error or
//! panic, returns the pair to Idle.

use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

use parking_lot::Mutex;
use serde::Serialize;
use utoipa::ToSchema;

use super::print::PrintRegion;
use super::ExportError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExportPathway {
    Print(PrintRegion),
    Rasterize,
}

impl fmt::Display for ExportPathway {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Print(region) => write!(f, "{} print", region.as_str()),
            Self::Rasterize => f.write_str("PDF download"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum ExportState {
    Idle,
    InProgress,
}

/// Per-pathway state for one receipt, used by clients to disable export buttons.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ExportStatus {
    pub print_receipt: ExportState,
    pub print_letter: ExportState,
    pub rasterize: ExportState,
}

type GateKey = (ExportPathway, String);

#[derive(Clone, Default)]
pub struct ExportGate {
    in_flight: Arc<Mutex<HashSet<GateKey>>>,
}

impl ExportGate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Claim the pathway for `receipt_ref`, or report that it is already running.
    pub fn try_acquire(
        &self,
        pathway: ExportPathway,
        receipt_ref: &str,
    ) -> Result<ExportTicket, ExportError> {
        let key = (pathway, receipt_ref.to_string());
        if !self.in_flight.lock().insert(key.clone()) {
            log::debug!("{} for {} rejected: already in progress", pathway, receipt_ref);
            return Err(ExportError::AlreadyInProgress(pathway));
        }

        log::debug!("{} for {} started", pathway, receipt_ref);
        Ok(ExportTicket {
            in_flight: self.in_flight.clone(),
            key: Some(key),
        })
    }

    pub fn state(&self, pathway: ExportPathway, receipt_ref: &str) -> ExportState {
        if self
            .in_flight
            .lock()
            .contains(&(pathway, receipt_ref.to_string()))
        {
            ExportState::InProgress
        } else {
            ExportState::Idle
        }
    }

    pub fn status(&self, receipt_ref: &str) -> ExportStatus {
        ExportStatus {
            print_receipt: self.state(ExportPathway::Print(PrintRegion::Receipt), receipt_ref),
            print_letter: self.state(ExportPathway::Print(PrintRegion::Letter), receipt_ref),
            rasterize: self.state(ExportPathway::Rasterize, receipt_ref),
        }
    }
}

/// Proof that an export is in flight. Releases the gate on drop.
pub struct ExportTicket {
    in_flight: Arc<Mutex<HashSet<GateKey>>>,
    key: Option<GateKey>,
}

impl Drop for ExportTicket {
    fn drop(&mut self) {
        if let Some(key) = self.key.take() {
            log::debug!("{} for {} finished", key.0, key.1);
            self.in_flight.lock().remove(&key);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_second_acquire_is_rejected_until_release() {
        let gate = ExportGate::new();

        let ticket = gate.try_acquire(ExportPathway::Rasterize, "R-1").unwrap();
        assert_eq!(gate.state(ExportPathway::Rasterize, "R-1"), ExportState::InProgress);
        assert!(matches!(
            gate.try_acquire(ExportPathway::Rasterize, "R-1"),
            Err(ExportError::AlreadyInProgress(ExportPathway::Rasterize))
        ));

        drop(ticket);
        assert_eq!(gate.state(ExportPathway::Rasterize, "R-1"), ExportState::Idle);
        assert!(gate.try_acquire(ExportPathway::Rasterize, "R-1").is_ok());
    }

    #[test]
    fn test_pathways_and_receipts_are_independent() {
        let gate = ExportGate::new();
        let _raster = gate.try_acquire(ExportPathway::Rasterize, "R-1").unwrap();
        let _print = gate
            .try_acquire(ExportPathway::Print(PrintRegion::Receipt), "R-1")
            .unwrap();
        let _letter = gate
            .try_acquire(ExportPathway::Print(PrintRegion::Letter), "R-1")
            .unwrap();
        let _other = gate.try_acquire(ExportPathway::Rasterize, "R-2").unwrap();

        let status = gate.status("R-1");
        assert_eq!(status.print_receipt, ExportState::InProgress);
        assert_eq!(status.print_letter, ExportState::InProgress);
        assert_eq!(status.rasterize, ExportState::InProgress);
    }

    #[test]
    fn test_ticket_released_when_holder_panics() {
        let gate = ExportGate::new();
        let cloned = gate.clone();

        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(move || {
            let _ticket = cloned.try_acquire(ExportPathway::Rasterize, "R-1").unwrap();
            panic!("render blew up");
        }));

        assert!(result.is_err());
        assert_eq!(gate.state(ExportPathway::Rasterize, "R-1"), ExportState::Idle);
    }
}
