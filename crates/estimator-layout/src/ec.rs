//! Erasure coding accounting
//!
//! `EcStats` counts the payload and parity cells a file occupies once it is
//! cut into stripes. One stripe is `cells` payload cells plus `parity` parity
//! cells, each `stripe_size` bytes:
//!
//! ```text
//! stripe = [ D0 | D1 | ... | Dcells-1 | P0 | ... | Pparity-1 ]
//! ```

use crate::types::checked;
use estimator_common::Result;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Running EC totals
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EcStats {
    /// Payload cells across all stripes
    pub payload_cells: u64,
    /// Parity cells across all stripes
    pub parity_cells: u64,
    /// Payload bytes (`stripe_size` per stripe)
    pub payload_bytes: u64,
    /// Parity bytes (`stripe_size * parity` per stripe)
    pub overhead_bytes: u64,
    /// File bytes covered by the stripes
    pub file_size_total: u64,
}

impl EcStats {
    /// Stats of a single stripe
    pub fn stripe(cells: u32, parity: u32, stripe_size: u64) -> Result<Self> {
        Ok(Self {
            payload_cells: u64::from(cells),
            parity_cells: u64::from(parity),
            payload_bytes: stripe_size,
            overhead_bytes: checked(
                stripe_size.checked_mul(u64::from(parity)),
                "parity bytes",
            )?,
            file_size_total: 0,
        })
    }

    /// Pointwise sum; `self` is unchanged on overflow
    pub fn add(&mut self, other: &Self) -> Result<()> {
        *self = Self {
            payload_cells: checked(
                self.payload_cells.checked_add(other.payload_cells),
                "payload cells",
            )?,
            parity_cells: checked(
                self.parity_cells.checked_add(other.parity_cells),
                "parity cells",
            )?,
            payload_bytes: checked(
                self.payload_bytes.checked_add(other.payload_bytes),
                "payload bytes",
            )?,
            overhead_bytes: checked(
                self.overhead_bytes.checked_add(other.overhead_bytes),
                "parity bytes",
            )?,
            file_size_total: checked(
                self.file_size_total.checked_add(other.file_size_total),
                "file size",
            )?,
        };
        Ok(())
    }

    /// Pointwise multiply; `self` is unchanged on overflow
    pub fn scale(&mut self, factor: u64) -> Result<()> {
        *self = Self {
            payload_cells: checked(self.payload_cells.checked_mul(factor), "payload cells")?,
            parity_cells: checked(self.parity_cells.checked_mul(factor), "parity cells")?,
            payload_bytes: checked(self.payload_bytes.checked_mul(factor), "payload bytes")?,
            overhead_bytes: checked(self.overhead_bytes.checked_mul(factor), "parity bytes")?,
            file_size_total: checked(self.file_size_total.checked_mul(factor), "file size")?,
        };
        Ok(())
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Diagnostic record for the given stripe geometry
    #[must_use]
    pub fn summarize(&self, cells: u32, parity: u32) -> EcSummary {
        let parity_size = if parity == 0 {
            0
        } else {
            self.overhead_bytes / u64::from(parity)
        };
        EcSummary {
            cells,
            parity,
            payload_cells: self.payload_cells,
            parity_cells: self.parity_cells,
            payload_bytes: self.payload_bytes,
            overhead_bytes: self.overhead_bytes,
            parity_size,
            file_size_total: self.file_size_total,
        }
    }
}

/// Trace record produced by [`EcStats::summarize`]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct EcSummary {
    pub cells: u32,
    pub parity: u32,
    pub payload_cells: u64,
    pub parity_cells: u64,
    pub payload_bytes: u64,
    pub overhead_bytes: u64,
    /// Parity bytes per parity cell column
    pub parity_size: u64,
    pub file_size_total: u64,
}

impl EcSummary {
    /// `payload x cells + parity_size x parity = file_size + overhead`
    #[must_use]
    pub fn check_string(&self) -> String {
        format!(
            "{} x {} + {} x {} = {} + {}",
            self.payload_bytes,
            self.cells,
            self.parity_size,
            self.parity,
            self.file_size_total,
            self.overhead_bytes
        )
    }
}

impl fmt::Display for EcSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "EC data stripe units:   {}", self.payload_cells)?;
        writeln!(f, "EC avg data per stripe: {}", self.payload_bytes)?;
        writeln!(f, "EC parity stripe units: {}", self.parity_cells)?;
        writeln!(f, "EC parity overhead:     {}", self.overhead_bytes)?;
        write!(f, "EC summary: {}", self.check_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stripe() {
        let stats = EcStats::stripe(4, 2, 1024).unwrap();
        assert_eq!(stats.payload_cells, 4);
        assert_eq!(stats.parity_cells, 2);
        assert_eq!(stats.payload_bytes, 1024);
        assert_eq!(stats.overhead_bytes, 2048);
        assert_eq!(stats.file_size_total, 0);
    }

    #[test]
    fn test_add_and_scale() {
        let mut total = EcStats::default();
        assert!(total.is_empty());

        let mut file = EcStats::stripe(2, 1, 64).unwrap();
        file.file_size_total = 100;
        file.scale(3).unwrap();
        assert_eq!(file.payload_cells, 6);
        assert_eq!(file.parity_cells, 3);
        assert_eq!(file.overhead_bytes, 192);
        assert_eq!(file.file_size_total, 300);

        total.add(&file).unwrap();
        total.add(&file).unwrap();
        assert_eq!(total.payload_cells, 12);
        assert_eq!(total.payload_bytes, 384);
        assert_eq!(total.file_size_total, 600);
        assert!(!total.is_empty());
    }

    #[test]
    fn test_overflow_leaves_stats_unchanged() {
        assert!(matches!(
            EcStats::stripe(2, 2, u64::MAX),
            Err(estimator_common::Error::InvalidInput(_))
        ));

        let mut stats = EcStats::stripe(2, 1, 64).unwrap();
        stats.file_size_total = u64::MAX / 2;
        let before = stats;
        assert!(stats.scale(4).is_err());
        assert_eq!(stats, before);

        let mut total = stats;
        total.add(&stats).unwrap();
        assert!(total.add(&stats).is_err());
        assert_eq!(total.file_size_total, u64::MAX - 1);
    }

    #[test]
    fn test_scale_by_one_is_identity() {
        let mut stats = EcStats::stripe(3, 2, 4096).unwrap();
        let before = stats;
        stats.scale(1).unwrap();
        assert_eq!(stats, before);
    }

    #[test]
    fn test_summarize() {
        let mut stats = EcStats::stripe(2, 1, 64).unwrap();
        stats.scale(4).unwrap();
        stats.file_size_total = 200;

        let summary = stats.summarize(2, 1);
        assert_eq!(summary.parity_size, 256);
        assert_eq!(summary.check_string(), "256 x 2 + 256 x 1 = 200 + 256");
        assert!(summary.to_string().ends_with("EC summary: 256 x 2 + 256 x 1 = 200 + 256"));
    }

    #[test]
    fn test_summarize_without_parity() {
        let summary = EcStats::default().summarize(0, 0);
        assert_eq!(summary.parity_size, 0);
    }
}
