//! Report rendering
//!
//! A [`Summary`] is printed as an aligned text block or, together with the
//! full layout, exported as JSON.

use estimator_common::{Error, LayoutConfig, Result};
use estimator_explorer::TraversalStats;
use estimator_layout::{EcSummary, Footprint, Layout};
use serde::Serialize;
use std::fmt;
use std::path::Path;

/// How the layout was produced
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Mode {
    /// One object per real directory and file
    Walk,
    /// Extrapolated from the traversal counters
    Average,
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Walk => write!(f, "walk"),
            Self::Average => write!(f, "average"),
        }
    }
}

/// Counters and modeled totals of one run
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Summary {
    pub path: String,
    pub mode: Mode,
    pub stats: TraversalStats,
    pub objects: usize,
    pub footprint: Footprint,
    /// Present when parity is enabled
    pub ec: Option<EcSummary>,
}

impl Summary {
    /// Fails when the container footprint does not fit in a `u64`
    pub fn new(
        path: &Path,
        mode: Mode,
        stats: TraversalStats,
        layout: &Layout,
        config: &LayoutConfig,
    ) -> Result<Self> {
        let ec = config
            .ec_enabled()
            .then(|| layout.ec_totals.summarize(config.cell_count, config.parity_count));
        Ok(Self {
            path: path.display().to_string(),
            mode,
            stats,
            objects: layout.container.len(),
            footprint: layout.container.footprint()?,
            ec,
        })
    }
}

impl fmt::Display for Summary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let stats = &self.stats;
        writeln!(f, "Path:             {}", self.path)?;
        writeln!(f, "Mode:             {}", self.mode)?;
        writeln!(f)?;
        writeln!(f, "Directories:      {}", stats.dirs)?;
        writeln!(f, "Files:            {}", stats.files)?;
        writeln!(f, "Symlinks:         {}", stats.symlinks)?;
        writeln!(f, "Errors:           {}", stats.errors)?;
        writeln!(f, "Total count:      {}", stats.total_count())?;
        writeln!(f, "Total size:       {}", format_size(stats.total_bytes()))?;
        writeln!(f)?;
        writeln!(f, "Objects:          {}", self.objects)?;
        writeln!(f, "Keys:             {}", self.footprint.keys)?;
        writeln!(f, "Values:           {}", self.footprint.values)?;
        writeln!(f, "Metadata:         {}", format_size(self.footprint.meta_bytes))?;
        write!(f, "User data:        {}", format_size(self.footprint.user_bytes))?;

        if let Some(ec) = &self.ec {
            writeln!(f)?;
            writeln!(f)?;
            write!(f, "{ec}")?;
        }
        Ok(())
    }
}

/// JSON export: the summary plus the whole layout
#[derive(Serialize)]
pub struct Report<'a> {
    pub summary: &'a Summary,
    pub layout: &'a Layout,
}

impl Report<'_> {
    /// Pretty-printed JSON document
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).map_err(|e| Error::Serialization(e.to_string()))
    }
}

/// Format bytes as a human-readable size string.
#[allow(clippy::cast_precision_loss)]
pub fn format_size(bytes: u64) -> String {
    const TIB: u64 = 1024 * 1024 * 1024 * 1024;
    const GIB: u64 = 1024 * 1024 * 1024;
    const MIB: u64 = 1024 * 1024;
    const KIB: u64 = 1024;

    if bytes >= TIB && bytes.is_multiple_of(TIB) {
        format!("{} TiB", bytes / TIB)
    } else if bytes >= GIB && bytes.is_multiple_of(GIB) {
        format!("{} GiB", bytes / GIB)
    } else if bytes >= MIB && bytes.is_multiple_of(MIB) {
        format!("{} MiB", bytes / MIB)
    } else if bytes >= TIB {
        format!("{:.1} TiB", bytes as f64 / TIB as f64)
    } else if bytes >= GIB {
        format!("{:.1} GiB", bytes as f64 / GIB as f64)
    } else if bytes >= MIB {
        format!("{:.1} MiB", bytes as f64 / MIB as f64)
    } else if bytes >= KIB {
        format!("{:.1} KiB", bytes as f64 / KIB as f64)
    } else {
        format!("{bytes} B")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use estimator_layout::LayoutBuilder;

    #[test]
    fn test_format_size() {
        assert_eq!(format_size(0), "0 B");
        assert_eq!(format_size(1000), "1000 B");
        assert_eq!(format_size(1536), "1.5 KiB");
        assert_eq!(format_size(1024 * 1024), "1 MiB");
        assert_eq!(format_size(3 * 1024 * 1024 / 2), "1.5 MiB");
        assert_eq!(format_size(2 * 1024 * 1024 * 1024), "2 GiB");
        assert_eq!(format_size(1024 * 1024 * 1024 * 1024), "1 TiB");
    }

    fn summary(config: &LayoutConfig) -> Summary {
        let mut builder = LayoutBuilder::new(config.clone()).unwrap();
        let dir = builder.create_object();
        builder.create_directory_entry(dir, "f", 1).unwrap();
        builder.create_file_layout(200, 1).unwrap();

        let stats = TraversalStats {
            files: 1,
            name_bytes: 1,
            file_bytes: 200,
            ..TraversalStats::default()
        };
        Summary::new(
            Path::new("/data"),
            Mode::Walk,
            stats,
            &builder.into_layout(),
            config,
        )
        .unwrap()
    }

    #[test]
    fn test_summary_render() {
        let summary = summary(&LayoutConfig::default());
        assert_eq!(summary.objects, 2);
        assert_eq!(summary.footprint.user_bytes, 200);
        assert!(summary.ec.is_none());

        let text = summary.to_string();
        assert!(text.contains("Path:             /data"));
        assert!(text.contains("Files:            1"));
        assert!(text.contains("Total count:      1"));
        assert!(text.contains("Total size:       201 B"));
        assert!(text.contains("User data:        200 B"));
        assert!(!text.contains("EC summary"));
    }

    #[test]
    fn test_summary_render_ec() {
        let summary = summary(&LayoutConfig::default().with_ec(2, 1, 64));
        let ec = summary.ec.unwrap();
        assert_eq!(ec.payload_cells, 8);
        assert_eq!(ec.parity_cells, 4);

        let text = summary.to_string();
        assert!(text.contains("EC data stripe units:   8"));
        assert!(text.contains("EC summary: 256 x 2 + 256 x 1 = 200 + 256"));
    }

    #[test]
    fn test_report_json() {
        let config = LayoutConfig::default();
        let summary = summary(&config);
        let mut builder = LayoutBuilder::new(config).unwrap();
        builder.create_file_layout(10, 1).unwrap();
        let layout = builder.into_layout();

        let report = Report {
            summary: &summary,
            layout: &layout,
        };
        let json: serde_json::Value = serde_json::from_str(&report.to_json().unwrap()).unwrap();
        assert_eq!(json["summary"]["mode"], "walk");
        assert_eq!(json["summary"]["stats"]["files"], 1);
        assert!(json["summary"]["ec"].is_null());
        assert_eq!(json["layout"]["container"]["objects"].as_array().unwrap().len(), 1);
    }
}
