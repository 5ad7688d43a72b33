use std::fmt::Write as _;
use std::fs;
use std::io::{Error, ErrorKind};
use std::path::Path;

use crate::evaluation::ConfusionMatrix;

const CELL: usize = 72;
const LEFT: usize = 110;
const TOP: usize = 30;
const BOTTOM: usize = 70;

pub enum PlotFormat {
    Svg,
    Csv,
    Json,
}

impl PlotFormat {
    /// Picks the format from the file extension; unknown extensions get SVG.
    pub fn from_path(path: &Path) -> Self {
        match path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase())
            .as_deref()
        {
            Some("csv") => PlotFormat::Csv,
            Some("json") => PlotFormat::Json,
            _ => PlotFormat::Svg,
        }
    }
}

/// Annotated heatmap of a confusion matrix.
pub struct ConfusionPlot<'a> {
    matrix: &'a ConfusionMatrix,
    labels: Vec<String>,
}

impl<'a> ConfusionPlot<'a> {
    /// Missing labels fall back to the class index.
    pub fn new<S: AsRef<str>>(matrix: &'a ConfusionMatrix, labels: &[S]) -> Self {
        let labels = (0..matrix.num_classes())
            .map(|i| {
                labels
                    .get(i)
                    .map(|s| s.as_ref().to_string())
                    .unwrap_or_else(|| i.to_string())
            })
            .collect();
        Self { matrix, labels }
    }

    /// Writes the plot, creating parent directories as needed.
    pub fn export<P: AsRef<Path>>(&self, path: P, fmt: PlotFormat) -> Result<(), Error> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        let body = match fmt {
            PlotFormat::Svg => self.to_svg(),
            PlotFormat::Csv => self.to_csv(),
            PlotFormat::Json => serde_json::to_string_pretty(&self.to_json())
                .map_err(|e| Error::new(ErrorKind::InvalidData, e))?,
        };
        fs::write(path, body)
    }

    pub fn to_svg(&self) -> String {
        let n = self.matrix.num_classes();
        let width = LEFT + n * CELL + 20;
        let height = TOP + n * CELL + BOTTOM;
        let max = self.matrix.max_count().max(1) as f64;

        let mut s = String::new();
        let _ = writeln!(
            s,
            r#"<svg xmlns="http://www.w3.org/2000/svg" width="{width}" height="{height}" viewBox="0 0 {width} {height}" font-family="sans-serif" font-size="14">"#
        );
        let _ = writeln!(
            s,
            r#"  <rect width="{width}" height="{height}" fill="white"/>"#
        );

        for (t, row) in self.matrix.rows().enumerate() {
            for (p, &count) in row.iter().enumerate() {
                let x = LEFT + p * CELL;
                let y = TOP + t * CELL;
                let intensity = count as f64 / max;
                let (r, g, b) = shade(intensity);
                let text_fill = if intensity > 0.5 { "white" } else { "black" };
                let _ = writeln!(
                    s,
                    r#"  <rect class="cell" x="{x}" y="{y}" width="{CELL}" height="{CELL}" fill="rgb({r},{g},{b})" stroke="white"/>"#
                );
                let _ = writeln!(
                    s,
                    r#"  <text x="{}" y="{}" text-anchor="middle" dominant-baseline="central" fill="{text_fill}">{count}</text>"#,
                    x + CELL / 2,
                    y + CELL / 2
                );
            }
        }

        for (i, label) in self.labels.iter().enumerate() {
            let label = escape(label);
            let _ = writeln!(
                s,
                r#"  <text x="{}" y="{}" text-anchor="middle">{label}</text>"#,
                LEFT + i * CELL + CELL / 2,
                TOP + n * CELL + 20
            );
            let _ = writeln!(
                s,
                r#"  <text x="{}" y="{}" text-anchor="end" dominant-baseline="central">{label}</text>"#,
                LEFT - 8,
                TOP + i * CELL + CELL / 2
            );
        }

        let _ = writeln!(
            s,
            r#"  <text x="{}" y="{}" text-anchor="middle" font-weight="bold">Predicted</text>"#,
            LEFT + n * CELL / 2,
            TOP + n * CELL + 50
        );
        let cy = TOP + n * CELL / 2;
        let _ = writeln!(
            s,
            r#"  <text x="16" y="{cy}" text-anchor="middle" font-weight="bold" transform="rotate(-90 16 {cy})">True</text>"#
        );
        s.push_str("</svg>\n");
        s
    }

    pub fn to_csv(&self) -> String {
        let mut s = String::from("true\\predicted");
        for label in &self.labels {
            let _ = write!(s, ",{label}");
        }
        s.push('\n');
        for (label, row) in self.labels.iter().zip(self.matrix.rows()) {
            s.push_str(label);
            for count in row {
                let _ = write!(s, ",{count}");
            }
            s.push('\n');
        }
        s
    }

    pub fn to_json(&self) -> serde_json::Value {
        let rows: Vec<Vec<u64>> = self.matrix.rows().map(|r| r.to_vec()).collect();
        serde_json::json!({
            "labels": self.labels,
            "matrix": rows,
        })
    }
}

/// White to dark blue.
fn shade(intensity: f64) -> (u8, u8, u8) {
    let t = intensity.clamp(0.0, 1.0);
    let lerp = |from: f64, to: f64| (from + (to - from) * t).round() as u8;
    (lerp(247.0, 8.0), lerp(251.0, 48.0), lerp(255.0, 107.0))
}

fn escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}
