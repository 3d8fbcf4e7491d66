//! Command-line entry point: apply an edits file to a PDF.
//!
//! Prints a one-line JSON report on stdout and exits non-zero on failure.

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use pagemark_core::{EditOperation, LegacyEdit, OperationKind, parse_edits};
use pagemark_export::{DocumentExporter, ExportConfig, PdfExporter, page_sizes, validate_image};
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

#[derive(Parser, Debug)]
#[command(name = "pagemark")]
#[command(version, about = "Burn annotations and edits into PDF documents")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Apply the operations in an edits file and write a new PDF
    Edit {
        input: PathBuf,
        output: PathBuf,
        /// JSON array of edit entries
        edits: PathBuf,
        /// Export settings (JSON)
        #[arg(long)]
        config: Option<PathBuf>,
    },
    /// Print the size of every page
    Pages { input: PathBuf },
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
struct PageDimensions {
    width: f64,
    height: f64,
}

#[derive(Debug, Default, Serialize)]
struct Report {
    success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pages: Option<Vec<PageDimensions>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

impl Report {
    fn message(message: String) -> Self {
        Self {
            success: true,
            message: Some(message),
            ..Self::default()
        }
    }

    fn failure(err: &anyhow::Error) -> Self {
        Self {
            error: Some(format!("{:#}", err)),
            ..Self::default()
        }
    }
}

/// Turn edit entries into operations the document can take.
///
/// Entries for pages the document does not have and images that do not
/// decode are skipped with a warning rather than failing the whole run.
fn applicable_operations(edits: Vec<LegacyEdit>, page_count: usize) -> Vec<EditOperation> {
    edits
        .into_iter()
        .filter_map(|edit| {
            let kind = edit.operation_type();
            let Some(operation) = edit.into_operation() else {
                log::debug!("Skipping empty {} entry", kind);
                return None;
            };
            if operation.page() >= page_count {
                log::warn!(
                    "Skipping {} on page {}: document has {} pages",
                    kind,
                    operation.page(),
                    page_count
                );
                return None;
            }
            if let OperationKind::Image(placement) = operation.kind() {
                if let Err(err) = validate_image(placement) {
                    log::warn!("Skipping image on page {}: {}", operation.page(), err);
                    return None;
                }
            }
            Some(operation)
        })
        .collect()
}

fn load_config(path: Option<&Path>) -> Result<ExportConfig> {
    let Some(path) = path else {
        return Ok(ExportConfig::default());
    };
    let json = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config {}", path.display()))?;
    ExportConfig::from_json(&json).with_context(|| format!("Invalid config {}", path.display()))
}

fn edit(input: &Path, output: &Path, edits: &Path, config: Option<&Path>) -> Result<Report> {
    let config = load_config(config)?;
    let source = fs::read(input).with_context(|| format!("Failed to read {}", input.display()))?;
    let json = fs::read_to_string(edits)
        .with_context(|| format!("Failed to read edits {}", edits.display()))?;

    let page_count = page_sizes(&source).context("PDF editing failed")?.len();
    if page_count == 0 {
        bail!("PDF has no pages");
    }
    let entries = parse_edits(&json).context("Invalid edits file")?;
    let total = entries.len();
    let operations = applicable_operations(entries, page_count);
    log::info!(
        "Applying {} of {} edits to {}",
        operations.len(),
        total,
        input.display()
    );

    let bytes = PdfExporter::with_config(config)
        .export(&source, &operations)
        .context("PDF editing failed")?;
    fs::write(output, bytes).with_context(|| format!("Failed to write {}", output.display()))?;

    Ok(Report::message(format!(
        "PDF edited successfully with {} operations applied to {} pages.",
        operations.len(),
        page_count
    )))
}

fn pages(input: &Path) -> Result<Report> {
    let source = fs::read(input).with_context(|| format!("Failed to read {}", input.display()))?;
    let sizes = page_sizes(&source).context("Failed to read page sizes")?;
    Ok(Report {
        success: true,
        pages: Some(
            sizes
                .into_iter()
                .map(|size| PageDimensions {
                    width: size.width,
                    height: size.height,
                })
                .collect(),
        ),
        ..Report::default()
    })
}

fn run(command: &Command) -> Result<Report> {
    match command {
        Command::Edit {
            input,
            output,
            edits,
            config,
        } => edit(input, output, edits, config.as_deref()),
        Command::Pages { input } => pages(input),
    }
}

fn main() -> ExitCode {
    env_logger::init();
    let cli = Cli::parse();

    let report = run(&cli.command).unwrap_or_else(|err| {
        log::error!("{:#}", err);
        Report::failure(&err)
    });
    match serde_json::to_string(&report) {
        Ok(json) => println!("{}", json),
        Err(err) => eprintln!("Failed to encode report: {}", err),
    }

    if report.success {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lopdf::{Document, Object, dictionary};
    use tempfile::TempDir;

    fn create_test_pdf(num_pages: usize) -> Vec<u8> {
        let mut doc = Document::with_version("1.7");
        let pages_id = doc.new_object_id();
        let mut kids = Vec::new();
        for _ in 0..num_pages {
            let page_id = doc.add_object(dictionary! {
                "Type" => "Page",
                "Parent" => Object::Reference(pages_id),
                "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
            });
            kids.push(Object::Reference(page_id));
        }
        doc.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => kids,
                "Count" => num_pages as i64,
            }),
        );
        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => Object::Reference(pages_id),
        });
        doc.trailer.set("Root", Object::Reference(catalog_id));

        let mut buffer = Vec::new();
        doc.save_to(&mut buffer).unwrap();
        buffer
    }

    struct Workspace {
        dir: TempDir,
    }

    impl Workspace {
        fn new(pages: usize, edits: &str) -> Self {
            let dir = tempfile::tempdir().unwrap();
            fs::write(dir.path().join("in.pdf"), create_test_pdf(pages)).unwrap();
            fs::write(dir.path().join("edits.json"), edits).unwrap();
            Self { dir }
        }

        fn path(&self, name: &str) -> PathBuf {
            self.dir.path().join(name)
        }

        fn edit(&self) -> Result<Report> {
            edit(
                &self.path("in.pdf"),
                &self.path("out.pdf"),
                &self.path("edits.json"),
                None,
            )
        }
    }

    #[test]
    fn test_edit_writes_pdf_and_reports_counts() {
        let ws = Workspace::new(
            2,
            r##"[
                {"type": "text", "page": 0, "x": 72, "y": 72, "text": "Approved"},
                {"type": "highlight", "page": 1, "x1": 50, "y1": 100, "x2": 300},
                {"type": "rectangle", "page": 1, "color": "#ff0000"}
            ]"##,
        );
        let report = ws.edit().unwrap();
        assert!(report.success);
        assert_eq!(
            report.message.as_deref(),
            Some("PDF edited successfully with 3 operations applied to 2 pages.")
        );

        let output = Document::load_mem(&fs::read(ws.path("out.pdf")).unwrap()).unwrap();
        assert_eq!(output.get_pages().len(), 2);
    }

    #[test]
    fn test_out_of_range_pages_are_skipped() {
        let ws = Workspace::new(
            1,
            r#"[
                {"type": "line", "page": 0},
                {"type": "line", "page": 4}
            ]"#,
        );
        let report = ws.edit().unwrap();
        assert_eq!(
            report.message.as_deref(),
            Some("PDF edited successfully with 1 operations applied to 1 pages.")
        );
    }

    #[test]
    fn test_invalid_images_and_empty_entries_are_skipped() {
        let ws = Workspace::new(
            1,
            r#"[
                {"type": "image", "imageData": "data:image/png;base64,AAAA"},
                {"type": "freehand", "points": [{"x": 1, "y": 1}]},
                {"type": "text", "text": ""},
                {"type": "eraser"}
            ]"#,
        );
        let report = ws.edit().unwrap();
        assert_eq!(
            report.message.as_deref(),
            Some("PDF edited successfully with 1 operations applied to 1 pages.")
        );
    }

    #[test]
    fn test_unknown_types_are_skipped() {
        let ws = Workspace::new(
            1,
            r#"[
                {"type": "stamp"},
                {"page": 0, "x1": 10},
                {"type": "rectangle"},
                {"type": "circle"}
            ]"#,
        );
        let report = ws.edit().unwrap();
        assert_eq!(
            report.message.as_deref(),
            Some("PDF edited successfully with 2 operations applied to 1 pages.")
        );
        assert!(ws.path("out.pdf").exists());
    }

    #[test]
    fn test_malformed_edits_file_fails() {
        let ws = Workspace::new(1, r#"[{"type": "line", "width": "wide"}]"#);
        let err = ws.edit().unwrap_err();
        let report = Report::failure(&err);
        assert!(!report.success);
        assert!(report.error.unwrap().contains("Invalid edits file"));
        assert!(!ws.path("out.pdf").exists());
    }

    #[test]
    fn test_missing_input_fails() {
        let ws = Workspace::new(1, "[]");
        let result = edit(
            &ws.path("missing.pdf"),
            &ws.path("out.pdf"),
            &ws.path("edits.json"),
            None,
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_config_file_is_applied() {
        let ws = Workspace::new(1, r#"[{"type": "highlight"}]"#);
        fs::write(ws.path("config.json"), r#"{"highlight_opacity": 0.8}"#).unwrap();
        let config = load_config(Some(&ws.path("config.json"))).unwrap();
        assert!((config.highlight_opacity - 0.8).abs() < f64::EPSILON);

        let report = edit(
            &ws.path("in.pdf"),
            &ws.path("out.pdf"),
            &ws.path("edits.json"),
            Some(&ws.path("config.json")),
        )
        .unwrap();
        assert!(report.success);
    }

    #[test]
    fn test_pages_lists_sizes() {
        let ws = Workspace::new(3, "[]");
        let report = pages(&ws.path("in.pdf")).unwrap();
        let sizes = report.pages.unwrap();
        assert_eq!(sizes.len(), 3);
        assert_eq!(
            sizes[0],
            PageDimensions {
                width: 612.0,
                height: 792.0
            }
        );
    }

    #[test]
    fn test_report_json_shape() {
        let json = serde_json::to_string(&Report::message("done".to_string())).unwrap();
        assert_eq!(json, r#"{"success":true,"message":"done"}"#);
    }
}
