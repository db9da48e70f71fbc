//! mill – command-line invoice builder and PDF exporter.
//!
//! Usage:
//!   mill [snapshot.json] [output.pdf] [--sample] [--theme dark|light|system]
//!
//! Without a snapshot argument the invoice comes from the saved state under
//! `--state-dir` (when given) or from a blank document. The PDF lands at
//! `output.pdf`, defaulting to `invoice-<timestamp>.pdf` in the current
//! directory.

use std::{env, fs, path::PathBuf, process};

use invoice_mill::export::{export_filename, export_invoice, ExportOptions};
use invoice_mill::model::{sample_invoice, InvoiceState};
use invoice_mill::preview::{render_invoice, PreviewOptions};
use invoice_mill::state::{reduce, Action};
use invoice_mill::store::SnapshotStore;
use invoice_mill::theme::{resolve, ThemeSelector};

fn main() {
    env_logger::init();

    let args: Vec<String> = env::args().collect();

    let mut snapshot_path: Option<PathBuf> = None;
    let mut output_path: Option<PathBuf> = None;
    let mut use_sample = false;
    let mut theme: Option<ThemeSelector> = None;
    let mut state_dir: Option<PathBuf> = None;
    let mut clear = false;
    let mut preview_path: Option<PathBuf> = None;
    let mut positional = 0usize;

    let mut iter = args.iter().skip(1).peekable();
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--sample" | "-s" => use_sample = true,
            "--clear" => clear = true,
            "--theme" | "-t" => match iter.next().map(|v| parse_theme(v)) {
                Some(Some(t)) => theme = Some(t),
                Some(None) => {
                    eprintln!("Error: --theme expects dark, light or system.");
                    process::exit(1);
                }
                None => {
                    eprintln!("Error: --theme needs a value.");
                    process::exit(1);
                }
            },
            "--state-dir" | "-d" => match iter.next() {
                Some(v) => state_dir = Some(PathBuf::from(v)),
                None => {
                    eprintln!("Error: --state-dir needs a value.");
                    process::exit(1);
                }
            },
            "--preview" | "-p" => match iter.next() {
                Some(v) => preview_path = Some(PathBuf::from(v)),
                None => {
                    eprintln!("Error: --preview needs a value.");
                    process::exit(1);
                }
            },
            "--help" | "-h" => {
                print_usage(&args[0]);
                process::exit(0);
            }
            other if other.starts_with('-') => {
                eprintln!("Unknown flag: {other}");
                print_usage(&args[0]);
                process::exit(1);
            }
            path => {
                if positional == 0 {
                    snapshot_path = Some(PathBuf::from(path));
                } else if positional == 1 {
                    output_path = Some(PathBuf::from(path));
                } else {
                    eprintln!("Unexpected argument: {path}");
                    print_usage(&args[0]);
                    process::exit(1);
                }
                positional += 1;
            }
        }
    }

    let store = state_dir.map(SnapshotStore::new);

    if clear {
        let store = match &store {
            Some(s) => s,
            None => {
                eprintln!("Error: --clear needs --state-dir.");
                process::exit(1);
            }
        };
        if let Err(e) = store.remove() {
            eprintln!("Error clearing saved invoice: {e}");
            process::exit(1);
        }
        eprintln!("Cleared saved invoice in '{}'.", store.dir().display());
        process::exit(0);
    }

    let mut state = if use_sample {
        sample_invoice()
    } else if let Some(path) = &snapshot_path {
        let text = match fs::read_to_string(path) {
            Ok(s) => s,
            Err(e) => {
                eprintln!("Error reading '{}': {e}", path.display());
                process::exit(1);
            }
        };
        let mut state: InvoiceState = match serde_json::from_str(&text) {
            Ok(s) => s,
            Err(e) => {
                eprintln!("Error parsing '{}': {e}", path.display());
                process::exit(1);
            }
        };
        state.ensure_items();
        state
    } else {
        store
            .as_ref()
            .and_then(|s| s.load())
            .unwrap_or_default()
    };

    if let Some(theme) = theme {
        state = reduce(&state, Action::SetPdfTheme(theme));
    }

    if let Some(store) = &store {
        if let Err(e) = store.save(&state) {
            eprintln!("Warning: could not save invoice state: {e}");
        }
    }

    // Default output: timestamped name in the current directory.
    let output = output_path.unwrap_or_else(|| PathBuf::from(export_filename()));

    let title = if state.invoice_number.trim().is_empty() {
        "Invoice".to_string()
    } else {
        format!("Invoice {}", state.invoice_number.trim())
    };
    let options = ExportOptions {
        title,
        ..ExportOptions::default()
    };

    if let Some(preview) = &preview_path {
        let palette = resolve(state.pdf_theme, options.system_prefers_dark);
        let png = render_invoice(&state, &PreviewOptions::default(), palette)
            .and_then(|raster| raster.to_png());
        match png {
            Ok(bytes) => {
                if let Err(e) = fs::write(preview, &bytes) {
                    eprintln!("Error writing '{}': {e}", preview.display());
                    process::exit(1);
                }
                eprintln!("Wrote '{}' ({} bytes)", preview.display(), bytes.len());
            }
            Err(e) => {
                eprintln!("Error rendering preview: {e}");
                process::exit(1);
            }
        }
    }

    match export_invoice(&state, options) {
        Ok((bytes, plan)) => {
            // Create output directory if necessary.
            if let Some(parent) = output.parent() {
                if !parent.as_os_str().is_empty() {
                    if let Err(e) = fs::create_dir_all(parent) {
                        eprintln!("Error creating output directory: {e}");
                        process::exit(1);
                    }
                }
            }
            if let Err(e) = fs::write(&output, &bytes) {
                eprintln!("Error writing '{}': {e}", output.display());
                process::exit(1);
            }
            let pages = plan.page_count();
            eprintln!(
                "Wrote '{}' ({} bytes, {} page{})",
                output.display(),
                bytes.len(),
                pages,
                if pages == 1 { "" } else { "s" }
            );
        }
        Err(e) => {
            eprintln!("Error exporting invoice: {e}");
            process::exit(1);
        }
    }
}

fn parse_theme(value: &str) -> Option<ThemeSelector> {
    match value {
        "dark" => Some(ThemeSelector::Dark),
        "light" => Some(ThemeSelector::Light),
        "system" => Some(ThemeSelector::System),
        _ => None,
    }
}

fn print_usage(prog: &str) {
    eprintln!("mill – invoice builder and PDF exporter (invoice-mill)");
    eprintln!();
    eprintln!("Usage:");
    eprintln!("  {prog} [snapshot.json] [output.pdf] [flags]");
    eprintln!();
    eprintln!("Arguments:");
    eprintln!("  [snapshot.json]  Invoice snapshot to render (default: saved state, else a blank invoice)");
    eprintln!("  [output.pdf]     Output path  (default: invoice-<timestamp>.pdf)");
    eprintln!();
    eprintln!("Flags:");
    eprintln!("  --sample, -s       Render the built-in sample invoice");
    eprintln!("  --theme, -t        PDF theme: dark, light or system (system falls back to light)");
    eprintln!("  --state-dir, -d    Directory holding the saved invoice snapshot");
    eprintln!("  --clear            Delete the saved snapshot and exit (needs --state-dir)");
    eprintln!("  --preview, -p      Also write the preview raster as a PNG");
    eprintln!("  --help             Print this message");
}
