use crate::config::Config;
use anyhow::{anyhow, Result};
use clap::Args;
use colored::Colorize;
use folio_document::KeyGenerator;
use folio_markup::{from_markup, to_markup_with, MarkupOptions};
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

#[derive(Debug, Args)]
pub struct RenderArgs {
    /// Markup file, or a directory of .html files
    #[arg(default_value = ".")]
    pub path: String,

    /// One block per line
    #[arg(long)]
    pub pretty: bool,

    /// Print the document tree as JSON instead of markup
    #[arg(long)]
    pub json: bool,

    /// Write results here instead of stdout
    #[arg(short, long)]
    pub out_dir: Option<String>,
}

pub fn render(args: RenderArgs, cwd: &str) -> Result<()> {
    let config = Config::load(cwd)?;
    let options = config.markup.options(args.pretty);
    let path = PathBuf::from(cwd).join(&args.path);

    let files = if path.is_dir() {
        find_markup_files(&path)
    } else if path.is_file() {
        vec![path.clone()]
    } else {
        return Err(anyhow!("Input path does not exist: {}", path.display()));
    };

    if files.is_empty() {
        eprintln!("{}", "⚠️  No .html files found".yellow());
        return Ok(());
    }

    let mut error_count = 0;
    for file in &files {
        match render_file(file, &args, &options) {
            Ok(output) => match &args.out_dir {
                Some(out_dir) => {
                    let target = output_path(file, &path, &PathBuf::from(cwd).join(out_dir), args.json);
                    if let Some(parent) = target.parent() {
                        fs::create_dir_all(parent)?;
                    }
                    fs::write(&target, output)?;
                    eprintln!("  {} {} → {}", "✓".green(), file.display(), target.display());
                }
                None => println!("{}", output),
            },
            Err(e) => {
                error_count += 1;
                eprintln!("  {} {} - {}", "✗".red(), file.display(), e.to_string().red());
            }
        }
    }

    if error_count > 0 {
        return Err(anyhow!("{} of {} files failed to render", error_count, files.len()));
    }
    Ok(())
}

fn render_file(file: &Path, args: &RenderArgs, options: &MarkupOptions) -> Result<String> {
    let source = fs::read_to_string(file)?;
    let name = file.file_name().and_then(|n| n.to_str()).unwrap_or("document");
    let mut keys = KeyGenerator::new(name);
    let snapshot = from_markup(&source, &mut keys)?;

    if args.json {
        return Ok(serde_json::to_string_pretty(&snapshot.to_templates())?);
    }

    let output = to_markup_with(&snapshot, options);
    for warning in &output.warnings {
        eprintln!("  {} {}: {}", "⚠".yellow(), name, warning);
    }
    Ok(output.markup)
}

fn find_markup_files(dir: &Path) -> Vec<PathBuf> {
    let mut files: Vec<PathBuf> = WalkDir::new(dir)
        .follow_links(true)
        .into_iter()
        .filter_map(|e| e.ok())
        .map(|entry| entry.into_path())
        .filter(|path| matches!(path.extension().and_then(|s| s.to_str()), Some("html" | "htm")))
        .collect();
    files.sort();
    files
}

fn output_path(file: &Path, input_root: &Path, out_dir: &Path, json: bool) -> PathBuf {
    let relative = file
        .strip_prefix(input_root)
        .ok()
        .filter(|relative| !relative.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new(file.file_name().unwrap_or(file.as_os_str())));
    let target = out_dir.join(relative);
    if json {
        target.with_extension("json")
    } else {
        target
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_output_path_keeps_relative_layout() {
        let out = output_path(
            Path::new("/docs/guide/intro.html"),
            Path::new("/docs"),
            Path::new("/out"),
            false,
        );
        assert_eq!(out, PathBuf::from("/out/guide/intro.html"));

        // a single file input lands directly in the output directory
        let out = output_path(
            Path::new("/docs/intro.html"),
            Path::new("/docs/intro.html"),
            Path::new("/out"),
            true,
        );
        assert_eq!(out, PathBuf::from("/out/intro.json"));
    }

    #[test]
    fn test_render_file_normalizes_markup() {
        let dir = std::env::temp_dir().join("folio-render-test");
        fs::create_dir_all(&dir).unwrap();
        let file = dir.join("page.html");
        fs::write(&file, "<div><b>Bold</b></div>\n<p>text</p>").unwrap();

        let args = RenderArgs {
            path: file.display().to_string(),
            pretty: false,
            json: false,
            out_dir: None,
        };
        let output = render_file(&file, &args, &MarkupOptions::default()).unwrap();
        assert_eq!(output, "<div><strong>Bold</strong></div><p>text</p>");
    }
}
