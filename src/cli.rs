use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{ArgAction, Parser};
use cvpress::{generate, GenerateRequest, PaperSize, PdfOptions, Renderer};

pub const DEFAULT_TEMPLATE: &str = "modern.html.j2";
const PDF_FILE_NAME: &str = "cv.pdf";
const HTML_FILE_NAME: &str = "cv.html";

#[derive(Parser, Debug)]
#[command(
    name = "cvpress",
    version,
    about = "Generate a CV PDF and HTML from YAML or JSON data and a template"
)]
pub struct Cli {
    #[arg(
        long,
        visible_alias = "yaml",
        value_name = "FILE",
        required_unless_present = "list_templates",
        help = "CV data file (.yaml, .yml or .json)"
    )]
    pub input: Option<PathBuf>,
    #[arg(long, default_value = DEFAULT_TEMPLATE, help = "Template name inside the templates directory")]
    pub template: String,
    #[arg(
        long,
        value_name = "PATH",
        required_unless_present = "list_templates",
        help = "PDF file, or a directory to write cv.pdf and cv.html into"
    )]
    pub output: Option<PathBuf>,
    #[arg(long, value_name = "PATH", help = "Also write the rendered HTML here")]
    pub html: Option<PathBuf>,
    #[arg(long, value_enum, ignore_case = true, default_value_t = PaperSize::A4)]
    pub paper_size: PaperSize,
    #[arg(
        long,
        value_name = "DIR",
        env = "CVPRESS_TEMPLATES_DIR",
        default_value = "templates"
    )]
    pub templates_dir: PathBuf,
    #[arg(long, default_value_t = false, help = "Do not paint backgrounds")]
    pub no_background: bool,
    #[arg(long, default_value_t = false, help = "List available templates and exit")]
    pub list_templates: bool,
    #[arg(short, long, action = ArgAction::Count, help = "More log output (-v, -vv, -vvv)")]
    pub verbose: u8,
}

/// Where the PDF and HTML go.
#[derive(Debug, PartialEq)]
pub struct OutputPaths {
    pub pdf: PathBuf,
    pub html: Option<PathBuf>,
}

impl OutputPaths {
    /// An existing directory, or a path without a `.pdf` extension, is an
    /// output directory receiving `cv.pdf` and `cv.html`. Otherwise `output`
    /// is the PDF itself and HTML is written only when asked for.
    pub fn resolve(output: &Path, html: Option<&Path>) -> Self {
        let is_pdf = output
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case("pdf"));

        if output.is_dir() || !is_pdf {
            Self {
                pdf: output.join(PDF_FILE_NAME),
                html: Some(
                    html.map(Path::to_path_buf)
                        .unwrap_or_else(|| output.join(HTML_FILE_NAME)),
                ),
            }
        } else {
            Self {
                pdf: output.to_path_buf(),
                html: html.map(Path::to_path_buf),
            }
        }
    }
}

pub fn run(cli: Cli) -> anyhow::Result<()> {
    if cli.list_templates {
        let renderer = Renderer::new(&cli.templates_dir);
        let names = renderer.templates().with_context(|| {
            format!("cannot list templates in {}", cli.templates_dir.display())
        })?;
        for name in names {
            println!("{name}");
        }
        return Ok(());
    }

    let (Some(input), Some(output)) = (cli.input, cli.output) else {
        anyhow::bail!("--input and --output are required");
    };

    let paths = OutputPaths::resolve(&output, cli.html.as_deref());
    let request = GenerateRequest {
        input,
        template: cli.template,
        templates_dir: cli.templates_dir,
        pdf_path: paths.pdf,
        html_path: paths.html,
        options: PdfOptions::new()
            .paper_size(cli.paper_size)
            .print_background(!cli.no_background),
    };

    let report = generate(&request)?;

    println!("✓ CV generated: {}", report.pdf.path.display());
    if let Some(html) = report.html {
        println!("✓ HTML exported: {}", html.display());
    }
    Ok(())
}
