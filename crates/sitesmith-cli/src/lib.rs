//! Command-line front end for sitesmith.
//!
//! Reads a JSON site description (the form fields), then previews a page,
//! prints the sanitized context, or writes the site archive.

use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use sitesmith::export::archive_file_name;
use sitesmith::{FeedConfig, Page, ProductFeed, SiteBuilder, SiteInput, SiteRenderer};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
#[command(name = "sitesmith")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Directory holding index.html.j2 and the optional about/contact templates
    #[arg(long, global = true, default_value = "templates")]
    pub templates: PathBuf,

    /// Do not fetch product feeds
    #[arg(long, global = true)]
    pub offline: bool,

    /// Product feed request timeout in seconds
    #[arg(long, global = true, default_value_t = 10)]
    pub feed_timeout: u64,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Render one page as it will appear in the archive
    Preview {
        /// Site description JSON file, or - for stdin
        #[arg(short, long)]
        input: PathBuf,
        /// Page to render
        #[arg(short, long, value_enum, default_value_t = PageArg::Home)]
        page: PageArg,
        /// Write the page here instead of stdout
        #[arg(short, long)]
        out: Option<PathBuf>,
    },
    /// Print the sanitized rendering context as JSON
    Context {
        /// Site description JSON file, or - for stdin
        #[arg(short, long)]
        input: PathBuf,
    },
    /// Write the zip archive of the whole site
    Export {
        /// Site description JSON file, or - for stdin
        #[arg(short, long)]
        input: PathBuf,
        /// Archive path; defaults to <business_name>_final.zip
        #[arg(short, long)]
        out: Option<PathBuf>,
    },
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum PageArg {
    Home,
    About,
    Contact,
    Privacy,
    Terms,
}

impl From<PageArg> for Page {
    fn from(arg: PageArg) -> Self {
        match arg {
            PageArg::Home => Page::Home,
            PageArg::About => Page::About,
            PageArg::Contact => Page::Contact,
            PageArg::Privacy => Page::Privacy,
            PageArg::Terms => Page::Terms,
        }
    }
}

/// Run the parsed command line
pub fn run(cli: Cli) -> Result<()> {
    let builder = builder_for(&cli)?;

    match &cli.command {
        Command::Preview { input, page, out } => {
            let input = read_input(input)?;
            let html = builder.render_preview((*page).into(), &input);
            match out {
                Some(path) => write_file(path, html.as_bytes())?,
                None => println!("{html}"),
            }
        }
        Command::Context { input } => {
            let input = read_input(input)?;
            let ctx = builder.sanitize(&input);
            println!("{}", serde_json::to_string_pretty(&ctx)?);
        }
        Command::Export { input, out } => {
            let input = read_input(input)?;
            let archive = builder.build_zip(&input).context("failed to build site archive")?;
            let path = out
                .clone()
                .unwrap_or_else(|| PathBuf::from(archive_file_name(&input.biz_name)));
            write_file(&path, &archive)?;
            println!("Wrote {} ({} bytes)", path.display(), archive.len());
        }
    }

    Ok(())
}

fn builder_for(cli: &Cli) -> Result<SiteBuilder> {
    let renderer = SiteRenderer::new(&cli.templates)
        .with_context(|| format!("failed to open templates at {}", cli.templates.display()))?;
    let builder = SiteBuilder::from_renderer(renderer);
    if cli.offline {
        return Ok(builder);
    }

    let feed = ProductFeed::new(&FeedConfig {
        timeout: Duration::from_secs(cli.feed_timeout),
        ..FeedConfig::default()
    })
    .context("failed to create product feed client")?;
    Ok(builder.with_feed(feed))
}

fn read_input(path: &Path) -> Result<SiteInput> {
    let text = if path == Path::new("-") {
        let mut text = String::new();
        io::stdin()
            .read_to_string(&mut text)
            .context("failed to read site description from stdin")?;
        text
    } else {
        fs::read_to_string(path)
            .with_context(|| format!("failed to read site description {}", path.display()))?
    };

    log::debug!("read site description {} ({} bytes)", path.display(), text.len());
    SiteInput::from_json(&text)
        .with_context(|| format!("invalid site description {}", path.display()))
}

fn write_file(path: &Path, contents: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }
    fs::write(path, contents).with_context(|| format!("failed to write {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    struct Workspace {
        dir: TempDir,
    }

    impl Workspace {
        fn new() -> Self {
            let dir = TempDir::new().unwrap();
            let templates = dir.path().join("templates");
            fs::create_dir(&templates).unwrap();
            fs::write(templates.join("index.html.j2"), "<h1>{{ biz_name }}</h1>").unwrap();
            fs::write(
                dir.path().join("site.json"),
                r#"{"biz_name": "Red Hippo", "prod_url": "https://example.com"}"#,
            )
            .unwrap();
            Self { dir }
        }

        fn path(&self, name: &str) -> PathBuf {
            self.dir.path().join(name)
        }

        fn parse(&self, args: &[&str]) -> Cli {
            let templates = self.path("templates");
            let mut argv = vec![
                "sitesmith".to_string(),
                "--offline".to_string(),
                "--templates".to_string(),
                templates.display().to_string(),
            ];
            argv.extend(args.iter().map(|a| a.to_string()));
            Cli::try_parse_from(argv).unwrap()
        }
    }

    #[test]
    fn test_preview_to_file() {
        let ws = Workspace::new();
        let input = ws.path("site.json");
        let out = ws.path("out/about.html");
        let cli = ws.parse(&[
            "preview",
            "--input",
            input.to_str().unwrap(),
            "--page",
            "about",
            "--out",
            out.to_str().unwrap(),
        ]);

        run(cli).unwrap();
        assert_eq!(fs::read_to_string(out).unwrap(), "<h1>Red Hippo</h1>");
    }

    #[test]
    fn test_export_writes_archive() {
        let ws = Workspace::new();
        let input = ws.path("site.json");
        let out = ws.path("site.zip");
        let cli = ws.parse(&[
            "export",
            "--input",
            input.to_str().unwrap(),
            "--out",
            out.to_str().unwrap(),
        ]);

        run(cli).unwrap();
        let bytes = fs::read(out).unwrap();
        assert_eq!(&bytes[..2], b"PK");
    }

    #[test]
    fn test_missing_templates_is_an_error() {
        let ws = Workspace::new();
        let input = ws.path("site.json");
        let cli = Cli::try_parse_from([
            "sitesmith",
            "--templates",
            ws.path("nope").to_str().unwrap(),
            "context",
            "--input",
            input.to_str().unwrap(),
        ])
        .unwrap();

        assert!(run(cli).is_err());
    }

    #[test]
    fn test_invalid_input_is_an_error() {
        let ws = Workspace::new();
        let input = ws.path("broken.json");
        fs::write(&input, "{").unwrap();
        let cli = ws.parse(&["context", "--input", input.to_str().unwrap()]);

        assert!(run(cli).is_err());
    }

    #[test]
    fn test_page_arg_parsing() {
        let cli = Cli::try_parse_from(["sitesmith", "preview", "-i", "site.json", "-p", "terms"]).unwrap();
        match cli.command {
            Command::Preview { page, .. } => assert_eq!(Page::from(page), Page::Terms),
            other => panic!("unexpected command {other:?}"),
        }
    }
}
