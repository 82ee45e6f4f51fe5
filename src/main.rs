use std::fs::File;
use std::io::{self, BufRead, BufReader, Write};
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use stmd::{BlockParser, HtmlRenderer, RenderOptions};

#[derive(Parser)]
#[command(name = "stmd", version, about = "Convert Markdown to HTML")]
struct Cli {
    /// Input files, read in order as one document. Reads stdin when empty.
    files: Vec<PathBuf>,

    /// Print the parsed block tree instead of HTML
    #[arg(long)]
    ast: bool,

    /// Text emitted for a soft line break
    #[arg(long, value_name = "STR", default_value = "\n", hide_default_value = true)]
    soft_break: String,
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    let cli = Cli::parse();

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("{err:#}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli) -> Result<()> {
    let mut parser = BlockParser::new();
    let mut line_number = 0;

    if cli.files.is_empty() {
        feed(&mut parser, io::stdin().lock(), "stdin", &mut line_number)?;
    } else {
        for path in &cli.files {
            let file = File::open(path).with_context(|| format!("cannot open {}", path.display()))?;
            let source = path.display().to_string();
            feed(&mut parser, BufReader::new(file), &source, &mut line_number)?;
        }
    }
    log::debug!("read {line_number} lines");

    let doc = parser.finalize(line_number + 1);
    let output = if cli.ast {
        doc.to_string()
    } else {
        let renderer = HtmlRenderer::new(RenderOptions {
            soft_break: cli.soft_break.clone(),
            ..RenderOptions::default()
        });
        renderer.render(doc)
    };

    let mut stdout = io::stdout().lock();
    stdout.write_all(output.as_bytes())?;
    stdout.flush()?;
    Ok(())
}

fn feed(
    parser: &mut BlockParser,
    reader: impl BufRead,
    source: &str,
    line_number: &mut usize,
) -> Result<()> {
    for line in reader.lines() {
        let line = line.with_context(|| format!("failed to read {source}"))?;
        *line_number += 1;
        let line = line.strip_suffix('\r').unwrap_or(&line);
        parser
            .incorporate_line(line, *line_number)
            .map_err(|err| anyhow::anyhow!("Error incorporating {err}"))?;
    }
    Ok(())
}
