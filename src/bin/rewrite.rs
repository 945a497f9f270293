// wbrewrite CLI
//
// Thin entry point around the rewriting core, the ops-convenience
// counterpart to examples/nexora240-lgtm-Internex's C ABI wrapping the same
// rewriting logic for a Go host process — here the host is a shell.
//
// Reads an HTML document (file path argument, or stdin if omitted), applies
// `UrlRewriter` + `HtmlRewriter` with the given archive coordinates, and
// writes the rewritten document to stdout.

use std::fs;
use std::io::{self, Read, Write};
use std::process::ExitCode;

use clap::Parser;

use wbrewrite::{HtmlRewriterBuilder, UrlRewriter, WbUrl};

#[derive(Parser, Debug)]
#[command(name = "wbrewrite", about = "Rewrite an archived HTML document's URLs for replay")]
struct Args {
    /// Path to the HTML document to rewrite. Reads stdin if omitted.
    input: Option<String>,

    /// Archive mount path prepended to every rewritten URL.
    #[arg(long, default_value = "/web/")]
    prefix: String,

    /// Capture timestamp stamped onto every rewritten URL.
    #[arg(long)]
    timestamp: String,

    /// Default resource-type modifier (e.g. `im_`, `js_`); most callers
    /// leave this empty and rely on per-attribute modifiers.
    #[arg(long, default_value = "")]
    modifier: String,

    /// The document's original URL, used to resolve relative references.
    #[arg(long)]
    target_url: String,

    /// Fragment to inject once into the document's head.
    #[arg(long)]
    head_insert: Option<String>,
}

fn run(args: Args) -> io::Result<()> {
    let html = match &args.input {
        Some(path) => fs::read_to_string(path)?,
        None => {
            let mut buf = String::new();
            io::stdin().read_to_string(&mut buf)?;
            buf
        }
    };

    let wburl = WbUrl::new(args.timestamp, args.modifier, args.target_url);
    let url_rewriter = UrlRewriter::new(wburl, args.prefix);

    let mut builder = HtmlRewriterBuilder::new(url_rewriter);
    if let Some(fragment) = args.head_insert {
        builder = builder.head_insert(fragment);
    }
    let mut rewriter = builder.build();

    let stdout = io::stdout();
    let mut out = stdout.lock();

    match rewriter.rewrite(&html) {
        Ok(chunk) => out.write_all(chunk.as_bytes())?,
        Err(e) => return Err(io::Error::new(io::ErrorKind::Other, e)),
    }
    match rewriter.close() {
        Ok(chunk) => out.write_all(chunk.as_bytes())?,
        Err(e) => return Err(io::Error::new(io::ErrorKind::Other, e)),
    }

    Ok(())
}

fn main() -> ExitCode {
    env_logger::init();
    let args = Args::parse();
    match run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("wbrewrite: {e}");
            ExitCode::FAILURE
        }
    }
}
