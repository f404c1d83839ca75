// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use pico_args::Arguments;

use tacsvg::{HttpAugmentor, LineStyle, Options, PatternKind, RuleCatalog, Session};

const HELP: &str = "\
tacsvg is a tactile graphics evaluation and transformation tool.

USAGE:
  tacsvg [OPTIONS] <in-svg> [<out-svg>]   # evaluate, transform, write
  tacsvg [OPTIONS] -c <in-svg>            # print the transformed SVG to stdout
  tacsvg [OPTIONS] - <out-svg>            # read the SVG from stdin

OPTIONS:
  -h, --help                Prints help information
  -V, --version             Prints version information
  -c                        Prints the transformed SVG to the stdout

  --report                  Prints the evaluation report for every
                            flagged element
  --augment URL             Augments rule-based findings through the
                            generation service at URL
  --rules FILE              Loads the rule catalog from FILE
                            [default: the bundled catalog]
  --timeout SECONDS         Sets the augmentation request timeout
                            [default: 30]

  --outline-width WIDTH     Sets the default outline thickness
                            [default: 1]
  --tile-size SIZE          Sets the default pattern tile size
                            [default: 20]
  --pattern ID=KIND         Fills the element ID with a pattern
                            [possible KIND values: dotted, stripes,
                            waves, crosshatch]
                            This option can be set multiple times
  --line-style ID=STYLE     Restyles the element ID's line
                            [possible STYLE values: original, primary,
                            secondary, dotted]
                            This option can be set multiple times
  --line-width ID=WIDTH     Overwrites the element ID's stroke width
                            This option can be set multiple times

  --quiet                   Disables warnings

ARGS:
  <in-svg>                  Input file
  <out-svg>                 Output file
";

#[derive(Debug)]
struct Args {
    report: bool,
    augment: Option<String>,
    rules: Option<PathBuf>,
    timeout: u64,

    outline_width: f64,
    tile_size: f64,
    patterns: Vec<(String, PatternKind)>,
    line_styles: Vec<(String, LineStyle)>,
    line_widths: Vec<(String, f64)>,

    to_stdout: bool,
    quiet: bool,

    input: String,
    output: Option<String>,
}

fn collect_args() -> Result<Args, pico_args::Error> {
    let mut input = Arguments::from_env();

    if input.contains(["-h", "--help"]) {
        print!("{}", HELP);
        std::process::exit(0);
    }

    if input.contains(["-V", "--version"]) {
        println!("{}", env!("CARGO_PKG_VERSION"));
        std::process::exit(0);
    }

    Ok(Args {
        report: input.contains("--report"),
        augment: input.opt_value_from_str("--augment")?,
        rules: input.opt_value_from_str("--rules")?,
        timeout: input
            .opt_value_from_fn("--timeout", parse_timeout)?
            .unwrap_or(30),

        outline_width: input
            .opt_value_from_fn("--outline-width", parse_size)?
            .unwrap_or(1.0),
        tile_size: input
            .opt_value_from_fn("--tile-size", parse_size)?
            .unwrap_or(20.0),
        patterns: input.values_from_fn("--pattern", parse_edit::<PatternKind>)?,
        line_styles: input.values_from_fn("--line-style", parse_edit::<LineStyle>)?,
        line_widths: input.values_from_fn("--line-width", parse_edit::<f64>)?,

        to_stdout: input.contains("-c"),
        quiet: input.contains("--quiet"),

        input: input.free_from_str()?,
        output: input.opt_free_from_str()?,
    })
}

fn parse_size(s: &str) -> Result<f64, String> {
    let n: f64 = s.parse().map_err(|_| "invalid number")?;

    if n.is_finite() && n > 0.0 {
        Ok(n)
    } else {
        Err("the value must be positive".to_string())
    }
}

fn parse_timeout(s: &str) -> Result<u64, String> {
    let n: u64 = s.parse().map_err(|_| "invalid number")?;

    if n > 0 {
        Ok(n)
    } else {
        Err("timeout cannot be zero".to_string())
    }
}

/// Parses an `ID=VALUE` per-element edit.
fn parse_edit<T>(s: &str) -> Result<(String, T), String>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    let (id, value) = s
        .split_once('=')
        .ok_or_else(|| format!("expected ID=VALUE, got '{}'", s))?;

    if id.is_empty() {
        return Err("element ID cannot be empty".to_string());
    }

    let value = value.parse().map_err(|e| format!("{}", e))?;
    Ok((id.to_string(), value))
}

fn main() {
    if let Err(e) = process() {
        eprintln!("Error: {}.", e);
        std::process::exit(1);
    }
}

fn process() -> Result<(), String> {
    let args = match collect_args() {
        Ok(args) => args,
        Err(e) => {
            println!("{}", HELP);
            return Err(e.to_string());
        }
    };

    if !args.quiet {
        if let Ok(()) = log::set_logger(&LOGGER) {
            log::set_max_level(log::LevelFilter::Warn);
        }
    }

    let svg_text = if args.input == "-" {
        use std::io::Read;
        let mut buf = String::new();
        let stdin = std::io::stdin();
        let mut handle = stdin.lock();
        handle
            .read_to_string(&mut buf)
            .map_err(|_| "failed to read stdin")?;
        buf
    } else {
        std::fs::read_to_string(&args.input).map_err(|_| "failed to open the provided file")?
    };

    let catalog = match args.rules {
        Some(ref path) => {
            let text = std::fs::read_to_string(path)
                .map_err(|_| "failed to open the rules file")?;
            RuleCatalog::from_json(&text).map_err(|e| e.to_string())?
        }
        None => RuleCatalog::bundled(),
    };

    let options = Options {
        outline_thickness: args.outline_width,
        pattern_tile_size: args.tile_size,
        request_timeout: Duration::from_secs(args.timeout),
        ..Options::default()
    };

    let mut session =
        Session::load(&svg_text, &catalog, &options).map_err(|e| e.to_string())?;

    if let Some(ref url) = args.augment {
        let augmentor =
            HttpAugmentor::new(url.clone(), options.request_timeout).map_err(|e| e.to_string())?;
        let rt = tokio::runtime::Runtime::new().map_err(|e| e.to_string())?;
        rt.block_on(session.augment(Arc::new(augmentor)));
    }

    for (id, kind) in &args.patterns {
        session.apply_pattern_fill(id, *kind);
    }
    for (id, style) in &args.line_styles {
        session.set_element_line_style(id, *style);
    }
    for (id, width) in &args.line_widths {
        session.set_element_line_thickness(id, *width);
    }

    if args.report {
        print_report(&session);
    }

    let transformed = session.transformed_svg();

    if let Some(ref output) = args.output {
        std::fs::write(output, &transformed).map_err(|_| "failed to write the output file")?;
    }

    if args.to_stdout {
        print!("{}", transformed);
    }

    Ok(())
}

fn print_report(session: &Session) {
    let flagged = session.report().flagged();
    if flagged.is_empty() {
        println!("No issues found.");
        return;
    }

    for (i, id) in flagged.iter().enumerate() {
        // `unwrap` is safe: flagged ids always have a finding.
        let finding = session.report().finding(id).unwrap();
        let tag = session
            .index()
            .get(id)
            .map(|info| info.tag.as_str())
            .unwrap_or("?");

        println!("ID: {} ({} of {})", id, i + 1, flagged.len());
        println!("Type: {}", tag);
        println!("Issues:");
        for issue in &finding.issues {
            println!("  - {}", issue);
        }
        if let Some(ref suggestion) = finding.suggestion {
            println!("Suggestions:");
            for line in suggestion.lines() {
                println!("  {}", line);
            }
        }
        if finding.degraded {
            println!("(augmentation unavailable for this element)");
        }
        println!();
    }
}

/// A simple stderr logger.
static LOGGER: SimpleLogger = SimpleLogger;
struct SimpleLogger;
impl log::Log for SimpleLogger {
    fn enabled(&self, metadata: &log::Metadata) -> bool {
        metadata.level() <= log::LevelFilter::Warn
    }

    fn log(&self, record: &log::Record) {
        if self.enabled(record.metadata()) {
            let target = if !record.target().is_empty() {
                record.target()
            } else {
                record.module_path().unwrap_or_default()
            };

            let line = record.line().unwrap_or(0);

            match record.level() {
                log::Level::Error => eprintln!("Error (in {}:{}): {}", target, line, record.args()),
                log::Level::Warn => eprintln!("Warning (in {}:{}): {}", target, line, record.args()),
                log::Level::Info => eprintln!("Info (in {}:{}): {}", target, line, record.args()),
                log::Level::Debug => eprintln!("Debug (in {}:{}): {}", target, line, record.args()),
                log::Level::Trace => eprintln!("Trace (in {}:{}): {}", target, line, record.args()),
            }
        }
    }

    fn flush(&self) {}
}
