use std::error::Error;
use std::fs;
use std::io::{self, Read, Write};

use clap::Parser;
use serde::Serialize;
use serde_json::Value;
use serde_rehydrate::{Graph, RehydrateOptions};

#[derive(Parser, Debug)]
#[command(name = "rehydrate", version, about = "Rehydrate a decycled JSON document")]
struct Args {
    /// Input file path. Omit or use '-' to read from stdin.
    input: Option<String>,

    /// Output file path (prints to stdout if omitted).
    #[arg(short, long, value_name = "file")]
    output: Option<String>,

    /// Validate only: exit non-zero if the document does not rehydrate.
    #[arg(long)]
    check: bool,

    /// Print node, shared-node, and cycle statistics instead of JSON.
    #[arg(long)]
    stats: bool,

    /// Treat an object as a marker only when `$ref` is its sole member.
    #[arg(long = "strict-markers")]
    strict_markers: bool,

    /// Maximum input nesting depth.
    #[arg(
        long = "max-depth",
        value_name = "number",
        default_value_t = serde_rehydrate::options::DEFAULT_MAX_DEPTH
    )]
    max_depth: usize,

    /// Indentation for JSON output (0 for compact).
    #[arg(long, value_name = "number", default_value_t = 2)]
    indent: usize,
}

fn main() {
    if let Err(err) = run() {
        eprintln!("ERROR  {err}");
        std::process::exit(1);
    }
}

fn run() -> Result<(), Box<dyn Error>> {
    let args = Args::parse();
    let input = read_input(args.input.as_deref())?;

    let options = RehydrateOptions::new()
        .with_max_depth(args.max_depth)
        .with_strict_markers(args.strict_markers);
    let graph = serde_rehydrate::from_str_with_options(&input, &options)?;

    if args.check {
        return Ok(());
    }

    if args.stats {
        return with_output_writer(args.output.as_deref(), |writer| {
            print_stats(writer, &graph)
        });
    }

    // Tree-only export: a graph with restored sharing or cycles has no plain
    // JSON form, which to_value reports as an error.
    let value = graph.to_value()?;
    with_output_writer(args.output.as_deref(), |writer| {
        write_json(writer, &value, args.indent)?;
        writer.write_all(b"\n")?;
        Ok(())
    })
}

fn read_input(input: Option<&str>) -> Result<String, Box<dyn Error>> {
    match input {
        None | Some("-") => {
            let mut buf = String::new();
            io::stdin().read_to_string(&mut buf)?;
            Ok(buf)
        }
        Some(path) => Ok(fs::read_to_string(path)?),
    }
}

fn with_output_writer<F>(path: Option<&str>, f: F) -> Result<(), Box<dyn Error>>
where
    F: FnOnce(&mut dyn Write) -> Result<(), Box<dyn Error>>,
{
    match path {
        Some(path) if path != "-" => {
            let mut file = fs::File::create(path)?;
            f(&mut file)
        }
        _ => {
            let stdout = io::stdout();
            let mut handle = stdout.lock();
            f(&mut handle)
        }
    }
}

fn write_json(writer: &mut dyn Write, value: &Value, indent: usize) -> Result<(), Box<dyn Error>> {
    if indent == 0 {
        serde_json::to_writer(writer, value)?;
        return Ok(());
    }

    let indent_bytes = vec![b' '; indent];
    let formatter = serde_json::ser::PrettyFormatter::with_indent(&indent_bytes);
    let mut serializer = serde_json::Serializer::with_formatter(writer, formatter);
    value.serialize(&mut serializer)?;
    Ok(())
}

fn print_stats(writer: &mut dyn Write, graph: &Graph) -> Result<(), Box<dyn Error>> {
    writeln!(writer, "nodes: {}", graph.len())?;
    writeln!(writer, "shared: {}", graph.shared_node_count())?;
    writeln!(
        writer,
        "cyclic: {}",
        if graph.has_cycle() { "yes" } else { "no" }
    )?;
    Ok(())
}
