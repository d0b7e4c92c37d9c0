//! ivetool - inspect and convert IVE files.

use std::collections::{BTreeMap, HashSet};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use rayon::prelude::*;
use tracing::{debug, info, warn};
use tracing_subscriber::prelude::*;
use tracing_subscriber::EnvFilter;

use ive::prelude::*;
use ive::DataInputStream;

fn main() {
    let args: Vec<String> = env::args().collect();

    // Parse global flags
    let mut level = "info";
    let mut filtered_args: Vec<&str> = Vec::new();
    for arg in &args[1..] {
        match arg.as_str() {
            "-v" | "--verbose" => level = "debug",
            "-vv" | "--trace" => level = "trace",
            "-q" | "--quiet" => level = "error",
            _ => filtered_args.push(arg),
        }
    }
    init_tracing(level);

    if filtered_args.is_empty() {
        print_help();
        return;
    }

    if let Err(e) = run(&filtered_args) {
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    }
}

fn init_tracing(level: &str) {
    let filter = EnvFilter::try_from_env("IVE_LOG").unwrap_or_else(|_| EnvFilter::new(level));
    let subscriber = tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_target(false).with_writer(std::io::stderr));
    // A subscriber may already be installed when embedded; keep that one.
    let _ = tracing::subscriber::set_global_default(subscriber);
}

fn run(args: &[&str]) -> Result<()> {
    match args[0] {
        "info" | "i" => cmd_info(arg(args, 1, "ivetool info <file.ive>")?),
        "tree" | "t" => cmd_tree(arg(args, 1, "ivetool tree <file.ive>")?),
        "dump" | "d" => {
            let path = arg(args, 1, "ivetool dump <file.ive> [--json]")?;
            let json = args.iter().any(|&s| s == "--json" || s == "-j");
            cmd_dump(path, json)
        }
        "convert" | "c" => {
            let usage = "ivetool convert <in.ive> <out.ive> [options]";
            cmd_convert(arg(args, 1, usage)?, arg(args, 2, usage)?, &args[3.min(args.len())..].join(" "))
        }
        "batch" | "b" => {
            let usage = "ivetool batch <in_dir> <out_dir> [options]";
            cmd_batch(arg(args, 1, usage)?, arg(args, 2, usage)?, &args[3.min(args.len())..].join(" "))
        }
        "version" | "-V" | "--version" => {
            println!(
                "ivetool {} (IVE format {}, built {} {})",
                env!("CARGO_PKG_VERSION"),
                ive::stream::version::VERSION,
                env!("IVE_BUILD_DATE"),
                env!("IVE_BUILD_TIME")
            );
            Ok(())
        }
        "help" | "h" | "-h" | "--help" => {
            print_help();
            Ok(())
        }
        // Default: if file exists, show info; otherwise error
        other => {
            if Path::new(other).exists() {
                cmd_info(other)
            } else {
                print_help();
                bail!("unknown command: {other}")
            }
        }
    }
}

fn arg<'a>(args: &[&'a str], index: usize, usage: &str) -> Result<&'a str> {
    args.get(index)
        .copied()
        .with_context(|| format!("missing argument\nUsage: {usage}"))
}

fn print_help() {
    println!("ivetool - IVE file toolkit");
    println!();
    println!("USAGE:");
    println!("    ivetool [OPTIONS] <COMMAND> [ARGS]");
    println!();
    println!("COMMANDS:");
    println!("    i, info    <file>                     Show stream header and object counts");
    println!("    t, tree    <file>                     Show the node hierarchy");
    println!("    d, dump    <file> [--json]            Dump nodes, drawables and state");
    println!("    c, convert <in> <out> [options]       Re-write a file with writer options");
    println!("    b, batch   <in_dir> <out_dir> [opts]  Convert every .ive file in a directory");
    println!("    version                               Show tool and format version");
    println!("    h, help                               Show this help");
    println!();
    println!("OPTIONS:");
    println!("    -v, --verbose    Show debug output");
    println!("    -vv, --trace     Show trace output (very verbose)");
    println!("    -q, --quiet      Only show errors");
    println!();
    println!("WRITER OPTIONS:");
    println!("    compressed[=level]          zlib-compress the payload");
    println!("    noTexturesInIVEFile         Store image file names only");
    println!("    includeImageFileInIVEFile   Embed the original image files");
    println!("    compressImageData           Embed images re-encoded as png/jpg");
    println!("    inlineExternalReferencesInIVEFile");
    println!("    OutputTextureFiles");
    println!("    maximumErrorToSizeRatio=<f> version=<n> byteOrder=<big|little|native>");
    println!();
    println!("EXAMPLES:");
    println!("    ivetool info city.ive");
    println!("    ivetool convert city.ive city_z.ive compressed version=33");
    println!("    ivetool batch tiles/ packed/ compressed noTexturesInIVEFile");
    println!();
    println!("The IVE_LOG environment variable overrides the log filter.");
}

fn open(path: &str) -> Result<NodeRef> {
    info!("Opening file: {}", path);
    read_node_file(path, &ReadOptions::default()).with_context(|| format!("failed to read {path}"))
}

/// Unique object counts of a graph.
#[derive(Default)]
struct Counts {
    nodes: BTreeMap<&'static str, usize>,
    drawables: BTreeMap<&'static str, usize>,
    state_sets: usize,
    images: usize,
    vertices: usize,
    seen: HashSet<usize>,
}

impl Counts {
    /// True the first time a shared object is seen.
    fn first<T>(&mut self, obj: &Arc<T>) -> bool {
        self.seen.insert(Arc::as_ptr(obj) as *const () as usize)
    }

    fn visit_state(&mut self, state: &Option<StateSetRef>) {
        let Some(state) = state else { return };
        if !self.first(state) {
            return;
        }
        self.state_sets += 1;
        let attributes = state.attributes.iter().chain(state.texture_attributes.iter().flatten());
        for a in attributes {
            for image in a.attribute.kind.images() {
                if self.first(image) {
                    self.images += 1;
                }
            }
        }
    }

    fn visit(&mut self, node: &NodeRef) {
        if !self.first(node) {
            return;
        }
        *self.nodes.entry(node.kind.class_name()).or_default() += 1;
        self.visit_state(&node.core.state_set);
        for d in node.drawables() {
            if !self.first(d) {
                continue;
            }
            *self.drawables.entry(d.kind.class_name()).or_default() += 1;
            if let DrawableKind::Geometry(g) = &d.kind {
                self.vertices += g.num_vertices();
            }
            self.visit_state(&d.core.state_set);
        }
        for child in node.children() {
            self.visit(child);
        }
    }
}

fn cmd_info(path: &str) -> Result<()> {
    let bytes = fs::read(path).with_context(|| format!("failed to read {path}"))?;
    let header = DataInputStream::new(bytes.as_slice(), ReadOptions::default())
        .with_context(|| format!("{path} is not an IVE file"))?;
    println!("File: {}", path);
    println!("Version: {}", header.version());
    println!("Byte order: {:?}", header.byte_order());
    println!("Compression: {}", header.compression_level());
    println!();

    let root = open(path)?;
    let mut counts = Counts::default();
    counts.visit(&root);
    debug!("Visited {} unique objects", counts.seen.len());

    println!("Nodes:");
    for (class, n) in &counts.nodes {
        println!("  {:<28} {}", class, n);
    }
    println!("Drawables:");
    for (class, n) in &counts.drawables {
        println!("  {:<28} {}", class, n);
    }
    println!();
    println!("State sets: {}", counts.state_sets);
    println!("Images:     {}", counts.images);
    println!("Vertices:   {}", counts.vertices);
    Ok(())
}

fn cmd_tree(path: &str) -> Result<()> {
    let root = open(path)?;
    println!("File: {}", path);
    println!();
    print_tree(&root, 0);
    Ok(())
}

fn print_tree(node: &NodeRef, depth: usize) {
    let indent = "  ".repeat(depth);
    let name = if node.name().is_empty() { "<unnamed>" } else { node.name() };
    let drawables = node.drawables().len();
    if drawables > 0 {
        println!("{}{} [{}] ({} drawables)", indent, name, node.kind.class_name(), drawables);
    } else {
        println!("{}{} [{}]", indent, name, node.kind.class_name());
    }
    for child in node.children() {
        print_tree(child, depth + 1);
    }
}

fn cmd_dump(path: &str, json: bool) -> Result<()> {
    let root = open(path)?;
    if json {
        let doc = serde_json::json!({ "file": path, "root": node_json(&root) });
        println!("{}", serde_json::to_string_pretty(&doc)?);
    } else {
        dump_node(&root, 0);
    }
    Ok(())
}

fn state_json(state: &Option<StateSetRef>) -> serde_json::Value {
    match state {
        None => serde_json::Value::Null,
        Some(s) => serde_json::json!({
            "name": s.object.name,
            "modes": s.modes.iter().map(|m| serde_json::json!([m.mode, m.value])).collect::<Vec<_>>(),
            "attributes": s.attributes.iter().map(|a| a.attribute.kind.class_name()).collect::<Vec<_>>(),
            "texture_units": s.texture_attributes.len(),
            "uniforms": s.uniforms.iter().map(|u| u.uniform.object.name.clone()).collect::<Vec<_>>(),
        }),
    }
}

fn node_json(node: &NodeRef) -> serde_json::Value {
    let drawables: Vec<_> = node
        .drawables()
        .iter()
        .map(|d| {
            let vertices = match &d.kind {
                DrawableKind::Geometry(g) => g.num_vertices(),
                DrawableKind::ShapeDrawable(_) => 0,
            };
            serde_json::json!({
                "type": d.kind.class_name(),
                "name": d.object.name,
                "vertices": vertices,
                "state": state_json(&d.core.state_set),
            })
        })
        .collect();
    serde_json::json!({
        "type": node.kind.class_name(),
        "name": node.name(),
        "mask": node.core.node_mask,
        "descriptions": node.core.descriptions,
        "state": state_json(&node.core.state_set),
        "drawables": drawables,
        "children": node.children().iter().map(node_json).collect::<Vec<_>>(),
    })
}

fn dump_node(node: &NodeRef, depth: usize) {
    let indent = "  ".repeat(depth);
    println!("{}[{}] {} mask=0x{:08x}", indent, node.kind.class_name(), node.name(), node.core.node_mask);
    if let Some(state) = &node.core.state_set {
        dump_state(state, &indent);
    }
    for d in node.drawables() {
        match &d.kind {
            DrawableKind::Geometry(g) => println!(
                "{}  Geometry '{}': {} vertices, {} primitive sets",
                indent,
                d.object.name,
                g.num_vertices(),
                g.primitive_sets.len()
            ),
            DrawableKind::ShapeDrawable(s) => {
                println!("{}  ShapeDrawable '{}': color {:?}", indent, d.object.name, s.color)
            }
        }
        if let Some(state) = &d.core.state_set {
            dump_state(state, &format!("{indent}  "));
        }
    }
    for child in node.children() {
        dump_node(child, depth + 1);
    }
}

fn dump_state(state: &StateSet, indent: &str) {
    println!(
        "{}  state: {} modes, {} attributes, {} texture units, {} uniforms",
        indent,
        state.modes.len(),
        state.attributes.len(),
        state.texture_attributes.len(),
        state.uniforms.len()
    );
}

fn cmd_convert(input: &str, output: &str, options: &str) -> Result<()> {
    let options: WriteOptions = options.parse().context("invalid writer options")?;
    let root = open(input)?;
    write_node_file(&root, output, &options).with_context(|| format!("failed to write {output}"))?;
    println!("Wrote {} (version {}, compression {})", output, options.version, options.compression_level);
    Ok(())
}

fn cmd_batch(input_dir: &str, output_dir: &str, options: &str) -> Result<()> {
    let options: WriteOptions = options.parse().context("invalid writer options")?;
    let output_dir = PathBuf::from(output_dir);
    fs::create_dir_all(&output_dir).with_context(|| format!("failed to create {}", output_dir.display()))?;

    let mut inputs = Vec::new();
    for entry in fs::read_dir(input_dir).with_context(|| format!("failed to list {input_dir}"))? {
        let path = entry?.path();
        let is_ive = path
            .extension()
            .map(|e| e.eq_ignore_ascii_case("ive"))
            .unwrap_or(false);
        if is_ive && path.is_file() {
            inputs.push(path);
        }
    }
    inputs.sort();
    info!("Converting {} files", inputs.len());

    let failures: Vec<(PathBuf, ive::Error)> = inputs
        .par_iter()
        .filter_map(|path| {
            let Some(name) = path.file_name() else { return None };
            let out = output_dir.join(name);
            let result = read_node_file(path, &ReadOptions::default())
                .and_then(|root| write_node_file(&root, &out, &options));
            match result {
                Ok(()) => {
                    debug!("Converted {}", path.display());
                    None
                }
                Err(e) => {
                    warn!("Failed to convert {}: {}", path.display(), e);
                    Some((path.clone(), e))
                }
            }
        })
        .collect();

    println!("Converted {} of {} files", inputs.len() - failures.len(), inputs.len());
    if !failures.is_empty() {
        for (path, e) in &failures {
            eprintln!("  {}: {}", path.display(), e);
        }
        bail!("{} files failed", failures.len());
    }
    Ok(())
}
