//! seriesgen CLI
//!
//! Command-line interface for the seriesgen data generator:
//! - Describe a schema (tree view plus compiled summary)
//! - Generate line-protocol data for a time range
//! - Plan a schema from shape flags

use std::io::{self, BufWriter, Write};
use std::path::PathBuf;

use chrono::{NaiveTime, Utc};
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use seriesgen::schema::{walk_down, FieldSource, Flow, ScalarValue, Schema, SchemaNode};
use seriesgen::{Batch, MergedSeriesGenerator, Spec, TimeRange};

#[derive(Parser)]
#[command(name = "seriesgen")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Deterministic time-series data generator")]
#[command(
    long_about = "Compiles a declarative TOML schema into an ordered, deterministic stream\nof series for seeding and benchmarking time-series stores."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show a schema's structure and what it will generate
    Describe {
        /// Path to the schema TOML file
        schema: PathBuf,
        /// Emit the summary as JSON instead of text
        #[arg(long)]
        json: bool,
    },

    /// Generate data as line protocol on stdout
    Generate {
        /// Path to the schema TOML file
        schema: PathBuf,
        /// Range start: RFC 3339 or Unix nanoseconds (default: today 00:00 UTC)
        #[arg(long)]
        start: Option<String>,
        /// Range end: RFC 3339 or Unix nanoseconds (overrides --duration)
        #[arg(long)]
        end: Option<String>,
        /// Range length (e.g., 90s, 30m, 24h, 7d)
        #[arg(long, default_value = "24h")]
        duration: String,
        /// Stop after this many series
        #[arg(long)]
        max_series: Option<u64>,
    },

    /// Render a schema TOML from shape flags
    Plan {
        /// Comma-separated tag cardinalities, e.g. "100,10,4"
        #[arg(long, default_value = "10,10")]
        tags: String,
        /// Points per series
        #[arg(long, default_value = "1000")]
        points_per_series: u64,
        /// Number of measurements to render
        #[arg(long, default_value = "1")]
        measurements: u32,
        /// Cap on total series
        #[arg(long)]
        series_limit: Option<u64>,
        /// Output path (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "seriesgen=info".into()),
        ))
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Describe { schema, json } => describe(&schema, json),
        Commands::Generate {
            schema,
            start,
            end,
            duration,
            max_series,
        } => generate(&schema, start, end, &duration, max_series),
        Commands::Plan {
            tags,
            points_per_series,
            measurements,
            series_limit,
            output,
        } => plan(&tags, points_per_series, measurements, series_limit, output),
    }
}

fn load_schema(path: &PathBuf) -> Schema {
    match Schema::from_path(path) {
        Ok(schema) => schema,
        Err(e) => {
            eprintln!("schema error: {e}");
            std::process::exit(1);
        }
    }
}

fn compile_schema(schema: &Schema) -> Spec {
    match Spec::from_schema(schema) {
        Ok(spec) => spec,
        Err(e) => {
            eprintln!("schema error: {e}");
            std::process::exit(1);
        }
    }
}

fn describe(path: &PathBuf, json: bool) -> Result<(), Box<dyn std::error::Error>> {
    let schema = load_schema(path);
    let spec = compile_schema(&schema);

    let total_series = spec
        .measurements
        .iter()
        .fold(0u64, |acc, m| acc.saturating_add(m.series_count()));
    let total_points = spec.measurements.iter().fold(0u64, |acc, m| {
        acc.saturating_add(m.series_count().saturating_mul(m.points_per_series()))
    });

    if json {
        let rows: Vec<serde_json::Value> = spec
            .measurements
            .iter()
            .map(|m| {
                serde_json::json!({
                    "measurement": m.name,
                    "field": m.field.name,
                    "type": m.field.data_type().to_string(),
                    "tags": m.tags.tags.len(),
                    "series": m.series_count(),
                    "points_per_series": m.points_per_series(),
                    "points": m.series_count().saturating_mul(m.points_per_series()),
                })
            })
            .collect();
        let doc = serde_json::json!({
            "title": schema.title,
            "series_limit": spec.series_limit,
            "measurements": rows,
            "total_series": total_series,
            "total_points": total_points,
        });
        println!("{}", serde_json::to_string_pretty(&doc)?);
        return Ok(());
    }

    print!("{}", render_schema_tree(&schema));
    println!();

    let name_w = spec
        .measurements
        .iter()
        .map(|m| m.name.len())
        .max()
        .unwrap_or(0)
        .max("measurement".len());
    let field_w = spec
        .measurements
        .iter()
        .map(|m| m.field.name.len())
        .max()
        .unwrap_or(0)
        .max("field".len());

    println!(
        "{:<name_w$}  {:<field_w$}  {:<8}  {:>5}  {:>12}  {:>13}  {:>14}",
        "measurement", "field", "type", "tags", "series", "points/series", "total points"
    );
    for m in &spec.measurements {
        println!(
            "{:<name_w$}  {:<field_w$}  {:<8}  {:>5}  {:>12}  {:>13}  {:>14}",
            m.name,
            m.field.name,
            m.field.data_type().to_string(),
            m.tags.tags.len(),
            m.series_count(),
            m.points_per_series(),
            m.series_count().saturating_mul(m.points_per_series()),
        );
    }
    println!();
    println!("total: {total_series} series, {total_points} points");
    if let Some(limit) = spec.series_limit {
        if limit < total_series {
            println!("series-limit {limit} caps the generated stream");
        }
    }

    Ok(())
}

fn render_schema_tree(schema: &Schema) -> String {
    let mut out = String::new();
    walk_down(
        &mut |node: SchemaNode<'_>| {
            match node {
                SchemaNode::Schema(s) => {
                    out.push_str(&format!("schema {:?}", s.title));
                    if let Some(limit) = s.series_limit {
                        out.push_str(&format!(" series-limit={limit}"));
                    }
                    out.push('\n');
                }
                SchemaNode::Measurement(m) => {
                    out.push_str(&format!("  measurement {:?}", m.name));
                    if let Some(limit) = m.series_limit {
                        out.push_str(&format!(" series-limit={limit}"));
                    }
                    out.push('\n');
                }
                SchemaNode::Tag(t) => {
                    let source = match &t.source {
                        seriesgen::schema::TagSource::Array(values) => {
                            format!("array({} values)", values.len())
                        }
                        seriesgen::schema::TagSource::Sequence {
                            template,
                            start,
                            count,
                        } => format!("sequence(format={template:?}, start={start}, count={count})"),
                    };
                    out.push_str(&format!("    tag {:?} {source}\n", t.name));
                }
                SchemaNode::Field(f) => {
                    out.push_str(&format!(
                        "    field {:?} count={} precision={} source={}\n",
                        f.name,
                        f.count,
                        f.time_precision,
                        field_source_label(&f.source)
                    ));
                }
                _ => {}
            }
            Flow::Descend
        },
        schema,
    );
    out
}

fn field_source_label(source: &FieldSource) -> String {
    match source {
        FieldSource::Constant(value) => match value {
            ScalarValue::Float(v) => format!("float constant {v}"),
            ScalarValue::Integer(v) => format!("integer constant {v}"),
            ScalarValue::String(v) => format!("string constant {v:?}"),
            ScalarValue::Boolean(v) => format!("boolean constant {v}"),
        },
        FieldSource::Array(values) => {
            let kind = match values {
                seriesgen::schema::ScalarArray::Float(_) => "float",
                seriesgen::schema::ScalarArray::Integer(_) => "integer",
                seriesgen::schema::ScalarArray::String(_) => "string",
                seriesgen::schema::ScalarArray::Boolean(_) => "boolean",
            };
            format!("{kind} array({} values)", values.len())
        }
    }
}

fn generate(
    path: &PathBuf,
    start: Option<String>,
    end: Option<String>,
    duration: &str,
    max_series: Option<u64>,
) -> Result<(), Box<dyn std::error::Error>> {
    let spec = compile_schema(&load_schema(path));

    let start_ns = match start.as_deref() {
        Some(s) => parse_time(s)?,
        None => Utc::now()
            .date_naive()
            .and_time(NaiveTime::MIN)
            .and_utc()
            .timestamp_nanos_opt()
            .ok_or("start timestamp out of range")?,
    };
    let end_ns = match end.as_deref() {
        Some(s) => parse_time(s)?,
        None => {
            let span = parse_duration(duration)?
                .num_nanoseconds()
                .ok_or("duration too large")?;
            start_ns.saturating_add(span)
        }
    };
    let range =
        TimeRange::try_new(start_ns, end_ns).ok_or("empty time range: end must be after start")?;

    tracing::info!("generating {} series over {}", spec.series_count(), range);
    let started = std::time::Instant::now();

    let stdout = io::stdout();
    let mut out = BufWriter::new(stdout.lock());
    let mut gen = spec.series_generator(range);
    let (series, points) = write_line_protocol(&mut out, &mut gen, max_series)?;
    out.flush()?;

    tracing::info!(
        "wrote {} series / {} points in {:.2?}",
        series,
        points,
        started.elapsed()
    );
    Ok(())
}

/// Writes every pending series as line protocol, one line per point
fn write_line_protocol(
    out: &mut impl Write,
    gen: &mut MergedSeriesGenerator,
    max_series: Option<u64>,
) -> io::Result<(u64, u64)> {
    let mut series = 0u64;
    let mut points = 0u64;

    while max_series.map_or(true, |max| series < max) && gen.next() {
        // The measurement, tags, and field name are constant per series.
        let mut prefix = String::with_capacity(64);
        push_escaped(&mut prefix, gen.measurement(), &[',', ' ']);
        for (k, v) in gen.tags() {
            prefix.push(',');
            push_escaped(&mut prefix, k, &[',', ' ', '=']);
            prefix.push('=');
            push_escaped(&mut prefix, v, &[',', ' ', '=']);
        }
        prefix.push(' ');
        push_escaped(&mut prefix, gen.field(), &[',', ' ', '=']);
        prefix.push('=');

        let values = gen.time_values();
        while values.next_batch() {
            let batch = values.batch();
            points += batch.len() as u64;
            match batch {
                Batch::Float { timestamps, values } => {
                    for (ts, v) in timestamps.iter().zip(values) {
                        writeln!(out, "{prefix}{v} {ts}")?;
                    }
                }
                Batch::Integer { timestamps, values } => {
                    for (ts, v) in timestamps.iter().zip(values) {
                        writeln!(out, "{prefix}{v}i {ts}")?;
                    }
                }
                Batch::String { timestamps, values } => {
                    for (ts, v) in timestamps.iter().zip(values) {
                        let escaped = v.replace('\\', "\\\\").replace('"', "\\\"");
                        writeln!(out, "{prefix}\"{escaped}\" {ts}")?;
                    }
                }
                Batch::Boolean { timestamps, values } => {
                    for (ts, v) in timestamps.iter().zip(values) {
                        writeln!(out, "{prefix}{v} {ts}")?;
                    }
                }
            }
        }
        series += 1;
    }

    Ok((series, points))
}

/// Appends a measurement, tag, or field identifier with the line-protocol
/// specials of that position backslash-escaped
fn push_escaped(out: &mut String, s: &str, specials: &[char]) {
    for c in s.chars() {
        if specials.contains(&c) {
            out.push('\\');
        }
        out.push(c);
    }
}

fn plan(
    tags: &str,
    points_per_series: u64,
    measurements: u32,
    series_limit: Option<u64>,
    output: Option<PathBuf>,
) -> Result<(), Box<dyn std::error::Error>> {
    let cardinalities = parse_cardinalities(tags)?;
    if points_per_series == 0 {
        return Err("points-per-series must be greater than zero".into());
    }
    if measurements == 0 {
        return Err("measurements must be greater than zero".into());
    }

    let rendered = render_plan_schema(&cardinalities, points_per_series, measurements, series_limit);

    // The rendered document must stand on its own, so compile it before
    // handing it out.
    let spec = Spec::from_toml(&rendered)?;
    tracing::info!(
        "planned {} series x {} points per series",
        spec.series_count(),
        points_per_series
    );

    match output {
        Some(path) => std::fs::write(&path, rendered)?,
        None => print!("{rendered}"),
    }
    Ok(())
}

fn parse_cardinalities(s: &str) -> Result<Vec<u64>, Box<dyn std::error::Error>> {
    let mut cardinalities = Vec::new();
    for part in s.split(',') {
        let n: u64 = part.trim().parse().map_err(|_| {
            format!("invalid tag cardinalities {s:?}: use comma-separated integers like 100,10,4")
        })?;
        if n == 0 {
            return Err(format!("invalid tag cardinalities {s:?}: counts must be positive").into());
        }
        cardinalities.push(n);
    }
    Ok(cardinalities)
}

fn render_plan_schema(
    cardinalities: &[u64],
    points_per_series: u64,
    measurements: u32,
    series_limit: Option<u64>,
) -> String {
    let per_measurement: u64 = cardinalities.iter().product();
    let mut out = String::new();
    out.push_str(&format!(
        "title = \"{} measurement(s), {} series each\"\n",
        measurements, per_measurement
    ));
    if let Some(limit) = series_limit {
        out.push_str(&format!("series-limit = {limit}\n"));
    }
    for m in 0..measurements {
        out.push('\n');
        out.push_str("[[measurements]]\n");
        out.push_str(&format!("name = \"m{m}\"\n"));
        out.push_str("tags = [\n");
        for (i, count) in cardinalities.iter().enumerate() {
            out.push_str(&format!(
                "    {{ name = \"tag{i}\", source = {{ type = \"sequence\", format = \"value{{}}\", start = 0, count = {count} }} }},\n"
            ));
        }
        out.push_str("]\n");
        out.push_str("fields = [\n");
        out.push_str(&format!(
            "    {{ name = \"v0\", count = {points_per_series}, source = 1.0 }},\n"
        ));
        out.push_str("]\n");
    }
    out
}

fn parse_time(s: &str) -> Result<i64, Box<dyn std::error::Error>> {
    if let Ok(dt) = chrono::DateTime::parse_from_rfc3339(s) {
        return dt
            .with_timezone(&Utc)
            .timestamp_nanos_opt()
            .ok_or_else(|| format!("timestamp {s:?} out of nanosecond range").into());
    }
    if let Ok(ns) = s.parse::<i64>() {
        return Ok(ns);
    }
    Err(format!("invalid time {s:?}: use RFC 3339 or Unix nanoseconds").into())
}

fn parse_duration(s: &str) -> Result<chrono::Duration, Box<dyn std::error::Error>> {
    let s = s.trim().to_lowercase();

    if let Some(secs) = s.strip_suffix('s') {
        Ok(chrono::Duration::seconds(secs.parse()?))
    } else if let Some(mins) = s.strip_suffix('m') {
        Ok(chrono::Duration::minutes(mins.parse()?))
    } else if let Some(hours) = s.strip_suffix('h') {
        Ok(chrono::Duration::hours(hours.parse()?))
    } else if let Some(days) = s.strip_suffix('d') {
        Ok(chrono::Duration::days(days.parse()?))
    } else if let Some(weeks) = s.strip_suffix('w') {
        Ok(chrono::Duration::weeks(weeks.parse()?))
    } else {
        Err(format!("Invalid duration format: {}. Use: 90s, 30m, 24h, 7d, 2w", s).into())
    }
}
