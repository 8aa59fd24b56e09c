use std::path::Path;

use chunkfit::{
    error_map::{Axis, ErrorMap},
    statistics, InterpolationConfig, Signal, SignalProcessor,
};

const USAGE: &str = "Usage: chunkfit <path> [kind=polynomial|spline] [order=<n>] [chunks=<n>] \
[overlap=<percent>] [smoothing=<0-100>] [clip=<percent>] [fsample=<hz>] [error_map=<axis>,<axis>] [json]";

/// Signal as read from a JSON file. Either `fsample` or `time` must be present.
#[derive(serde::Deserialize)]
struct Input {
    magnitude: Vec<f64>,
    fsample: Option<f64>,
    time: Option<Vec<f64>>,
}

fn fail(message: impl std::fmt::Display) -> ! {
    eprintln!("{message}");
    std::process::exit(1);
}

fn parse_option<V: std::str::FromStr>(name: &str, value: &str) -> V {
    value
        .parse()
        .unwrap_or_else(|_| fail(format!("Invalid {name} value: {value}")))
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    //
    // First argument is the path to a CSV or JSON file with the signal.
    let Some(path) = std::env::args().nth(1) else {
        fail(USAGE);
    };
    if path == "help" || path == "--help" || path == "-h" {
        eprintln!("{USAGE}");
        std::process::exit(0);
    }
    let path = Path::new(&path);

    let mut kind = None;
    let mut order = 1;
    let mut chunks = 1;
    let mut overlap = 0.0;
    let mut smoothing = 0.0;
    let mut clip = 0.0;
    let mut fsample = None;
    let mut axes = None;
    let mut json = false;
    for arg in std::env::args().skip(2) {
        let (name, value) = arg.split_once('=').unwrap_or((arg.as_str(), ""));
        match name {
            "kind" => kind = Some(value.to_string()),
            "order" => order = parse_option("order", value),
            "chunks" => chunks = parse_option("chunks", value),
            "overlap" => overlap = parse_option("overlap", value),
            "smoothing" => smoothing = parse_option("smoothing", value),
            "clip" => clip = parse_option("clip", value),
            "fsample" => fsample = Some(parse_option("fsample", value)),
            "error_map" => {
                let Some((x, y)) = value.split_once(',') else {
                    fail(format!("error_map expects two axes, got: {value}"));
                };
                let x: Axis = x.parse().unwrap_or_else(|e| fail(e));
                let y: Axis = y.parse().unwrap_or_else(|e| fail(e));
                axes = Some((x, y));
            }
            "json" => json = true,
            "help" | "--help" | "-h" => {
                eprintln!("{USAGE}");
                std::process::exit(0);
            }
            _ => fail(format!("Unknown option: {arg}\n{USAGE}")),
        }
    }

    let Ok(contents) = std::fs::read_to_string(path) else {
        fail(format!("Failed to read file: {}", path.display()));
    };

    let signal = match path.extension().and_then(|s| s.to_str()) {
        Some("csv") => read_csv(&contents, fsample),
        Some("json") => {
            let input: Input = serde_json::from_str(&contents)
                .unwrap_or_else(|err| fail(format!("Failed to parse JSON: {err}")));
            Signal::from_parts(
                input.magnitude,
                fsample.or(input.fsample),
                input.time,
                Vec::new(),
            )
            .unwrap_or_else(|e| fail(e))
        }
        _ => fail(format!("Unsupported file format: {}", path.display())),
    };

    let config = InterpolationConfig::parse(kind.as_deref(), order, chunks, overlap, smoothing)
        .unwrap_or_else(|e| fail(e));

    let mut processor = SignalProcessor::new(signal);
    processor.set_clipping(clip).unwrap_or_else(|e| fail(e));
    processor
        .init_interpolation(config)
        .unwrap_or_else(|e| fail(e));
    processor.extrapolate().unwrap_or_else(|e| fail(e));

    if let Some((x, y)) = axes {
        let map = ErrorMap::compute(&processor, x, y).unwrap_or_else(|e| fail(e));
        if json {
            let summary = serde_json::to_string_pretty(&map.summary())
                .unwrap_or_else(|e| fail(e));
            println!("{summary}");
        } else {
            print_error_map(&map);
        }
        std::process::exit(0);
    }

    if json {
        let output = serde_json::json!({
            "config": processor.config(),
            "interpolated": processor.interpolated(),
            "extrapolated": processor.extrapolated(),
            "percentage_error": processor.percentage_error().ok(),
        });
        println!("{output:#}");
    } else {
        print_report(&processor);
    }
}

/// One column is magnitude at `fsample`, two columns are time then magnitude.
/// A first line that does not parse is taken as a header.
fn read_csv(contents: &str, fsample: Option<f64>) -> Signal {
    fn parse_line(line: &str) -> Option<Vec<f64>> {
        line.split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(|s| s.parse().ok())
            .collect()
    }

    let mut rows = Vec::new();
    for (i, line) in contents.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        match parse_line(line) {
            Some(row) if !row.is_empty() => rows.push(row),
            _ if i == 0 => {}
            _ => fail(format!("Failed to parse line {}: {}", i + 1, line)),
        }
    }

    let columns = rows.first().map_or(0, Vec::len);
    if rows.iter().any(|row| row.len() != columns) {
        fail("Every CSV row must have the same number of columns");
    }

    let result = match columns {
        1 => Signal::from_parts(rows.into_iter().map(|r| r[0]).collect(), fsample, None, Vec::new()),
        2 => {
            let (time, magnitude): (Vec<f64>, Vec<f64>) = rows.into_iter().map(|r| (r[0], r[1])).unzip();
            Signal::from_parts(magnitude, fsample, Some(time), Vec::new())
        }
        _ => fail("CSV must have one (magnitude) or two (time, magnitude) columns"),
    };
    result.unwrap_or_else(|e| fail(e))
}

fn print_report(processor: &SignalProcessor) {
    let original = processor.original();
    println!(
        "{} samples at {} Hz, fitting {} ({}% clipped)",
        original.len(),
        original.fsample(),
        processor.clipped().len(),
        processor.clip_percentage()
    );

    if let Some(config) = processor.config() {
        println!("{} of order {}", config.kind, config.order);
    }

    let mut index = 0;
    while let Ok(equation) = processor.chunk_equation(index) {
        println!("  chunk {index}: {equation}");
        index += 1;
    }

    match processor.percentage_error() {
        Ok(error) => println!("Percentage error: {error:.4}%"),
        Err(e) => println!("Percentage error: {e}"),
    }

    if let Some(fitted) = processor.interpolated() {
        let rmse = statistics::root_mean_squared_error(
            processor.clipped().magnitude().iter().copied(),
            fitted.magnitude().iter().copied(),
        );
        println!("RMSE over the fitted range: {rmse:.6}");
    }

    if let Some(tail) = processor.extrapolated().filter(|s| !s.is_empty()) {
        println!("Extrapolated {} samples:", tail.len());
        for (t, m) in tail.points() {
            println!("  {t:.4}, {m:.6}");
        }
    }
}

fn print_error_map(map: &ErrorMap) {
    println!(
        "Mean absolute percentage error, rows: {}, columns: {}",
        map.x_axis().label(),
        map.y_axis().label()
    );

    print!("{:>8}", "");
    for y in map.y_values() {
        print!("{y:>10}");
    }
    println!();

    for (i, x) in map.x_values().iter().enumerate() {
        print!("{x:>8}");
        for j in 0..map.y_values().len() {
            match map.error(i, j) {
                Some(error) if error.is_finite() => print!("{error:>10.4}"),
                _ => print!("{:>10}", "-"),
            }
        }
        println!();
    }

    for failure in map.failures() {
        println!(
            "{} = {}, {} = {}: {}",
            map.x_axis(),
            map.x_values()[failure.x_index],
            map.y_axis(),
            map.y_values()[failure.y_index],
            failure.message
        );
    }

    if let Some((x, y, error)) = map.best() {
        println!(
            "Best: {} = {x}, {} = {y} ({error:.4}%)",
            map.x_axis(),
            map.y_axis()
        );
    }
}
