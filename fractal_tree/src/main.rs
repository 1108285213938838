//! tree_dump — generate one tree headlessly and report on it.

use anyhow::{Context, Result};
use clap::Parser;
use fractal_tree::{generate, segment_bound, InputMapper, Point, TreeAngles, TreeParams};

#[derive(Parser)]
#[command(name = "tree_dump")]
#[command(version)]
#[command(about = "Generate a fractal tree without a window and print its segments", long_about = None)]
struct Cli {
    /// Origin x (window pixels)
    #[arg(short, long, default_value = "450")]
    x: f64,

    /// Origin y (window pixels)
    #[arg(short, long, default_value = "550")]
    y: f64,

    /// Trunk length in pixels
    #[arg(short, long, default_value = "200")]
    size: f64,

    /// Length ratio between levels, strictly between 0 and 1
    #[arg(short, long, default_value = "0.65")]
    decay: f64,

    /// Branching levels
    #[arg(short = 'D', long, default_value = "10")]
    depth: u32,

    /// Fork splay in degrees
    #[arg(short, long, default_value = "45")]
    tilt: f64,

    /// Per-level lean in degrees
    #[arg(short, long, default_value = "10")]
    bias: f64,

    /// Derive tilt/bias from a pointer "X,Y" instead of --tilt/--bias
    #[arg(short, long, value_parser = parse_pair)]
    pointer: Option<(f64, f64)>,

    /// Frame size "WxH" used with --pointer
    #[arg(short, long, default_value = "900x750", value_parser = parse_frame)]
    frame: (u32, u32),

    /// Segments to print (0 = summary only)
    #[arg(short, long, default_value = "8")]
    limit: usize,
}

fn parse_pair(s: &str) -> Result<(f64, f64), String> {
    let (a, b) = s.split_once(',').ok_or("expected X,Y")?;
    let a = a.trim().parse::<f64>().map_err(|e| format!("{a}: {e}"))?;
    let b = b.trim().parse::<f64>().map_err(|e| format!("{b}: {e}"))?;
    Ok((a, b))
}

fn parse_frame(s: &str) -> Result<(u32, u32), String> {
    let (w, h) = s.split_once(|c: char| c == 'x' || c == 'X').ok_or("expected WxH")?;
    let w = w.trim().parse::<u32>().map_err(|e| format!("{w}: {e}"))?;
    let h = h.trim().parse::<u32>().map_err(|e| format!("{h}: {e}"))?;
    if w == 0 || h == 0 {
        return Err("frame dimensions must be non-zero".into());
    }
    Ok((w, h))
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_secs()
        .init();

    let cli = Cli::parse();

    let angles = match cli.pointer {
        Some((px, py)) => {
            let mapper = InputMapper::new(cli.frame.0, cli.frame.1);
            mapper.angles(Point::new(px, py))
        }
        None => TreeAngles::from_degrees(cli.tilt, cli.bias),
    };

    let params = TreeParams::new(Point::new(cli.x, cli.y), cli.size, cli.decay, cli.depth)
        .context("invalid tree parameters")?
        .with_angles(angles);

    let segments = generate(&params);
    log::info!(
        "generated {} segments (bound {})",
        segments.len(),
        segment_bound(params.max_depth())
    );

    let (mut min_x, mut min_y) = (f64::INFINITY, f64::INFINITY);
    let (mut max_x, mut max_y) = (f64::NEG_INFINITY, f64::NEG_INFINITY);
    for p in segments.iter().flat_map(|s| [s.start, s.end]) {
        min_x = min_x.min(p.x);
        min_y = min_y.min(p.y);
        max_x = max_x.max(p.x);
        max_y = max_y.max(p.y);
    }

    println!();
    println!("  tilt     : {:.2}°", angles.tilt_degrees());
    println!("  bias     : {:.2}°", angles.bias_degrees());
    println!("  segments : {} / {}", segments.len(), segment_bound(params.max_depth()));
    println!("  bounds   : ({:.1}, {:.1}) – ({:.1}, {:.1})", min_x, min_y, max_x, max_y);

    if cli.limit > 0 {
        println!();
        for (i, s) in segments.iter().take(cli.limit).enumerate() {
            println!(
                "  {:>5}  ({:>8.2}, {:>8.2}) → ({:>8.2}, {:>8.2})  len {:.2}",
                i, s.start.x, s.start.y, s.end.x, s.end.y, s.length()
            );
        }
        if segments.len() > cli.limit {
            println!("  …  ({} more)", segments.len() - cli.limit);
        }
    }
    println!();

    Ok(())
}
