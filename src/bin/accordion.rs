use std::path::PathBuf;
use std::sync::Arc;

use accordion::{
    AccordionController, AccordionOpts, CachePolicy, ContentSurface, ImageSurface, Size,
    build_folds_for_frame,
};
use anyhow::Context as _;
use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "accordion", version)]
struct Cli {
    /// Log geometry and cache activity to stderr.
    #[arg(long, short, global = true, default_value_t = false)]
    verbose: bool,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Fold an image and write the composite as a PNG.
    Fold(FoldArgs),
    /// Print the fold state and projected panel quads as JSON.
    Panels(PanelsArgs),
}

#[derive(Parser, Debug)]
struct FoldArgs {
    /// Input image (any format `image` can decode).
    #[arg(long = "in")]
    in_path: PathBuf,

    /// Output PNG path.
    #[arg(long)]
    out: PathBuf,

    /// Number of folds; the image is split into twice as many panels.
    #[arg(long, default_value_t = 3)]
    folds: u32,

    /// Folded width in pixels (defaults to the image width, i.e. flat).
    #[arg(long)]
    width: Option<f64>,

    /// Viewer distance in pixels; 0 disables perspective.
    #[arg(long, default_value_t = 0.0)]
    distance: f64,

    /// Accordion options JSON.
    #[arg(long)]
    opts: Option<PathBuf>,
}

#[derive(Parser, Debug)]
struct PanelsArgs {
    /// Unfolded content width.
    #[arg(long)]
    natural_width: f64,

    /// Unfolded content height.
    #[arg(long)]
    natural_height: f64,

    /// Number of folds.
    #[arg(long, default_value_t = 3)]
    folds: u32,

    /// Folded width.
    #[arg(long)]
    width: f64,

    /// Viewer distance in pixels; 0 disables perspective.
    #[arg(long, default_value_t = 0.0)]
    distance: f64,

    /// Accordion options JSON.
    #[arg(long)]
    opts: Option<PathBuf>,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    match cli.cmd {
        Command::Fold(args) => cmd_fold(args),
        Command::Panels(args) => cmd_panels(args),
    }
}

fn init_tracing(verbose: bool) {
    let level = if verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::WARN
    };
    let _ = tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .try_init();
}

fn load_opts(path: Option<&PathBuf>) -> anyhow::Result<AccordionOpts> {
    match path {
        Some(p) => {
            AccordionOpts::from_path(p).with_context(|| format!("load opts '{}'", p.display()))
        }
        None => Ok(AccordionOpts::default()),
    }
}

fn cmd_fold(args: FoldArgs) -> anyhow::Result<()> {
    let mut opts = load_opts(args.opts.as_ref())?;
    opts.cache_policy = CachePolicy::Eager;

    let surface = ImageSurface::open(&args.in_path)?;
    let natural = Size::new(f64::from(surface.width()), f64::from(surface.height()));
    let mut ctl = AccordionController::with_opts(natural, args.folds, opts)?;
    ctl.attach_content(Arc::new(surface));
    ctl.set_frame(
        Size::new(args.width.unwrap_or(natural.width), natural.height),
        false,
    )?;
    ctl.set_distance(args.distance)?;

    let composite = ctl.composite();
    let image = match composite.image {
        Some(image) if !composite.dirty => image,
        _ => anyhow::bail!("failed to render '{}'", args.in_path.display()),
    };
    let rgba = image
        .to_rgba_image()
        .context("composite buffer does not match its dimensions")?;

    if let Some(parent) = args.out.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create output dir '{}'", parent.display()))?;
    }
    rgba.save_with_format(&args.out, image::ImageFormat::Png)
        .with_context(|| format!("write png '{}'", args.out.display()))?;

    eprintln!(
        "wrote {} ({}x{}, {} panels)",
        args.out.display(),
        image.width,
        image.height,
        ctl.fold_state().panels().len()
    );
    Ok(())
}

fn cmd_panels(args: PanelsArgs) -> anyhow::Result<()> {
    let opts = load_opts(args.opts.as_ref())?;
    let natural = Size::new(args.natural_width, args.natural_height);
    let fold = build_folds_for_frame(
        natural,
        args.folds,
        Size::new(args.width, natural.height),
        opts.min_fold_ratio,
    )?;
    let quads = fold.project(args.distance)?;
    let out = serde_json::json!({
        "fold": fold,
        "distance": args.distance,
        "quads": quads.as_slice(),
    });
    println!("{}", serde_json::to_string_pretty(&out)?);
    Ok(())
}
