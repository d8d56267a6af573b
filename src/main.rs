use anyhow::{bail, Context};
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};
use wordglyph::assets::{self, AssetSource, DirectorySource};
use wordglyph::glyph;
use wordglyph::platform::{CommandShare, FixedDelay, SettleSignal, ShareTarget};
use wordglyph::rendering::layout::{PADDING_STEPS, PALETTE};
use wordglyph::rendering::raster::{Rasterizer, ResvgRasterizer};
use wordglyph::{
    Background, DispatchOutcome, FileNaming, GeneratorConfig, OutputMode, ReadinessPolicy,
    RenderConfig, Session, SizePreset, Studio,
};

#[derive(Parser)]
#[command(name = "wordglyph", version, about = "Spell messages with glyph images and save them as PNG")]
struct Cli {
    /// TOML configuration file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Directory containing `letters/<CHAR>.<ext>`
    #[arg(long, global = true)]
    assets: Option<PathBuf>,

    /// Base URL of a web asset store (requires the `http` feature)
    #[arg(long, global = true)]
    asset_url: Option<String>,

    /// Directory downloads are written to
    #[arg(long, short, global = true)]
    out: Option<PathBuf>,

    /// Abort a capture when any glyph fails to load
    #[arg(long, global = true)]
    strict: bool,

    /// Name files by timestamp instead of by text
    #[arg(long, global = true)]
    timestamp_names: bool,

    /// Keep letter case instead of folding to upper case
    #[arg(long, global = true)]
    keep_case: bool,

    /// Program used to share files, e.g. "xdg-open"; the file path is appended
    #[arg(long, global = true)]
    share_command: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Render one message and save (or share) it
    Render {
        text: String,
        #[command(flatten)]
        render: RenderArgs,
        /// Share instead of saving
        #[arg(long)]
        share: bool,
    },
    /// Edit and generate from line commands on stdin
    Interactive {
        #[command(flatten)]
        render: RenderArgs,
    },
    /// Print the background palette, padding steps and size presets
    Presets,
}

#[derive(Args)]
struct RenderArgs {
    /// Palette name, `transparent` or a hex color
    #[arg(long)]
    background: Option<Background>,
    /// Outer padding in pixels
    #[arg(long)]
    padding: Option<u32>,
    /// Glyph height in pixels
    #[arg(long)]
    height: Option<u32>,
    /// Canvas width in pixels
    #[arg(long)]
    width: Option<u32>,
    /// Fixed output size preset
    #[arg(long)]
    preset: Option<SizePreset>,
}

impl RenderArgs {
    fn apply(&self, base: RenderConfig) -> RenderConfig {
        RenderConfig {
            background: self.background.unwrap_or(base.background),
            padding_px: self.padding.unwrap_or(base.padding_px),
            glyph_height_px: self.height.unwrap_or(base.glyph_height_px),
            container_width_px: self.width.or(base.container_width_px),
            size_preset: self.preset.or(base.size_preset),
        }
    }
}

/// Asset store selected at startup
enum Store {
    Dir(DirectorySource),
    #[cfg(feature = "http")]
    Http(assets::HttpSource),
}

impl AssetSource for Store {
    async fn fetch(&self, path: &str) -> wordglyph::Result<Vec<u8>> {
        match self {
            Store::Dir(s) => s.fetch(path).await,
            #[cfg(feature = "http")]
            Store::Http(s) => s.fetch(path).await,
        }
    }
}

type CliStudio = Studio<Store, ResvgRasterizer, CommandShare, FixedDelay>;

fn load_config(cli: &Cli) -> anyhow::Result<GeneratorConfig> {
    let mut cfg = match &cli.config {
        Some(path) => GeneratorConfig::load(path)?,
        None => GeneratorConfig::default(),
    };
    if let Some(dir) = &cli.assets {
        cfg.assets.dir = dir.clone();
    }
    if let Some(url) = &cli.asset_url {
        cfg.assets.base_url = Some(url.clone());
    }
    if let Some(out) = &cli.out {
        cfg.output.dir = out.clone();
    }
    if cli.strict {
        cfg.readiness.policy = ReadinessPolicy::Strict;
    }
    if cli.timestamp_names {
        cfg.output.naming = FileNaming::Timestamp;
    }
    if cli.keep_case {
        cfg.input.uppercase = false;
    }
    Ok(cfg)
}

fn open_store(cfg: &GeneratorConfig) -> anyhow::Result<Store> {
    match &cfg.assets.base_url {
        #[cfg(feature = "http")]
        Some(url) => Ok(Store::Http(assets::HttpSource::new(url)?)),
        #[cfg(not(feature = "http"))]
        Some(_) => bail!("--asset-url needs the `http` feature"),
        None => Ok(Store::Dir(DirectorySource::new(&cfg.assets.dir))),
    }
}

fn share_target(command: Option<&str>) -> CommandShare {
    let mut parts = command.unwrap_or_default().split_whitespace().map(str::to_string);
    let mut share = CommandShare::new(parts.next().unwrap_or_default());
    share.args = parts.collect();
    share
}

fn print_presets() -> anyhow::Result<()> {
    let palette: Vec<_> = PALETTE
        .iter()
        .map(|(name, bg)| serde_json::json!({ "name": name, "value": bg.to_string() }))
        .collect();
    let sizes: Vec<_> = SizePreset::ALL
        .iter()
        .map(|p| {
            let (w, h) = p.dimensions();
            serde_json::json!({ "name": p.name(), "width": w, "height": h })
        })
        .collect();
    let doc = serde_json::json!({
        "backgrounds": palette,
        "padding_steps": PADDING_STEPS,
        "size_presets": sizes,
    });
    println!("{}", serde_json::to_string_pretty(&doc)?);
    Ok(())
}

fn report(outcome: Option<&DispatchOutcome>) {
    match outcome {
        Some(DispatchOutcome::Saved(path)) => println!("saved {}", path.display()),
        Some(DispatchOutcome::Shared) => println!("shared"),
        Some(DispatchOutcome::Cancelled) => println!("share cancelled"),
        None => {}
    }
}

fn status<S, R, T, W>(session: &Session, studio: &Studio<S, R, T, W>) -> serde_json::Value
where
    S: AssetSource,
    R: Rasterizer,
    T: ShareTarget,
    W: SettleSignal,
{
    let tree = session.preview(studio);
    serde_json::json!({
        "text": session.text(),
        "length": session.text().chars().count(),
        "max_len": session.input_policy().max_len,
        "glyphs": glyph::glyph_count(&studio.resolve(session.text())),
        "canvas": [tree.width, tree.height],
        "config": session.config(),
        "preloaded": studio.cache().map(|c| c.len()).unwrap_or(0),
        "policy": studio.policy(),
        "can_generate": session.can_generate(),
        "error": session.error(),
    })
}

/// Apply one line command; returns `false` on quit.
async fn interactive_step(session: &mut Session, studio: &CliStudio, line: &str) -> bool {
    let (cmd, arg) = match line.split_once(' ') {
        Some((c, a)) => (c, a),
        None => (line.trim(), ""),
    };
    let cfg = *session.config();
    let update = match cmd {
        "text" => {
            session.input(arg);
            None
        }
        "clear" => {
            session.clear();
            None
        }
        "bg" => arg.parse().map(|background| RenderConfig { background, ..cfg }).ok(),
        "padding" => arg.trim().parse().ok().map(|padding_px| RenderConfig { padding_px, ..cfg }),
        "height" => arg
            .trim()
            .parse()
            .ok()
            .map(|glyph_height_px| RenderConfig { glyph_height_px, ..cfg }),
        "width" => Some(RenderConfig {
            container_width_px: arg.trim().parse().ok(),
            ..cfg
        }),
        "preset" => Some(RenderConfig {
            size_preset: arg.parse().ok(),
            ..cfg
        }),
        "generate" | "share" => {
            let mode = if cmd == "share" {
                OutputMode::Share
            } else {
                OutputMode::Download
            };
            let outcome = session.generate(studio, mode).await;
            report(outcome.as_ref());
            None
        }
        "status" | "" => None,
        "quit" | "exit" => return false,
        other => {
            eprintln!("unknown command {:?}", other);
            None
        }
    };
    if let Some(next) = update {
        if let Err(e) = session.set_config(next) {
            eprintln!("{}", e);
        }
    }
    println!("{}", status(session, studio));
    true
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    if let Command::Presets = cli.command {
        return print_presets();
    }

    let cfg = load_config(&cli)?;
    let store = Arc::new(open_store(&cfg)?);
    let (cache, preload) = assets::spawn_preload(store.clone(), cfg.assets.layout.clone());
    let studio = Studio::new(
        store,
        cache,
        cfg.assets.layout.clone(),
        ResvgRasterizer::default(),
        share_target(cli.share_command.as_deref()),
        FixedDelay(Duration::from_millis(cfg.readiness.settle_ms)),
        cfg.readiness.policy,
        cfg.output.clone(),
    );

    match &cli.command {
        Command::Render { text, render, share } => {
            let mut session = Session::new(cfg.input.clone(), cfg.render);
            session
                .set_config(render.apply(cfg.render))
                .context("invalid render settings")?;
            if !session.input(text) {
                return Err(wordglyph::Error::Validation(format!(
                    "{:?} may only contain letters, digits and spaces",
                    text
                ))
                .into());
            }
            if !session.can_generate() {
                bail!("nothing to render");
            }
            // one-shot runs can afford to wait for the embedded glyphs
            if let Err(e) = preload.await {
                tracing::warn!("preload task failed: {}", e);
            }
            let mode = if *share {
                OutputMode::Share
            } else {
                OutputMode::Download
            };
            let outcome = session.generate(&studio, mode).await;
            if let Some(msg) = session.error() {
                bail!("{}", msg);
            }
            report(outcome.as_ref());
        }
        Command::Interactive { render } => {
            let mut session = Session::new(cfg.input.clone(), cfg.render);
            session
                .set_config(render.apply(cfg.render))
                .context("invalid render settings")?;
            let mut lines = BufReader::new(tokio::io::stdin()).lines();
            while let Some(line) = lines.next_line().await? {
                if !interactive_step(&mut session, &studio, &line).await {
                    break;
                }
            }
        }
        Command::Presets => {}
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::OnceLock;
    use wordglyph::assets::AssetLayout;
    use wordglyph::platform::{Immediate, Unsupported};
    use wordglyph::OutputConfig;

    #[test]
    fn status_reports_length_and_glyph_count() {
        let studio = Studio::new(
            Arc::new(DirectorySource::new("/nonexistent")),
            Arc::new(OnceLock::new()),
            AssetLayout::default(),
            ResvgRasterizer::default(),
            Unsupported,
            Immediate,
            ReadinessPolicy::Lenient,
            OutputConfig::default(),
        );
        let mut session = Session::default();
        session.input("HI  YOU");

        let s = status(&session, &studio);
        assert_eq!(s["length"], 7);
        assert_eq!(s["max_len"], 50);
        assert_eq!(s["glyphs"], 5);
        assert_eq!(s["policy"], "lenient");
        assert_eq!(s["preloaded"], 0);
    }
}
