//! Command-line front end for the `texbake` binary.

use std::env;
use std::path::PathBuf;

use anyhow::{anyhow, bail, Context, Result};
use texbake_core::{BakeOptions, Scene};
use texbake_render::SoftwareDevice;

use crate::bake::run_batch;
use crate::host::FsHost;
use crate::report::BakeResult;

const USAGE: &str = "Usage: texbake --scene <scene.json> --camera <name> [--camera <name>...] \
                     [--config <options.json>] [--out <dir>] [--width N] [--height N] \
                     [--report <report.json>]";

/// Parsed command-line arguments.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CliArgs {
    /// Scene description to bake.
    pub scene: PathBuf,
    /// Cameras to bake, in order.
    pub cameras: Vec<String>,
    /// Bake options file; defaults apply when absent.
    pub config: Option<PathBuf>,
    pub out: Option<PathBuf>,
    pub width: Option<u32>,
    pub height: Option<u32>,
    /// Where to write the JSON report.
    pub report: Option<PathBuf>,
}

impl CliArgs {
    pub fn parse_from_env() -> Result<Self> {
        Self::parse(env::args())
    }

    pub fn parse<I, S>(args: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut parsed = CliArgs::default();
        let mut scene = None;
        let mut iter = args.into_iter();
        let _ = iter.next(); // skip program name if present
        while let Some(raw_flag) = iter.next() {
            let flag = raw_flag.as_ref();
            let Some(key) = flag.strip_prefix("--") else {
                bail!("Unexpected argument '{flag}'. {USAGE}");
            };
            let value = iter
                .next()
                .ok_or_else(|| anyhow!("Expected a value after '{flag}'"))?
                .as_ref()
                .to_string();
            match key {
                "scene" => scene = Some(PathBuf::from(value)),
                "camera" => parsed.cameras.push(value),
                "config" => parsed.config = Some(PathBuf::from(value)),
                "out" => parsed.out = Some(PathBuf::from(value)),
                "report" => parsed.report = Some(PathBuf::from(value)),
                "width" => {
                    parsed.width =
                        Some(value.parse::<u32>().with_context(|| format!("Invalid width '{value}'"))?);
                }
                "height" => {
                    parsed.height = Some(
                        value.parse::<u32>().with_context(|| format!("Invalid height '{value}'"))?,
                    );
                }
                _ => bail!("Unknown flag '{flag}'. {USAGE}"),
            }
        }
        parsed.scene = scene.ok_or_else(|| anyhow!("Missing --scene. {USAGE}"))?;
        Ok(parsed)
    }

    /// Bake options from `--config` (or defaults) with flag overrides applied.
    pub fn options(&self) -> Result<BakeOptions> {
        let mut options = match &self.config {
            Some(path) => BakeOptions::from_json_file(path)
                .with_context(|| format!("Failed to load options from '{}'", path.display()))?,
            None => BakeOptions::default(),
        };
        if let Some(out) = &self.out {
            options.output_folder.clone_from(out);
        }
        if let Some(width) = self.width {
            options.output_width = width;
        }
        if let Some(height) = self.height {
            options.output_height = height;
        }
        Ok(options)
    }
}

/// Loads the scene and options, bakes every camera on the software device,
/// and writes the report if one was requested.
pub fn run(args: &CliArgs) -> Result<Vec<BakeResult>> {
    let options = args.options()?;
    let mut scene = Scene::from_json_file(&args.scene)
        .with_context(|| format!("Failed to load scene from '{}'", args.scene.display()))?;

    let mut device = SoftwareDevice::new();
    let mut host = FsHost::new();
    let results = run_batch(&mut scene, args.cameras.as_slice(), &options, &mut device, &mut host)
        .context("Bake could not start")?;

    if let Some(path) = &args.report {
        let json = serde_json::to_string_pretty(&results)?;
        std::fs::write(path, json)
            .with_context(|| format!("Failed to write report to '{}'", path.display()))?;
    }
    Ok(results)
}
