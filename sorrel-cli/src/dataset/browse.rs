// Copyright (c) 2025, Tom Ouellette
// Licensed under the BSD 3-Clause License

use std::path::PathBuf;

use clap::{ArgMatches, Args, FromArgMatches, ValueEnum};
use kdam::BarExt;
use serde_json::Value;

use sorrel_core::config::Config;
use sorrel_core::config::options::parse_cfg_option;
use sorrel_core::constant::DEFAULT_SCOPE;
use sorrel_core::data::dataset_registry;
use sorrel_core::error::SorrelError;
use sorrel_core::ut;
use sorrel_core::vis::visualizer_registry;

use crate::dataset::scope::{RenderContext, renderer};
use crate::job::Job;

/// Dataset split to browse
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Mode {
    Train,
    Val,
    Test,
}

impl Mode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Mode::Train => "train",
            Mode::Val => "val",
            Mode::Test => "test",
        }
    }
}

#[derive(Debug, Clone, Args)]
pub struct BrowseArgs {
    #[arg(help = "Path to a json config file.")]
    pub config: PathBuf,

    #[arg(long, help = "Directory rendered images are written to.")]
    pub save_dir: Option<PathBuf>,

    #[arg(long, help = "Open each rendered image in the system image viewer.")]
    pub show: bool,

    #[arg(
        long,
        help = "Seconds to wait after opening each image when showing.",
        default_value_t = 2.0
    )]
    pub show_interval: f64,

    #[arg(
        long,
        help = "Maximum number of samples to browse.",
        default_value_t = 100,
        value_parser = clap::value_parser!(u64).range(1..)
    )]
    pub max_count: u64,

    #[arg(
        long,
        value_enum,
        help = "Dataset split to browse.",
        default_value_t = Mode::Train
    )]
    pub mode: Mode,

    #[arg(
        long,
        num_args = 1..,
        value_name = "KEY=VALUE",
        value_parser = parse_cfg_option,
        help = "Override config settings, e.g. train_dataloader.dataset.img_dir=images or key=[a,b]. Lists may be nested with brackets and quoted values are kept as strings."
    )]
    pub cfg_options: Vec<(String, Value)>,
}

/// `sorrel dataset browse`
#[derive(Debug, Clone, Copy, Default)]
pub struct BrowseDatasetJob;

impl Job for BrowseDatasetJob {
    fn name(&self) -> &'static str {
        "browse"
    }

    fn description(&self) -> Option<&'static str> {
        Some("Browse the dataset defined in a config file.")
    }

    fn declare_arguments(&self, command: clap::Command) -> clap::Command {
        BrowseArgs::augment_args(command)
    }

    fn execute(&self, args: &ArgMatches) -> i32 {
        let args = match BrowseArgs::from_arg_matches(args) {
            Ok(args) => args,
            Err(err) => {
                eprintln!("[sorrel::dataset::browse] ERROR: {}", err);
                return 1;
            }
        };

        match browse(&args) {
            Ok(_) => 0,
            Err(err) => {
                eprintln!("[sorrel::dataset::browse] ERROR: {}", err);
                1
            }
        }
    }
}

/// Visualizer type used when the config does not define one
fn default_visualizer(scope: &str) -> &'static str {
    match scope {
        "mmdet" => "DetLocalVisualizer",
        "mmseg" => "SegLocalVisualizer",
        _ => "Visualizer",
    }
}

/// Render up to `max_count` samples of the configured dataset
///
/// Returns the number of samples rendered.
pub fn browse(args: &BrowseArgs) -> Result<usize, SorrelError> {
    let mut cfg = Config::fromfile(&args.config)?;

    ut::track::progress_log(
        &format!(
            "Loaded config {}.",
            cfg.filename().unwrap_or(args.config.as_path()).display()
        ),
        true,
    );

    if !args.cfg_options.is_empty() {
        cfg.merge_from_dict(&args.cfg_options)?;
    }

    let scope = cfg.get_str_or("default_scope", DEFAULT_SCOPE).to_string();
    let render = renderer(&scope)?;

    let dataset_cfg = cfg.require(&format!("{}_dataloader.dataset", args.mode.as_str()))?;
    let dataset = dataset_registry().build(Some(&scope), dataset_cfg)?;

    let visualizer_cfg = cfg
        .get("visualizer")
        .cloned()
        .unwrap_or_else(|| serde_json::json!({"type": default_visualizer(&scope)}));
    let mut visualizer = visualizer_registry().build(Some(&scope), &visualizer_cfg)?;
    visualizer.set_dataset_meta(dataset.metainfo());

    let total = dataset.len().min(args.max_count as usize);

    ut::track::progress_log(
        &format!(
            "Browsing {} of {} samples from the {} dataset ({}).",
            ut::track::thousands_format(total),
            ut::track::thousands_format(dataset.len()),
            args.mode.as_str(),
            scope
        ),
        true,
    );

    let ctx = RenderContext {
        save_dir: args.save_dir.as_deref(),
        show: args.show,
        wait_time: args.show_interval,
    };

    let mut pb = ut::track::progress_bar(total, "Browsing", true);

    for (index, item) in dataset.iter().take(total).enumerate() {
        render(&visualizer, index, &item?, &ctx)?;
        pb.update(1).map_err(|err| {
            SorrelError::OtherError(format!("Progress could not be reported: {}", err))
        })?;
    }

    eprintln!();

    Ok(total)
}

#[cfg(test)]
mod test {

    use super::*;
    use clap::Parser;

    #[derive(Debug, Parser)]
    struct Harness {
        #[command(flatten)]
        browse: BrowseArgs,
    }

    #[test]
    fn test_defaults() {
        let args = Harness::try_parse_from(["browse", "cfg.json"]).unwrap().browse;

        assert_eq!(args.config, PathBuf::from("cfg.json"));
        assert_eq!(args.save_dir, None);
        assert!(!args.show);
        assert_eq!(args.show_interval, 2.0);
        assert_eq!(args.max_count, 100);
        assert_eq!(args.mode, Mode::Train);
        assert!(args.cfg_options.is_empty());
    }

    #[test]
    fn test_cfg_options_parse() {
        let args = Harness::try_parse_from([
            "browse",
            "cfg.json",
            "--mode",
            "val",
            "--cfg-options",
            "a=1,2,3",
            "b.c=[x,(1,2)]",
        ])
        .unwrap()
        .browse;

        assert_eq!(args.mode, Mode::Val);
        assert_eq!(
            args.cfg_options,
            vec![
                ("a".to_string(), serde_json::json!([1, 2, 3])),
                ("b.c".to_string(), serde_json::json!(["x", [1, 2]])),
            ]
        );
    }

    #[test]
    fn test_invalid_arguments() {
        assert!(Harness::try_parse_from(["browse", "cfg.json", "--max-count", "0"]).is_err());
        assert!(Harness::try_parse_from(["browse", "cfg.json", "--mode", "dev"]).is_err());
        assert!(Harness::try_parse_from(["browse", "cfg.json", "--cfg-options", "novalue"]).is_err());
    }

    #[test]
    fn test_browse_missing_config() {
        let args = Harness::try_parse_from(["browse", "/does/not/exist.json"])
            .unwrap()
            .browse;

        assert!(matches!(browse(&args), Err(SorrelError::ConfigReadError(_))));
    }
}
