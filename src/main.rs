// 该文件是 Smartbite 项目的一部分。
// src/main.rs - 项目主程序
//
// 本文件根据 Apache 许可证第 2.0 版（以下简称“许可证”）授权使用；
// 除非遵守该许可证条款，否则您不得使用本文件。
// 您可通过以下网址获取许可证副本：
// http://www.apache.org/licenses/LICENSE-2.0
// 除非适用法律要求或书面同意，根据本许可协议分发的软件均按“原样”提供，
// 不附带任何形式的明示或暗示的保证或条件。
// 有关许可权限与限制的具体条款，请参阅本许可协议。
//
// Copyright (C) 2026 Johann Li <me@qinka.pro>, Wareless Group

mod args;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use smartbite::{
  FromUrl,
  input::ImageFileInput,
  model::{LabelSet, YoloOnnxBuilder},
  nutrition::ServingSize,
  output::{ConsoleSummary, DisplayPair, Draw, SummaryFormat},
  task::{OneShotTask, Task},
};

fn main() -> Result<()> {
  tracing_subscriber::fmt()
    .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
    .with_writer(std::io::stderr)
    .init();

  let args = args::Args::parse();

  info!("模型文件路径: {}", args.model);
  info!("输入来源: {}", args.input);
  info!("份量: {}g", args.serving_size);
  info!("报告目录: {}", args.reports_dir.display());

  let labels = match &args.labels {
    Some(path) => LabelSet::from_path(path)
      .with_context(|| format!("无法读取类别表: {}", path.display()))?,
    None => LabelSet::default(),
  };
  let draw = match &args.font {
    Some(path) => Draw::with_font_file(path)
      .with_context(|| format!("无法加载字体: {}", path.display()))?,
    None => Draw::default(),
  };

  let input = ImageFileInput::from_url(&args.input)?;
  let model = YoloOnnxBuilder::from_url(&args.model)?
    .labels(labels)
    .confidence(args.confidence)
    .iou(args.iou)
    .build()?;

  let format = if args.json {
    SummaryFormat::Json
  } else {
    SummaryFormat::Text
  };
  let display = args
    .display_dir
    .as_ref()
    .map(DisplayPair::from_url)
    .transpose()?;
  let output = (ConsoleSummary::new(format), display);

  let serving_size = ServingSize::new(args.serving_size as f64)?;
  let outcome = OneShotTask::new(serving_size)
    .with_reports_dir(&args.reports_dir)
    .with_draw(draw)
    .run_task(input, model, output)?;

  info!(
    "报告已生成: {} ({})",
    outcome.report.path.display(),
    outcome.report.mime()
  );

  if let Some(destination) = &args.download {
    let target = outcome
      .report
      .deliver_to(destination)
      .with_context(|| format!("无法保存报告到: {}", destination.display()))?;
    info!("报告已保存到: {}", target.display());
  }

  Ok(())
}
