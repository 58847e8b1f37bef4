// 该文件是 Smartbite 项目的一部分。
// src/task.rs - 单次检测与报告任务
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

use std::path::PathBuf;

use chrono::Local;
use image::RgbImage;
use tracing::info;

use crate::{
  breakdown::NutritionBreakdown,
  counting::FruitCounts,
  model::{DetectResult, Model},
  nutrition::ServingSize,
  output::{Draw, Render},
  report::{DEFAULT_REPORT_DIR, PdfReport, ReportArtifact},
};

pub trait Task<I, M, O>: Sized {
  type Output;
  type Error;
  fn run_task(self, input: I, model: M, output: O) -> Result<Self::Output, Self::Error>;
}

/// 一张图片的分析结果
#[derive(Debug, Clone)]
pub struct Analysis {
  pub detections: DetectResult,
  pub counts: FruitCounts,
  pub breakdown: NutritionBreakdown,
  /// 绘制了检测框的原尺寸图像
  pub annotated: RgbImage,
}

#[derive(Debug)]
pub struct Outcome {
  pub uploaded: RgbImage,
  pub analysis: Analysis,
  pub report: ReportArtifact,
}

/// 上传 → 推理 → 计数 → 营养换算 → 展示 → 导出 PDF
pub struct OneShotTask {
  serving_size: ServingSize,
  reports_dir: PathBuf,
  draw: Draw,
}

impl OneShotTask {
  pub fn new(serving_size: ServingSize) -> Self {
    Self {
      serving_size,
      reports_dir: PathBuf::from(DEFAULT_REPORT_DIR),
      draw: Draw::default(),
    }
  }

  pub fn with_reports_dir(mut self, reports_dir: impl Into<PathBuf>) -> Self {
    self.reports_dir = reports_dir.into();
    self
  }

  pub fn with_draw(mut self, draw: Draw) -> Self {
    self.draw = draw;
    self
  }

  pub fn analyze(&self, frame: &RgbImage, detections: DetectResult) -> Analysis {
    let counts = FruitCounts::tally(&detections);
    let breakdown = NutritionBreakdown::build(&counts, self.serving_size);
    let annotated = self.draw.draw_detections(frame, &detections);
    Analysis {
      detections,
      counts,
      breakdown,
      annotated,
    }
  }
}

impl<
  ME: std::error::Error + Sync + Send + 'static,
  RE: std::error::Error + Sync + Send + 'static,
  I: Iterator<Item = RgbImage>,
  M: Model<Input = RgbImage, Output = DetectResult, Error = ME>,
  O: Render<RgbImage, Analysis, Error = RE>,
> Task<I, M, O> for OneShotTask
{
  type Output = Outcome;
  type Error = anyhow::Error;

  fn run_task(self, mut input: I, model: M, output: O) -> Result<Self::Output, Self::Error> {
    info!("开始任务...");
    let frame = input.next().ok_or_else(|| anyhow::anyhow!("没有输入图像"))?;
    info!("输入图像获取成功 ({}x{})，开始推理...", frame.width(), frame.height());

    let now = std::time::Instant::now();
    let detections = model.infer(&frame)?;
    info!(
      "推理完成，耗时: {:.2?}，检测到 {} 个物体",
      now.elapsed(),
      detections.len()
    );

    let analysis = self.analyze(&frame, detections);
    info!(
      "共 {} 个水果，{} 种有营养数据，{} 种缺失",
      analysis.breakdown.total_fruits,
      analysis.breakdown.fruits.len(),
      analysis.breakdown.missing.len()
    );

    output.render_result(&frame, &analysis)?;

    let timestamp = Local::now().naive_local();
    let report = PdfReport::new(&frame, &analysis.annotated, &analysis.breakdown)
      .save_in(&self.reports_dir, &timestamp)?;
    info!("任务完成，报告: {}", report.path.display());

    Ok(Outcome {
      uploaded: frame,
      analysis,
      report,
    })
  }
}
