// 该文件是 Smartbite 项目的一部分。
// tests/pipeline.rs - 检测到报告的完整流程
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

use std::io::Cursor;

use image::{ImageFormat, Rgb, RgbImage};

use smartbite::{
  input::ImageFileInput,
  model::{DetectItem, DetectResult, Model},
  nutrition::{Nutrient, ServingSize},
  output::{ConsoleSummary, DisplayPair},
  task::{OneShotTask, Task},
};

/// 固定输出的检测模型
struct FixedModel {
  items: Vec<DetectItem>,
}

impl Model for FixedModel {
  type Input = RgbImage;
  type Output = DetectResult;
  type Error = std::io::Error;

  fn infer(&self, _input: &Self::Input) -> Result<Self::Output, Self::Error> {
    Ok(DetectResult::from(self.items.clone()))
  }
}

struct BrokenModel;

impl Model for BrokenModel {
  type Input = RgbImage;
  type Output = DetectResult;
  type Error = std::io::Error;

  fn infer(&self, _input: &Self::Input) -> Result<Self::Output, Self::Error> {
    Err(std::io::Error::other("inference backend unavailable"))
  }
}

fn item(class_id: u32, label: &str, bbox: [f32; 4]) -> DetectItem {
  DetectItem {
    class_id,
    label: label.to_string(),
    score: 0.8,
    bbox,
  }
}

fn uploaded_png() -> Vec<u8> {
  let image = RgbImage::from_fn(320, 200, |x, y| Rgb([(x % 256) as u8, (y % 256) as u8, 90]));
  let mut buffer = Cursor::new(Vec::new());
  image.write_to(&mut buffer, ImageFormat::Png).unwrap();
  buffer.into_inner()
}

#[test]
fn photo_to_report() {
  let dir = tempfile::tempdir().unwrap();
  let reports = dir.path().join("reports");
  let display = DisplayPair::new(dir.path().join("display"));

  let model = FixedModel {
    items: vec![
      item(0, "apple", [0.05, 0.05, 0.30, 0.40]),
      item(1, "banana", [0.40, 0.10, 0.80, 0.50]),
      item(0, "apple", [0.10, 0.50, 0.35, 0.90]),
      item(42, "durian", [0.60, 0.60, 0.95, 0.95]),
    ],
  };
  let input = ImageFileInput::from_bytes(&uploaded_png()).unwrap();
  let serving = ServingSize::new(125.0).unwrap();

  let outcome = OneShotTask::new(serving)
    .with_reports_dir(&reports)
    .run_task(input, model, (ConsoleSummary::default(), Some(display)))
    .unwrap();

  let analysis = &outcome.analysis;
  assert_eq!(analysis.counts.total(), 4);
  assert_eq!(analysis.counts.get("apple"), 2);
  assert_eq!(analysis.breakdown.total_fruits, 4);

  // 营养表中存在的水果全部出现，缺失的只给出警告
  let labels: Vec<&str> = analysis
    .breakdown
    .fruits
    .iter()
    .map(|fruit| fruit.label.as_str())
    .collect();
  assert_eq!(labels, vec!["apple", "banana"]);
  assert_eq!(analysis.breakdown.missing[0].label, "durian");

  let banana = &analysis.breakdown.fruits[1].nutrients;
  assert_eq!(banana.get(Nutrient::Calories), 111.25);
  assert_eq!(banana.get(Nutrient::Protein), 1.38);
  assert_eq!(banana.get(Nutrient::VitaminC), 10.88);
  assert_eq!(banana.format_value(Nutrient::Fiber), "3.25 g");

  assert_eq!(analysis.annotated.dimensions(), outcome.uploaded.dimensions());
  assert_ne!(analysis.annotated, outcome.uploaded);

  let report = &outcome.report;
  assert!(report.path.starts_with(&reports));
  assert!(report.file_name.starts_with("smartbite_report_"));
  assert!(report.file_name.ends_with(".pdf"));
  let bytes = report.bytes().unwrap();
  assert!(bytes.starts_with(b"%PDF"));

  assert!(dir.path().join("display/uploaded.png").is_file());
  assert!(dir.path().join("display/detected.png").is_file());
}

#[test]
fn repeated_runs_produce_distinct_reports() {
  let dir = tempfile::tempdir().unwrap();
  let mut names = Vec::new();

  for _ in 0..3 {
    let model = FixedModel {
      items: vec![item(3, "kiwi", [0.2, 0.2, 0.6, 0.6])],
    };
    let input = ImageFileInput::from_bytes(&uploaded_png()).unwrap();
    let outcome = OneShotTask::new(ServingSize::default())
      .with_reports_dir(dir.path())
      .run_task(input, model, None::<DisplayPair>)
      .unwrap();
    assert!(std::fs::metadata(&outcome.report.path).unwrap().len() > 0);
    names.push(outcome.report.file_name);
  }

  names.sort();
  names.dedup();
  assert_eq!(names.len(), 3);
}

#[test]
fn image_without_fruit_still_reports() {
  let dir = tempfile::tempdir().unwrap();
  let input = ImageFileInput::from_bytes(&uploaded_png()).unwrap();
  let outcome = OneShotTask::new(ServingSize::default())
    .with_reports_dir(dir.path())
    .run_task(input, FixedModel { items: Vec::new() }, None::<DisplayPair>)
    .unwrap();

  assert_eq!(outcome.analysis.counts.total(), 0);
  assert!(outcome.analysis.breakdown.is_empty());
  assert!(outcome.report.path.is_file());
}

#[test]
fn inference_failure_aborts_without_report() {
  let dir = tempfile::tempdir().unwrap();
  let input = ImageFileInput::from_bytes(&uploaded_png()).unwrap();
  let err = OneShotTask::new(ServingSize::default())
    .with_reports_dir(dir.path().join("reports"))
    .run_task(input, BrokenModel, None::<DisplayPair>)
    .unwrap_err();

  assert!(err.to_string().contains("inference backend unavailable"));
  assert!(!dir.path().join("reports").exists());
}
