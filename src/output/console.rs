// 该文件是 Smartbite 项目的一部分。
// src/output/console.rs - 终端营养汇总输出
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

use std::io::Write;

use image::RgbImage;
use serde::Serialize;

use crate::{
  breakdown::{NutritionBreakdown, title_case},
  counting::FruitCounts,
  model::DetectResult,
  nutrition::Nutrient,
  output::{OutputError, Render},
  task::Analysis,
};

const NAME_COLUMN_WIDTH: usize = 12;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SummaryFormat {
  #[default]
  Text,
  Json,
}

/// 检测与营养汇总，写到标准输出
#[derive(Debug, Default)]
pub struct ConsoleSummary {
  format: SummaryFormat,
}

#[derive(Serialize)]
struct JsonSummary<'a> {
  counts: &'a FruitCounts,
  detections: &'a DetectResult,
  #[serde(flatten)]
  breakdown: &'a NutritionBreakdown,
}

impl ConsoleSummary {
  pub fn new(format: SummaryFormat) -> Self {
    Self { format }
  }

  pub fn write_to<W: Write>(&self, writer: &mut W, analysis: &Analysis) -> Result<(), OutputError> {
    match self.format {
      SummaryFormat::Text => write_text(writer, &analysis.counts, &analysis.breakdown)?,
      SummaryFormat::Json => {
        let summary = JsonSummary {
          counts: &analysis.counts,
          detections: &analysis.detections,
          breakdown: &analysis.breakdown,
        };
        serde_json::to_writer_pretty(&mut *writer, &summary)?;
        writeln!(writer)?;
      }
    }
    Ok(())
  }
}

// 按计数顺序逐个输出，缺少营养数据的就地给出警告
fn write_text<W: Write>(
  writer: &mut W,
  counts: &FruitCounts,
  breakdown: &NutritionBreakdown,
) -> std::io::Result<()> {
  writeln!(writer, "Detected Fruits and Nutritional Breakdown")?;
  writeln!(writer, "=========================================")?;
  writeln!(writer, "Total Fruits Detected: {}", breakdown.total_fruits)?;

  for (label, count) in counts.iter() {
    writeln!(writer, "---")?;
    writeln!(writer, "{} — Count: {}", title_case(label), count)?;
    let Some(fruit) = breakdown.fruits.iter().find(|fruit| fruit.label == label) else {
      writeln!(writer, "  WARNING: No nutrient data for {}", label)?;
      continue;
    };
    writeln!(
      writer,
      "  {:<width$} {}g",
      "",
      breakdown.serving_size,
      width = NAME_COLUMN_WIDTH
    )?;
    for nutrient in Nutrient::ALL {
      writeln!(
        writer,
        "  {:<width$} {}",
        nutrient.key(),
        fruit.nutrients.format_value(nutrient),
        width = NAME_COLUMN_WIDTH
      )?;
    }
  }

  Ok(())
}

impl Render<RgbImage, Analysis> for ConsoleSummary {
  type Error = OutputError;

  fn render_result(&self, _frame: &RgbImage, result: &Analysis) -> Result<(), Self::Error> {
    let stdout = std::io::stdout();
    let mut handle = stdout.lock();
    self.write_to(&mut handle, result)?;
    handle.flush()?;
    Ok(())
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::{
    model::DetectItem,
    nutrition::ServingSize,
  };

  fn analysis(labels: &[&str]) -> Analysis {
    let detections = DetectResult::from(
      labels
        .iter()
        .map(|label| DetectItem {
          class_id: 0,
          label: label.to_string(),
          score: 0.5,
          bbox: [0.0, 0.0, 0.5, 0.5],
        })
        .collect::<Vec<_>>(),
    );
    let counts = FruitCounts::tally(&detections);
    let breakdown = NutritionBreakdown::build(&counts, ServingSize::new(150.0).unwrap());
    Analysis {
      detections,
      counts,
      breakdown,
      annotated: RgbImage::new(1, 1),
    }
  }

  #[test]
  fn text_summary_lists_counts_and_warnings() {
    let mut out = Vec::new();
    ConsoleSummary::default()
      .write_to(&mut out, &analysis(&["banana", "banana", "durian"]))
      .unwrap();
    let text = String::from_utf8(out).unwrap();

    assert!(text.contains("Total Fruits Detected: 3"));
    assert!(text.contains("Banana — Count: 2"));
    assert!(text.contains("150g"));
    assert!(text.contains("133.5 kcal"));
    assert!(text.contains("vitamin_c"));
    assert!(text.contains("WARNING: No nutrient data for durian"));
  }

  #[test]
  fn text_summary_keeps_detection_order() {
    let mut out = Vec::new();
    ConsoleSummary::default()
      .write_to(&mut out, &analysis(&["durian", "kiwi", "rock", "apple"]))
      .unwrap();
    let text = String::from_utf8(out).unwrap();

    let positions: Vec<usize> = [
      "Durian — Count: 1",
      "WARNING: No nutrient data for durian",
      "Kiwi — Count: 1",
      "Rock — Count: 1",
      "WARNING: No nutrient data for rock",
      "Apple — Count: 1",
    ]
    .iter()
    .map(|needle| text.find(needle).unwrap())
    .collect();
    assert!(positions.windows(2).all(|pair| pair[0] < pair[1]));
  }

  #[test]
  fn json_summary_is_machine_readable() {
    let mut out = Vec::new();
    ConsoleSummary::new(SummaryFormat::Json)
      .write_to(&mut out, &analysis(&["apple", "kiwi", "apple"]))
      .unwrap();
    let json: serde_json::Value = serde_json::from_slice(&out).unwrap();

    assert_eq!(json["total_fruits"], 3);
    assert_eq!(json["counts"]["apple"], 2);
    assert_eq!(json["fruits"][1]["label"], "kiwi");
    assert_eq!(json["detections"]["items"].as_array().unwrap().len(), 3);
    assert_eq!(json["missing"].as_array().unwrap().len(), 0);
  }
}
