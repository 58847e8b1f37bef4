// 该文件是 Smartbite 项目的一部分。
// src/args.rs - 项目参数配置
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

use clap::Parser;
use url::Url;

const SERVING_MIN: u32 = 25;
const SERVING_MAX: u32 = 200;
const SERVING_STEP: u32 = 25;

/// Smartbite 水果检测与营养报告
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
  /// ONNX 模型路径，如 onnx:///models/best.onnx
  #[arg(long, value_name = "MODEL")]
  pub model: Url,

  /// 上传的图片（jpg/jpeg/png），如 image:///photos/fruit.jpg
  #[arg(long, value_name = "SOURCE")]
  pub input: Url,

  /// 每个水果的份量（克），25 到 200，步长 25
  #[arg(long, default_value = "100", value_name = "GRAMS", value_parser = parse_serving_size)]
  pub serving_size: u32,

  /// PDF 报告目录
  #[arg(long, default_value = "reports", value_name = "DIR")]
  pub reports_dir: PathBuf,

  /// 置信度阈值 (0.0 - 1.0)
  #[arg(long, default_value = "0.25", value_name = "THRESHOLD")]
  pub confidence: f32,

  /// NMS IOU 阈值 (0.0 - 1.0)
  #[arg(long, default_value = "0.7", value_name = "THRESHOLD")]
  pub iou: f32,

  /// 类别表（TOML，names = [...]），缺省使用内置水果类别
  #[arg(long, value_name = "FILE")]
  pub labels: Option<PathBuf>,

  /// 检测标签使用的 TrueType 字体，缺省只绘制边框
  #[arg(long, value_name = "FILE")]
  pub font: Option<PathBuf>,

  /// 保存缩放后的展示图像对，如 folder:///tmp/smartbite
  #[arg(long, value_name = "OUTPUT")]
  pub display_dir: Option<Url>,

  /// 以 JSON 输出汇总
  #[arg(long)]
  pub json: bool,

  /// 将生成的报告另存到此路径（文件或目录）
  #[arg(long, value_name = "PATH")]
  pub download: Option<PathBuf>,
}

fn parse_serving_size(value: &str) -> Result<u32, String> {
  let grams: u32 = value
    .parse()
    .map_err(|_| format!("份量必须为整数克数: {}", value))?;
  if !(SERVING_MIN..=SERVING_MAX).contains(&grams) || grams % SERVING_STEP != 0 {
    return Err(format!(
      "份量必须在 {} 到 {} 之间且为 {} 的倍数",
      SERVING_MIN, SERVING_MAX, SERVING_STEP
    ));
  }
  Ok(grams)
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn serving_size_follows_slider_steps() {
    assert_eq!(parse_serving_size("25"), Ok(25));
    assert_eq!(parse_serving_size("200"), Ok(200));
    assert!(parse_serving_size("0").is_err());
    assert!(parse_serving_size("110").is_err());
    assert!(parse_serving_size("225").is_err());
    assert!(parse_serving_size("abc").is_err());
  }

  #[test]
  fn defaults_match_detector_settings() {
    let args = Args::try_parse_from([
      "smartbite",
      "--model",
      "onnx:///models/best.onnx",
      "--input",
      "image:///photos/fruit.jpg",
    ])
    .unwrap();
    assert_eq!(args.serving_size, 100);
    assert_eq!(args.confidence, 0.25);
    assert_eq!(args.iou, 0.7);
    assert_eq!(args.reports_dir, PathBuf::from("reports"));
    assert!(!args.json);
  }
}
