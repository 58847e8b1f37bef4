// 该文件是 Smartbite 项目的一部分。
// src/output/display.rs - 上传图像与检测图像的展示对
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

use std::path::{Path, PathBuf};

use image::RgbImage;
use tracing::info;
use url::Url;

use crate::{
  FromUrl, FromUrlWithScheme,
  output::{OutputError, Render, resize_to_width},
  task::Analysis,
};

const DISPLAY_WIDTH: u32 = 300;
const UPLOADED_FILE_NAME: &str = "uploaded.png";
const DETECTED_FILE_NAME: &str = "detected.png";

/// 缩放到展示宽度后并排查看的两张图：上传原图与检测结果图
pub struct DisplayPair {
  directory: PathBuf,
}

impl FromUrlWithScheme for DisplayPair {
  const SCHEME: &'static str = "folder";
}

impl FromUrl for DisplayPair {
  type Error = OutputError;

  fn from_url(url: &Url) -> Result<Self, Self::Error> {
    if url.scheme() != Self::SCHEME {
      return Err(OutputError::IoError(std::io::Error::new(
        std::io::ErrorKind::InvalidInput,
        format!(
          "期望输出方式 '{}', 实际输出方式 '{}'",
          Self::SCHEME,
          url.scheme()
        ),
      )));
    }
    Ok(Self::new(url.path()))
  }
}

impl DisplayPair {
  pub fn new(directory: impl AsRef<Path>) -> Self {
    Self {
      directory: directory.as_ref().to_path_buf(),
    }
  }

  pub fn uploaded_path(&self) -> PathBuf {
    self.directory.join(UPLOADED_FILE_NAME)
  }

  pub fn detected_path(&self) -> PathBuf {
    self.directory.join(DETECTED_FILE_NAME)
  }
}

impl Render<RgbImage, Analysis> for DisplayPair {
  type Error = OutputError;

  fn render_result(&self, frame: &RgbImage, result: &Analysis) -> Result<(), Self::Error> {
    std::fs::create_dir_all(&self.directory)?;
    resize_to_width(frame, DISPLAY_WIDTH).save(self.uploaded_path())?;
    resize_to_width(&result.annotated, DISPLAY_WIDTH).save(self.detected_path())?;
    info!("展示图像已保存到: {}", self.directory.display());
    Ok(())
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::{
    breakdown::NutritionBreakdown, counting::FruitCounts, model::DetectResult,
    nutrition::ServingSize,
  };

  #[test]
  fn writes_both_images_at_display_width() {
    let dir = tempfile::tempdir().unwrap();
    let display = DisplayPair::new(dir.path().join("display"));
    let analysis = Analysis {
      detections: DetectResult::default(),
      counts: FruitCounts::default(),
      breakdown: NutritionBreakdown::build(&FruitCounts::default(), ServingSize::default()),
      annotated: RgbImage::new(900, 300),
    };

    display
      .render_result(&RgbImage::new(600, 600), &analysis)
      .unwrap();

    let uploaded = image::open(display.uploaded_path()).unwrap();
    let detected = image::open(display.detected_path()).unwrap();
    assert_eq!((uploaded.width(), uploaded.height()), (300, 300));
    assert_eq!((detected.width(), detected.height()), (300, 100));
  }
}
