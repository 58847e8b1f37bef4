// 该文件是 Smartbite 项目的一部分。
// src/report.rs - PDF 营养报告
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

use std::{
  io::Write,
  path::{Path, PathBuf},
};

use chrono::NaiveDateTime;
use image::RgbImage;
use printpdf::{
  BuiltinFont, ColorBits, ColorSpace, Image, ImageTransform, ImageXObject, IndirectFontRef, Line,
  Mm, PdfDocument, PdfDocumentReference, PdfLayerReference, Point, Px,
};
use tempfile::NamedTempFile;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::{
  breakdown::{FruitBreakdown, NutritionBreakdown, title_case},
  nutrition::Nutrient,
  output::resize_to_width,
};

pub const REPORT_MIME: &str = "application/pdf";
pub const DEFAULT_REPORT_DIR: &str = "reports";

const REPORT_TITLE: &str = "Smartbite Report";
const REPORT_FILE_PREFIX: &str = "smartbite_report_";
const REPORT_TIME_FORMAT: &str = "%Y%m%d_%H%M%S";
const MAX_NAME_ATTEMPTS: u32 = 100;

// 版面尺寸，单位毫米
const PAGE_W: f32 = 210.0;
const PAGE_H: f32 = 297.0;
const MARGIN: f32 = 10.0;
const BOTTOM_MARGIN: f32 = 20.0;
const CELL_PADDING: f32 = 1.0;
const PT_TO_MM: f32 = 25.4 / 72.0;
// Helvetica 平均字宽与字号之比，用于居中估算
const AVG_CHAR_WIDTH: f32 = 0.5;

const TITLE_SIZE: f32 = 16.0;
const TITLE_HEIGHT: f32 = 10.0;
const TITLE_GAP: f32 = 5.0;

const IMAGE_PIXEL_WIDTH: u32 = 240;
const IMAGE_WIDTH: f32 = 60.0;
const IMAGE_MAX_HEIGHT: f32 = 150.0;
const IMAGE_LEFT_X: f32 = 20.0;
const IMAGE_RIGHT_X: f32 = 110.0;
const CAPTION_SIZE: f32 = 10.0;
const CAPTION_HEIGHT: f32 = 8.0;
const CAPTION_GAP: f32 = 2.0;
const CAPTION_PADDING: f32 = 12.0;
const UPLOADED_CAPTION: &str = "Uploaded Image";
const DETECTED_CAPTION: &str = "Detected Image with bounding boxes";

const TABLE_GAP: f32 = 5.0;
const TABLE_HEADING_SIZE: f32 = 12.0;
const TABLE_HEADING_HEIGHT: f32 = 10.0;
const TABLE_HEADING_GAP: f32 = 4.0;
const TABLE_TEXT_SIZE: f32 = 10.0;
const COL_WIDTH: f32 = 27.0;
const ROW_HEIGHT: f32 = 6.0;
const BORDER_THICKNESS: f32 = 0.2;

#[derive(Error, Debug)]
pub enum ReportError {
  #[error("I/O 错误: {0}")]
  IoError(#[from] std::io::Error),
  #[error("PDF 错误: {0}")]
  PdfError(#[from] printpdf::Error),
  #[error("无法在 {0} 中生成不重复的报告文件名")]
  NameExhausted(PathBuf),
}

/// `smartbite_report_<YYYYmmdd_HHMMSS>.pdf`
pub fn report_file_name(timestamp: &NaiveDateTime) -> String {
  format!(
    "{}{}.pdf",
    REPORT_FILE_PREFIX,
    timestamp.format(REPORT_TIME_FORMAT)
  )
}

fn numbered_file_name(base: &str, attempt: u32) -> String {
  if attempt == 0 {
    base.to_string()
  } else {
    let stem = base.trim_end_matches(".pdf");
    format!("{}_{}.pdf", stem, attempt)
  }
}

/// 已写入磁盘、可供下载的报告
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportArtifact {
  pub path: PathBuf,
  pub file_name: String,
}

impl ReportArtifact {
  pub fn mime(&self) -> &'static str {
    REPORT_MIME
  }

  pub fn bytes(&self) -> std::io::Result<Vec<u8>> {
    std::fs::read(&self.path)
  }

  /// 下载：把报告字节写到目标位置；目标为目录时沿用报告文件名
  pub fn deliver_to(&self, destination: impl AsRef<Path>) -> std::io::Result<PathBuf> {
    let destination = destination.as_ref();
    let target = if destination.is_dir() {
      destination.join(&self.file_name)
    } else {
      destination.to_path_buf()
    };
    std::fs::write(&target, self.bytes()?)?;
    info!("报告已下载到: {}", target.display());
    Ok(target)
  }
}

/// 删除暂存文件，失败只记录日志
fn discard_temp(temp: NamedTempFile) {
  let path = temp.path().to_path_buf();
  if let Err(err) = temp.close() {
    warn!("Failed to delete temp file {}: {}", path.display(), err);
  }
}

/// 报告版面：标题、原图与检测图并排、营养成分表
pub struct PdfReport<'a> {
  uploaded: &'a RgbImage,
  annotated: &'a RgbImage,
  breakdown: &'a NutritionBreakdown,
}

impl<'a> PdfReport<'a> {
  pub fn new(
    uploaded: &'a RgbImage,
    annotated: &'a RgbImage,
    breakdown: &'a NutritionBreakdown,
  ) -> Self {
    Self {
      uploaded,
      annotated,
      breakdown,
    }
  }

  fn layout(&self) -> Result<PageWriter, printpdf::Error> {
    let mut page = PageWriter::new()?;
    page.add_images_side_by_side(self.uploaded, self.annotated);
    page.add_nutrient_table(self.breakdown);
    Ok(page)
  }

  pub fn to_bytes(&self) -> Result<Vec<u8>, ReportError> {
    Ok(self.layout()?.finish()?)
  }

  pub fn write_to<W: Write>(&self, writer: &mut W) -> Result<(), ReportError> {
    writer.write_all(&self.to_bytes()?)?;
    Ok(())
  }

  /// 先写入目录内的暂存文件，再以不覆盖的方式改名为最终报告
  pub fn save_in(
    &self,
    directory: impl AsRef<Path>,
    timestamp: &NaiveDateTime,
  ) -> Result<ReportArtifact, ReportError> {
    let directory = directory.as_ref();
    std::fs::create_dir_all(directory)?;
    let bytes = self.to_bytes()?;
    debug!("报告大小: {} 字节", bytes.len());

    let mut temp = tempfile::Builder::new()
      .prefix(".smartbite_")
      .suffix(".pdf.tmp")
      .tempfile_in(directory)?;
    let written = temp.write_all(&bytes).and_then(|_| temp.as_file().sync_all());
    if let Err(err) = written {
      discard_temp(temp);
      return Err(err.into());
    }

    let base = report_file_name(timestamp);
    for attempt in 0..MAX_NAME_ATTEMPTS {
      let file_name = numbered_file_name(&base, attempt);
      let path = directory.join(&file_name);
      match temp.persist_noclobber(&path) {
        Ok(_) => {
          info!("报告已生成: {}", path.display());
          return Ok(ReportArtifact { path, file_name });
        }
        Err(err) if err.error.kind() == std::io::ErrorKind::AlreadyExists => {
          debug!("报告文件已存在: {}", path.display());
          temp = err.file;
        }
        Err(err) => {
          discard_temp(err.file);
          return Err(err.error.into());
        }
      }
    }

    discard_temp(temp);
    Err(ReportError::NameExhausted(directory.to_path_buf()))
  }
}

/// 默认宽度下过高的图像按最大高度收窄
fn fit_width(image: &RgbImage) -> f32 {
  let (px_w, px_h) = image.dimensions();
  let aspect = px_h as f32 / px_w.max(1) as f32;
  if IMAGE_WIDTH * aspect > IMAGE_MAX_HEIGHT {
    IMAGE_MAX_HEIGHT / aspect
  } else {
    IMAGE_WIDTH
  }
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Align {
  Left,
  Center,
}

struct Fonts {
  regular: IndirectFontRef,
  bold: IndirectFontRef,
  italic: IndirectFontRef,
}

/// 自上而下排版；`cursor` 为距页顶的毫米数
struct PageWriter {
  doc: PdfDocumentReference,
  layer: PdfLayerReference,
  fonts: Fonts,
  cursor: f32,
  // 已写入营养表表头的水果名称
  table_labels: Vec<String>,
}

impl PageWriter {
  fn new() -> Result<Self, printpdf::Error> {
    let (doc, page, layer) = PdfDocument::new(REPORT_TITLE, Mm(PAGE_W), Mm(PAGE_H), "Layer 1");
    let layer = doc.get_page(page).get_layer(layer);
    let fonts = Fonts {
      regular: doc.add_builtin_font(BuiltinFont::Helvetica)?,
      bold: doc.add_builtin_font(BuiltinFont::HelveticaBold)?,
      italic: doc.add_builtin_font(BuiltinFont::HelveticaOblique)?,
    };

    let mut writer = Self {
      doc,
      layer,
      fonts,
      cursor: MARGIN,
      table_labels: Vec::new(),
    };
    writer.header();
    Ok(writer)
  }

  fn finish(self) -> Result<Vec<u8>, printpdf::Error> {
    self.doc.save_to_bytes()
  }

  fn header(&mut self) {
    self.text(
      REPORT_TITLE,
      TITLE_SIZE,
      &self.fonts.bold,
      MARGIN,
      PAGE_W - 2.0 * MARGIN,
      TITLE_HEIGHT,
      Align::Center,
    );
    self.cursor += TITLE_HEIGHT + TITLE_GAP;
  }

  fn new_page(&mut self) {
    let (page, layer) = self.doc.add_page(Mm(PAGE_W), Mm(PAGE_H), "Layer 1");
    self.layer = self.doc.get_page(page).get_layer(layer);
    self.cursor = MARGIN;
    self.header();
  }

  fn ensure_space(&mut self, height: f32) {
    if self.cursor + height > PAGE_H - BOTTOM_MARGIN {
      self.new_page();
    }
  }

  /// 在宽 `width`、高 `height` 的单元格中书写一行文本，竖直居中
  #[allow(clippy::too_many_arguments)]
  fn text(
    &self,
    text: &str,
    size: f32,
    font: &IndirectFontRef,
    x: f32,
    width: f32,
    height: f32,
    align: Align,
  ) {
    let size_mm = size * PT_TO_MM;
    let text_x = match align {
      Align::Left => x + CELL_PADDING,
      Align::Center => {
        let text_w = text.chars().count() as f32 * size_mm * AVG_CHAR_WIDTH;
        x + ((width - text_w) / 2.0).max(0.0)
      }
    };
    let baseline = self.cursor + height / 2.0 + 0.3 * size_mm;
    self
      .layer
      .use_text(text, size, Mm(text_x), Mm(PAGE_H - baseline), font);
  }

  fn cell_border(&self, x: f32, width: f32, height: f32) {
    let top = PAGE_H - self.cursor;
    let bottom = top - height;
    let points = vec![
      (Point::new(Mm(x), Mm(top)), false),
      (Point::new(Mm(x + width), Mm(top)), false),
      (Point::new(Mm(x + width), Mm(bottom)), false),
      (Point::new(Mm(x), Mm(bottom)), false),
    ];
    self.layer.add_line(Line {
      points,
      is_closed: true,
    });
  }

  /// 以指定宽度放置图像，返回其高度
  fn image(&self, image: &RgbImage, x: f32, width: f32) -> f32 {
    let (px_w, px_h) = image.dimensions();
    let height = width * px_h as f32 / px_w.max(1) as f32;
    let xobject = ImageXObject {
      width: Px(px_w as usize),
      height: Px(px_h as usize),
      color_space: ColorSpace::Rgb,
      bits_per_component: ColorBits::Bit8,
      interpolate: true,
      image_data: image.as_raw().clone(),
      image_filter: None,
      smask: None,
      clipping_bbox: None,
    };
    Image::from(xobject).add_to_layer(
      self.layer.clone(),
      ImageTransform {
        translate_x: Some(Mm(x)),
        translate_y: Some(Mm(PAGE_H - self.cursor - height)),
        dpi: Some(px_w as f32 * 25.4 / width),
        ..Default::default()
      },
    );
    height
  }

  fn add_images_side_by_side(&mut self, uploaded: &RgbImage, annotated: &RgbImage) {
    let uploaded = resize_to_width(uploaded, IMAGE_PIXEL_WIDTH);
    let annotated = resize_to_width(annotated, IMAGE_PIXEL_WIDTH);

    let left_h = self.image(&uploaded, IMAGE_LEFT_X, fit_width(&uploaded));
    let right_h = self.image(&annotated, IMAGE_RIGHT_X, fit_width(&annotated));

    self.cursor += left_h.max(right_h) + CAPTION_GAP;
    for (caption, x) in [
      (UPLOADED_CAPTION, IMAGE_LEFT_X),
      (DETECTED_CAPTION, IMAGE_RIGHT_X),
    ] {
      self.text(
        caption,
        CAPTION_SIZE,
        &self.fonts.italic,
        x,
        IMAGE_WIDTH,
        CAPTION_HEIGHT,
        Align::Center,
      );
    }
    self.cursor += CAPTION_PADDING;
  }

  fn add_nutrient_table(&mut self, breakdown: &NutritionBreakdown) {
    self.cursor += TABLE_GAP;
    self.ensure_space(TABLE_HEADING_HEIGHT + TABLE_HEADING_GAP + ROW_HEIGHT * 8.0);
    let heading = format!(
      "Nutritional Breakdown ({}g per fruit)",
      breakdown.serving_size
    );
    self.text(
      &heading,
      TABLE_HEADING_SIZE,
      &self.fonts.bold,
      MARGIN,
      PAGE_W - 2.0 * MARGIN,
      TABLE_HEADING_HEIGHT,
      Align::Left,
    );
    self.cursor += TABLE_HEADING_HEIGHT + TABLE_HEADING_GAP;

    // 一行容纳的水果列数，超出部分另起一块
    let per_block = (((PAGE_W - 2.0 * MARGIN) / COL_WIDTH) as usize).saturating_sub(1).max(1);
    if breakdown.fruits.is_empty() {
      self.table_block(&[]);
    }
    for (index, block) in breakdown.fruits.chunks(per_block).enumerate() {
      if index > 0 {
        self.cursor += TABLE_HEADING_GAP;
      }
      self.table_block(block);
    }
    debug!("营养表共 {} 种水果", breakdown.fruits.len());
  }

  fn table_block(&mut self, fruits: &[FruitBreakdown]) {
    self.ensure_space(ROW_HEIGHT * (Nutrient::ALL.len() + 1) as f32);
    self.layer.set_outline_thickness(BORDER_THICKNESS);

    // 表头：空白单元格 + 各水果名称
    self.cell_border(MARGIN, COL_WIDTH, ROW_HEIGHT);
    for (i, fruit) in fruits.iter().enumerate() {
      let x = MARGIN + COL_WIDTH * (i + 1) as f32;
      self.cell_border(x, COL_WIDTH, ROW_HEIGHT);
      let label = title_case(&fruit.label);
      self.text(
        &label,
        TABLE_TEXT_SIZE,
        &self.fonts.bold,
        x,
        COL_WIDTH,
        ROW_HEIGHT,
        Align::Left,
      );
      self.table_labels.push(label);
    }
    self.cursor += ROW_HEIGHT;

    for nutrient in Nutrient::ALL {
      self.cell_border(MARGIN, COL_WIDTH, ROW_HEIGHT);
      self.text(
        nutrient.display_name(),
        TABLE_TEXT_SIZE,
        &self.fonts.regular,
        MARGIN,
        COL_WIDTH,
        ROW_HEIGHT,
        Align::Left,
      );
      for (i, fruit) in fruits.iter().enumerate() {
        let x = MARGIN + COL_WIDTH * (i + 1) as f32;
        self.cell_border(x, COL_WIDTH, ROW_HEIGHT);
        self.text(
          &fruit.nutrients.format_value(nutrient),
          TABLE_TEXT_SIZE,
          &self.fonts.regular,
          x,
          COL_WIDTH,
          ROW_HEIGHT,
          Align::Left,
        );
      }
      self.cursor += ROW_HEIGHT;
    }
  }
}
