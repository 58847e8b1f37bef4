// 该文件是 Smartbite 项目的一部分。
// src/model/yolo.rs - YOLO ONNX 水果检测模型
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

use std::path::Path;

use image::{Rgb, RgbImage, imageops};
use thiserror::Error;
use tracing::{debug, error, info};
use tract_onnx::prelude::*;
use url::Url;

use crate::{
  FromUrl, FromUrlWithScheme,
  model::{DetectItem, DetectResult, LabelSet, Model},
};

const YOLO_INPUT_W: u32 = 640;
const YOLO_INPUT_H: u32 = 640;
const YOLO_BOX_CHANNELS: usize = 4;
const YOLO_LETTERBOX_FILL: u8 = 114;
const YOLO_MAX_DETECTIONS: usize = 300;
const YOLO_DEFAULT_CONFIDENCE: f32 = 0.25;
const YOLO_DEFAULT_IOU: f32 = 0.7;

#[derive(Error, Debug)]
pub enum YoloOnnxError {
  #[error("模型路径错误: {0}")]
  ModelPathError(String),
  #[error("ONNX 运行时错误: {0}")]
  TractError(String),
  #[error("模型输出形状不符: {shape:?}, 期望类别数 {classes}")]
  OutputShapeError { shape: Vec<usize>, classes: usize },
}

impl From<TractError> for YoloOnnxError {
  fn from(err: TractError) -> Self {
    YoloOnnxError::TractError(format!("{:#}", err))
  }
}

pub struct YoloOnnxBuilder {
  model_path: String,
  labels: LabelSet,
  confidence: f32,
  iou: f32,
}

impl FromUrlWithScheme for YoloOnnxBuilder {
  const SCHEME: &'static str = "onnx";
}

impl FromUrl for YoloOnnxBuilder {
  type Error = YoloOnnxError;

  fn from_url(url: &Url) -> Result<Self, Self::Error> {
    if url.scheme() != Self::SCHEME {
      return Err(YoloOnnxError::ModelPathError(format!(
        "模型路径必须使用 {} 方案",
        Self::SCHEME
      )));
    }

    Ok(YoloOnnxBuilder {
      model_path: url.path().to_string(),
      labels: LabelSet::default(),
      confidence: YOLO_DEFAULT_CONFIDENCE,
      iou: YOLO_DEFAULT_IOU,
    })
  }
}

impl YoloOnnxBuilder {
  pub fn labels(mut self, labels: LabelSet) -> Self {
    self.labels = labels;
    self
  }

  pub fn confidence(mut self, confidence: f32) -> Self {
    self.confidence = confidence;
    self
  }

  pub fn iou(mut self, iou: f32) -> Self {
    self.iou = iou;
    self
  }

  pub fn build(self) -> Result<YoloOnnx, YoloOnnxError> {
    let path = Path::new(&self.model_path);
    if !path.is_file() {
      error!("模型文件不存在: {}", self.model_path);
      return Err(YoloOnnxError::ModelPathError(format!(
        "模型文件不存在: {}",
        self.model_path
      )));
    }

    info!("加载模型文件: {}", self.model_path);
    let plan = tract_onnx::onnx()
      .model_for_path(path)?
      .with_input_fact(
        0,
        f32::fact([1, 3, YOLO_INPUT_H as usize, YOLO_INPUT_W as usize]).into(),
      )?
      .into_optimized()?
      .into_runnable()?;
    info!("模型加载完成");
    debug!(
      "类别数: {}, 置信度阈值: {}, NMS 阈值: {}",
      self.labels.len(),
      self.confidence,
      self.iou
    );

    Ok(YoloOnnx {
      plan,
      labels: self.labels,
      confidence: self.confidence,
      iou: self.iou,
    })
  }
}

pub struct YoloOnnx {
  plan: TypedRunnableModel<TypedModel>,
  labels: LabelSet,
  confidence: f32,
  iou: f32,
}

/// letterbox 缩放参数，用于把模型坐标映射回原图
#[derive(Debug, Clone, Copy, PartialEq)]
struct Letterbox {
  scale: f32,
  pad_x: f32,
  pad_y: f32,
  width: f32,
  height: f32,
}

impl Letterbox {
  #[cfg(test)]
  fn identity(width: u32, height: u32) -> Self {
    Letterbox {
      scale: 1.0,
      pad_x: 0.0,
      pad_y: 0.0,
      width: width as f32,
      height: height as f32,
    }
  }

  /// 模型像素坐标 [x_min, y_min, x_max, y_max] 转为原图归一化坐标
  fn restore(&self, bbox: [f32; 4]) -> [f32; 4] {
    let x_min = ((bbox[0] - self.pad_x) / self.scale).clamp(0.0, self.width);
    let y_min = ((bbox[1] - self.pad_y) / self.scale).clamp(0.0, self.height);
    let x_max = ((bbox[2] - self.pad_x) / self.scale).clamp(0.0, self.width);
    let y_max = ((bbox[3] - self.pad_y) / self.scale).clamp(0.0, self.height);
    [
      x_min / self.width,
      y_min / self.height,
      x_max / self.width,
      y_max / self.height,
    ]
  }
}

/// 保持宽高比缩放到模型输入尺寸，空白处以灰色填充
fn letterbox(image: &RgbImage) -> (RgbImage, Letterbox) {
  let (width, height) = image.dimensions();
  let scale = (YOLO_INPUT_W as f32 / width as f32).min(YOLO_INPUT_H as f32 / height as f32);
  let new_w = ((width as f32 * scale).round() as u32).clamp(1, YOLO_INPUT_W);
  let new_h = ((height as f32 * scale).round() as u32).clamp(1, YOLO_INPUT_H);
  let off_x = (YOLO_INPUT_W - new_w) / 2;
  let off_y = (YOLO_INPUT_H - new_h) / 2;

  let resized = imageops::resize(image, new_w, new_h, imageops::FilterType::Triangle);
  let mut canvas = RgbImage::from_pixel(YOLO_INPUT_W, YOLO_INPUT_H, Rgb([YOLO_LETTERBOX_FILL; 3]));
  imageops::overlay(&mut canvas, &resized, off_x as i64, off_y as i64);

  let letterbox = Letterbox {
    scale,
    pad_x: off_x as f32,
    pad_y: off_y as f32,
    width: width as f32,
    height: height as f32,
  };
  (canvas, letterbox)
}

impl YoloOnnx {
  /// 预处理图像：letterbox 后转为 NCHW、归一化到 0..1 的张量
  fn preprocess(&self, image: &RgbImage) -> (Tensor, Letterbox) {
    let (canvas, letterbox) = letterbox(image);
    let tensor: Tensor = tract_ndarray::Array4::from_shape_fn(
      (1, 3, YOLO_INPUT_H as usize, YOLO_INPUT_W as usize),
      |(_, c, y, x)| canvas.get_pixel(x as u32, y as u32)[c] as f32 / 255.0,
    )
    .into();
    (tensor, letterbox)
  }

  fn postprocess(
    &self,
    data: &[f32],
    shape: &[usize],
    letterbox: &Letterbox,
  ) -> Result<DetectResult, YoloOnnxError> {
    let candidates = decode_predictions(
      data,
      shape,
      self.labels.len(),
      self.confidence,
      letterbox,
    )?;
    debug!("置信度过滤后候选框 {} 个", candidates.len());

    let items: Vec<DetectItem> = nms(candidates, self.iou)
      .into_iter()
      .take(YOLO_MAX_DETECTIONS)
      .map(|candidate| DetectItem {
        class_id: candidate.class_id,
        label: self.labels.name(candidate.class_id),
        score: candidate.score,
        bbox: candidate.bbox,
      })
      .collect();

    debug!("检测到 {} 个物体", items.len());
    debug!("检测结果: {:?}", items);
    Ok(DetectResult::from(items))
  }
}

impl Model for YoloOnnx {
  type Input = RgbImage;
  type Output = DetectResult;
  type Error = YoloOnnxError;

  fn infer(&self, input: &Self::Input) -> Result<Self::Output, Self::Error> {
    debug!("预处理输入图像 {}x{}", input.width(), input.height());
    let (tensor, letterbox) = self.preprocess(input);

    debug!("执行模型推理");
    let outputs = self.plan.run(tvec!(tensor.into()))?;
    let output = outputs
      .first()
      .ok_or_else(|| YoloOnnxError::TractError("模型没有输出".to_string()))?;
    let view = output.to_array_view::<f32>()?;
    let shape = view.shape().to_vec();
    let data: Vec<f32> = view.iter().copied().collect();
    debug!("模型输出形状: {:?}", shape);

    self.postprocess(&data, &shape, &letterbox)
  }
}

#[derive(Debug, Clone, PartialEq)]
struct Candidate {
  class_id: u32,
  score: f32,
  bbox: [f32; 4],
}

/// 解码 `[1, 4 + 类别数, 锚点数]` 输出；部分导出的模型为 `[1, 锚点数, 4 + 类别数]`，按形状判断
fn decode_predictions(
  data: &[f32],
  shape: &[usize],
  num_classes: usize,
  confidence: f32,
  letterbox: &Letterbox,
) -> Result<Vec<Candidate>, YoloOnnxError> {
  let channels = YOLO_BOX_CHANNELS + num_classes;
  let shape_error = || YoloOnnxError::OutputShapeError {
    shape: shape.to_vec(),
    classes: num_classes,
  };

  let (anchors, channel_major) = match shape {
    [1, c, a] if *c == channels => (*a, true),
    [1, a, c] if *c == channels => (*a, false),
    _ => return Err(shape_error()),
  };
  if data.len() != channels * anchors {
    return Err(shape_error());
  }

  let value = |c: usize, a: usize| {
    if channel_major {
      data[c * anchors + a]
    } else {
      data[a * channels + c]
    }
  };

  let mut candidates = Vec::new();
  for a in 0..anchors {
    let (score, class_id) = (0..num_classes)
      .map(|c| (value(YOLO_BOX_CHANNELS + c, a), c))
      .fold((f32::MIN, 0usize), |best, cur| if cur.0 > best.0 { cur } else { best });

    if score < confidence {
      continue;
    }

    let cx = value(0, a);
    let cy = value(1, a);
    let w = value(2, a);
    let h = value(3, a);
    let bbox = letterbox.restore([
      cx - w / 2.0,
      cy - h / 2.0,
      cx + w / 2.0,
      cy + h / 2.0,
    ]);

    if bbox[2] > bbox[0] && bbox[3] > bbox[1] {
      candidates.push(Candidate {
        class_id: class_id as u32,
        score,
        bbox,
      });
    }
  }

  Ok(candidates)
}

/// 按类别的非极大值抑制
fn nms(mut candidates: Vec<Candidate>, iou_threshold: f32) -> Vec<Candidate> {
  // 按置信度降序排序
  candidates.sort_by(|a, b| b.score.total_cmp(&a.score));

  let mut result: Vec<Candidate> = Vec::new();
  for candidate in candidates {
    let suppressed = result
      .iter()
      .any(|kept| kept.class_id == candidate.class_id && iou(&kept.bbox, &candidate.bbox) > iou_threshold);
    if !suppressed {
      result.push(candidate);
    }
  }

  result
}

/// 计算两个边界框的 IoU
fn iou(a: &[f32; 4], b: &[f32; 4]) -> f32 {
  let x1 = a[0].max(b[0]);
  let y1 = a[1].max(b[1]);
  let x2 = a[2].min(b[2]);
  let y2 = a[3].min(b[3]);

  let intersection = (x2 - x1).max(0.0) * (y2 - y1).max(0.0);
  let area_a = (a[2] - a[0]) * (a[3] - a[1]);
  let area_b = (b[2] - b[0]) * (b[3] - b[1]);
  let union = area_a + area_b - intersection;

  if union > 0.0 { intersection / union } else { 0.0 }
}
