// 该文件是 Smartbite 项目的一部分。
// src/model/labels.rs - 模型类别表
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

use serde::Deserialize;
use thiserror::Error;
use tracing::debug;

const DEFAULT_LABELS: &str = include_str!("../../labels/fruits.toml");

#[derive(Error, Debug)]
pub enum LabelSetError {
  #[error("I/O 错误: {0}")]
  IoError(#[from] std::io::Error),
  #[error("类别表解析错误: {0}")]
  ParseError(#[from] toml::de::Error),
  #[error("类别表为空")]
  Empty,
}

#[derive(Deserialize)]
struct LabelFile {
  names: Vec<String>,
}

/// 类别索引到类别名称的映射，顺序与模型输出通道一致
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabelSet {
  names: Vec<String>,
}

impl Default for LabelSet {
  fn default() -> Self {
    // 内置类别表的可解析性由单元测试保证
    Self::from_toml_str(DEFAULT_LABELS).unwrap_or_else(|_| LabelSet { names: Vec::new() })
  }
}

impl LabelSet {
  pub fn new<S: Into<String>>(names: impl IntoIterator<Item = S>) -> Result<Self, LabelSetError> {
    let names: Vec<String> = names.into_iter().map(Into::into).collect();
    if names.is_empty() {
      return Err(LabelSetError::Empty);
    }
    Ok(LabelSet { names })
  }

  pub fn from_toml_str(content: &str) -> Result<Self, LabelSetError> {
    let file: LabelFile = toml::from_str(content)?;
    Self::new(file.names)
  }

  pub fn from_path(path: impl AsRef<Path>) -> Result<Self, LabelSetError> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path)?;
    let labels = Self::from_toml_str(&content)?;
    debug!("从 {} 读取 {} 个类别", path.display(), labels.len());
    Ok(labels)
  }

  pub fn len(&self) -> usize {
    self.names.len()
  }

  pub fn is_empty(&self) -> bool {
    self.names.is_empty()
  }

  /// 未知索引返回 `class_<id>`，保证计数不丢失
  pub fn name(&self, class_id: u32) -> String {
    self
      .names
      .get(class_id as usize)
      .cloned()
      .unwrap_or_else(|| format!("class_{}", class_id))
  }
}
