// 该文件是 Smartbite 项目的一部分。
// src/counting.rs - 检测结果计数
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

use serde::{Serialize, Serializer, ser::SerializeMap};

use crate::model::DetectResult;

/// 每种水果的出现次数，按首次出现顺序排列
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FruitCounts {
  counts: Vec<(String, u32)>,
}

impl FruitCounts {
  pub fn tally(result: &DetectResult) -> Self {
    let mut counts = FruitCounts::default();
    for item in result.iter() {
      counts.add(&item.label);
    }
    counts
  }

  fn add(&mut self, label: &str) {
    match self.counts.iter_mut().find(|(name, _)| name == label) {
      Some((_, count)) => *count += 1,
      None => self.counts.push((label.to_string(), 1)),
    }
  }

  pub fn get(&self, label: &str) -> u32 {
    self
      .counts
      .iter()
      .find(|(name, _)| name == label)
      .map(|(_, count)| *count)
      .unwrap_or(0)
  }

  pub fn iter(&self) -> impl Iterator<Item = (&str, u32)> {
    self.counts.iter().map(|(name, count)| (name.as_str(), *count))
  }

  /// 不同种类的数量
  pub fn len(&self) -> usize {
    self.counts.len()
  }

  pub fn is_empty(&self) -> bool {
    self.counts.is_empty()
  }

  pub fn total(&self) -> u32 {
    self.counts.iter().map(|(_, count)| count).sum()
  }
}

impl<S: AsRef<str>> FromIterator<S> for FruitCounts {
  fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
    let mut counts = FruitCounts::default();
    for label in iter {
      counts.add(label.as_ref());
    }
    counts
  }
}

impl Serialize for FruitCounts {
  fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
    let mut map = serializer.serialize_map(Some(self.counts.len()))?;
    for (name, count) in self.iter() {
      map.serialize_entry(name, &count)?;
    }
    map.end()
  }
}
