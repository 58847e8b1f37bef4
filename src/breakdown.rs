// 该文件是 Smartbite 项目的一部分。
// src/breakdown.rs - 检测计数与营养表的关联
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

use serde::Serialize;
use tracing::{debug, warn};

use crate::{
  counting::FruitCounts,
  nutrition::{self, ScaledNutrients, ServingSize},
};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FruitBreakdown {
  pub label: String,
  pub count: u32,
  pub nutrients: ScaledNutrients,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MissingFruit {
  pub label: String,
  pub count: u32,
}

/// 单张图片的营养汇总
///
/// `fruits` 只含营养表中存在的水果，其余进入 `missing`，两者都保持计数的顺序。
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NutritionBreakdown {
  pub serving_size: ServingSize,
  pub total_fruits: u32,
  pub fruits: Vec<FruitBreakdown>,
  pub missing: Vec<MissingFruit>,
}

impl NutritionBreakdown {
  pub fn build(counts: &FruitCounts, serving_size: ServingSize) -> Self {
    let mut fruits = Vec::new();
    let mut missing = Vec::new();

    for (label, count) in counts.iter() {
      match nutrition::lookup(label) {
        Some(record) => {
          debug!("{} x{}: 按 {}g 换算营养成分", label, count, serving_size);
          fruits.push(FruitBreakdown {
            label: label.to_string(),
            count,
            nutrients: record.scale(serving_size),
          });
        }
        None => {
          warn!("No nutrient data for {}", label);
          missing.push(MissingFruit {
            label: label.to_string(),
            count,
          });
        }
      }
    }

    NutritionBreakdown {
      serving_size,
      total_fruits: counts.total(),
      fruits,
      missing,
    }
  }

  pub fn is_empty(&self) -> bool {
    self.fruits.is_empty()
  }
}

/// 首字母大写，如 `passion fruit` -> `Passion Fruit`
pub fn title_case(label: &str) -> String {
  let mut result = String::with_capacity(label.len());
  let mut at_word_start = true;
  for ch in label.chars() {
    if ch.is_alphabetic() {
      if at_word_start {
        result.extend(ch.to_uppercase());
      } else {
        result.extend(ch.to_lowercase());
      }
      at_word_start = false;
    } else {
      result.push(ch);
      at_word_start = true;
    }
  }
  result
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::nutrition::Nutrient;

  #[test]
  fn known_labels_are_scaled_and_unknown_are_skipped() {
    let counts: FruitCounts = ["apple", "durian", "apple", "kiwi"].into_iter().collect();
    let serving = ServingSize::new(50.0).unwrap();
    let breakdown = NutritionBreakdown::build(&counts, serving);

    assert_eq!(breakdown.total_fruits, 4);
    let labels: Vec<&str> = breakdown.fruits.iter().map(|f| f.label.as_str()).collect();
    assert_eq!(labels, vec!["apple", "kiwi"]);
    assert_eq!(breakdown.fruits[0].count, 2);
    assert_eq!(breakdown.fruits[0].nutrients.get(Nutrient::Calories), 26.0);
    assert_eq!(
      breakdown.missing,
      vec![MissingFruit {
        label: "durian".to_string(),
        count: 1
      }]
    );
  }

  #[test]
  fn all_unknown_labels_yield_empty_breakdown() {
    let counts: FruitCounts = ["rock", "spoon"].into_iter().collect();
    let breakdown = NutritionBreakdown::build(&counts, ServingSize::default());
    assert!(breakdown.is_empty());
    assert_eq!(breakdown.missing.len(), 2);
    assert_eq!(breakdown.total_fruits, 2);
  }

  #[test]
  fn title_case_capitalises_each_word() {
    assert_eq!(title_case("apple"), "Apple");
    assert_eq!(title_case("passion fruit"), "Passion Fruit");
    assert_eq!(title_case("vitamin_c"), "Vitamin_C");
  }

  #[test]
  fn breakdown_serializes_to_json() {
    let counts: FruitCounts = ["orange"].into_iter().collect();
    let breakdown = NutritionBreakdown::build(&counts, ServingSize::new(200.0).unwrap());
    let json = serde_json::to_value(&breakdown).unwrap();
    assert_eq!(json["serving_size"], 200.0);
    assert_eq!(json["fruits"][0]["label"], "orange");
    assert_eq!(json["fruits"][0]["nutrients"]["calories"], 94.0);
  }
}
