// 该文件是 Smartbite 项目的一部分。
// src/nutrition.rs - 水果营养成分表与份量换算
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

use std::fmt;

use serde::{Serialize, Serializer, ser::SerializeMap};
use thiserror::Error;

/// 参考份量（克），营养表数值均以此为基准
pub const REFERENCE_GRAMS: f64 = 100.0;

/// 营养成分种类，`ALL` 的顺序即表格行顺序，与判别值一致
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Nutrient {
  Calories,
  Protein,
  Fat,
  Carbs,
  Sugar,
  Fiber,
  VitaminC,
}

impl Nutrient {
  pub const ALL: [Nutrient; 7] = [
    Nutrient::Calories,
    Nutrient::Protein,
    Nutrient::Fat,
    Nutrient::Carbs,
    Nutrient::Sugar,
    Nutrient::Fiber,
    Nutrient::VitaminC,
  ];

  pub fn key(&self) -> &'static str {
    match self {
      Nutrient::Calories => "calories",
      Nutrient::Protein => "protein",
      Nutrient::Fat => "fat",
      Nutrient::Carbs => "carbs",
      Nutrient::Sugar => "sugar",
      Nutrient::Fiber => "fiber",
      Nutrient::VitaminC => "vitamin_c",
    }
  }

  pub fn display_name(&self) -> &'static str {
    match self {
      Nutrient::Calories => "Calories",
      Nutrient::Protein => "Protein",
      Nutrient::Fat => "Fat",
      Nutrient::Carbs => "Carbs",
      Nutrient::Sugar => "Sugar",
      Nutrient::Fiber => "Fiber",
      Nutrient::VitaminC => "Vitamin C",
    }
  }

  pub fn unit(&self) -> &'static str {
    match self {
      Nutrient::Calories => "kcal",
      Nutrient::VitaminC => "mg",
      _ => "g",
    }
  }
}

/// 每 100 克的营养成分
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NutrientRecord {
  pub calories: f64,
  pub protein: f64,
  pub fat: f64,
  pub carbs: f64,
  pub sugar: f64,
  pub fiber: f64,
  pub vitamin_c: f64,
}

const fn record(
  calories: f64,
  protein: f64,
  fat: f64,
  carbs: f64,
  sugar: f64,
  fiber: f64,
  vitamin_c: f64,
) -> NutrientRecord {
  NutrientRecord {
    calories,
    protein,
    fat,
    carbs,
    sugar,
    fiber,
    vitamin_c,
  }
}

pub static NUTRIENT_TABLE: [(&str, NutrientRecord); 15] = [
  ("apple", record(52.0, 0.3, 0.2, 14.0, 10.0, 2.4, 4.6)),
  ("banana", record(89.0, 1.1, 0.3, 23.0, 12.0, 2.6, 8.7)),
  ("cucumber", record(16.0, 0.7, 0.1, 3.6, 1.7, 0.5, 2.8)),
  ("kiwi", record(41.0, 0.8, 0.4, 10.0, 9.0, 2.1, 92.7)),
  ("orange", record(47.0, 0.9, 0.1, 12.0, 9.0, 2.4, 53.2)),
  ("coconut", record(354.0, 3.3, 33.5, 15.2, 6.2, 9.0, 3.3)),
  ("peach", record(39.0, 0.9, 0.3, 10.0, 8.0, 1.5, 6.6)),
  ("cherry", record(50.0, 1.0, 0.3, 12.0, 8.0, 1.6, 7.0)),
  ("pear", record(57.0, 0.4, 0.1, 15.0, 10.0, 3.1, 4.3)),
  ("pomegranate", record(83.0, 1.7, 1.2, 19.0, 13.0, 4.0, 10.2)),
  ("pineapple", record(50.0, 0.5, 0.1, 13.0, 10.0, 1.4, 47.8)),
  ("watermelon", record(30.0, 0.6, 0.2, 8.0, 6.0, 0.4, 8.1)),
  ("melon", record(34.0, 0.8, 0.2, 9.0, 8.0, 0.9, 36.7)),
  ("grape", record(69.0, 0.6, 0.2, 18.0, 15.0, 0.9, 3.2)),
  ("strawberry", record(32.0, 0.7, 0.3, 8.0, 4.9, 2.0, 58.8)),
];

/// 按类别名称查找营养成分，名称区分大小写
pub fn lookup(label: &str) -> Option<&'static NutrientRecord> {
  NUTRIENT_TABLE
    .iter()
    .find(|(name, _)| *name == label)
    .map(|(_, record)| record)
}

/// 保留两位小数：按浮点数的精确值舍入，恰为一半时取偶数
pub fn round2(value: f64) -> f64 {
  format!("{:.2}", value).parse().unwrap_or(value)
}

impl NutrientRecord {
  pub fn get(&self, nutrient: Nutrient) -> f64 {
    match nutrient {
      Nutrient::Calories => self.calories,
      Nutrient::Protein => self.protein,
      Nutrient::Fat => self.fat,
      Nutrient::Carbs => self.carbs,
      Nutrient::Sugar => self.sugar,
      Nutrient::Fiber => self.fiber,
      Nutrient::VitaminC => self.vitamin_c,
    }
  }

  /// 按份量线性换算，每项保留两位小数
  pub fn scale(&self, serving: ServingSize) -> ScaledNutrients {
    let factor = serving.factor();
    let mut values = [0.0; 7];
    for (slot, nutrient) in values.iter_mut().zip(Nutrient::ALL) {
      *slot = round2(self.get(nutrient) * factor);
    }
    ScaledNutrients { serving, values }
  }
}

#[derive(Error, Debug, PartialEq)]
pub enum ServingSizeError {
  #[error("份量必须为正数, 实际为 {0}")]
  NotPositive(f64),
}

/// 份量（克）
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
pub struct ServingSize(f64);

impl ServingSize {
  pub fn new(grams: f64) -> Result<Self, ServingSizeError> {
    if !grams.is_finite() || grams <= 0.0 {
      return Err(ServingSizeError::NotPositive(grams));
    }
    Ok(ServingSize(grams))
  }

  pub fn grams(&self) -> f64 {
    self.0
  }

  pub fn factor(&self) -> f64 {
    self.0 / REFERENCE_GRAMS
  }
}

impl Default for ServingSize {
  fn default() -> Self {
    ServingSize(REFERENCE_GRAMS)
  }
}

impl fmt::Display for ServingSize {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}", self.0)
  }
}

impl Serialize for ServingSize {
  fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_f64(self.0)
  }
}

/// 按份量换算后的营养成分
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScaledNutrients {
  serving: ServingSize,
  values: [f64; 7],
}

impl ScaledNutrients {
  pub fn serving(&self) -> ServingSize {
    self.serving
  }

  pub fn get(&self, nutrient: Nutrient) -> f64 {
    self.values[nutrient as usize]
  }

  pub fn iter(&self) -> impl Iterator<Item = (Nutrient, f64)> + '_ {
    Nutrient::ALL.into_iter().zip(self.values.iter().copied())
  }

  /// 带单位的显示文本，如 `52 kcal`、`4.6 mg`
  pub fn format_value(&self, nutrient: Nutrient) -> String {
    format!("{} {}", format_amount(self.get(nutrient)), nutrient.unit())
  }
}

impl Serialize for ScaledNutrients {
  fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
    let mut map = serializer.serialize_map(Some(self.values.len()))?;
    for (nutrient, value) in self.iter() {
      map.serialize_entry(nutrient.key(), &value)?;
    }
    map.end()
  }
}

/// 数值文本：整数不带小数点，其余最多两位小数
pub fn format_amount(value: f64) -> String {
  let rounded = round2(value);
  if rounded.fract() == 0.0 {
    format!("{}", rounded as i64)
  } else {
    let text = format!("{:.2}", rounded);
    text.trim_end_matches('0').to_string()
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn lookup_finds_known_fruit() {
    let apple = lookup("apple").unwrap();
    assert_eq!(apple.calories, 52.0);
    assert_eq!(apple.get(Nutrient::VitaminC), 4.6);
    assert!(lookup("durian").is_none());
    assert!(lookup("Apple").is_none());
  }

  #[test]
  fn scaling_rounds_exact_value_half_to_even() {
    let at = |label: &str, grams: f64, nutrient: Nutrient| {
      lookup(label)
        .unwrap()
        .scale(ServingSize::new(grams).unwrap())
        .get(nutrient)
    };
    // 0.3 * 0.25 实际略小于 0.075
    assert_eq!(at("apple", 25.0, Nutrient::Protein), 0.07);
    // 0.125 恰为一半，取偶数
    assert_eq!(at("cucumber", 25.0, Nutrient::Fiber), 0.12);
    assert_eq!(at("cucumber", 25.0, Nutrient::Sugar), 0.42);
    // 8.7 * 0.75 = 6.5249999999999995
    assert_eq!(at("banana", 75.0, Nutrient::VitaminC), 6.52);
    assert_eq!(at("banana", 75.0, Nutrient::Protein), 0.83);
    assert_eq!(at("coconut", 75.0, Nutrient::Fat), 25.12);
    assert_eq!(at("coconut", 125.0, Nutrient::Fat), 41.88);
    assert_eq!(at("strawberry", 175.0, Nutrient::Sugar), 8.58);
    assert_eq!(at("banana", 175.0, Nutrient::VitaminC), 15.22);
    assert_eq!(at("apple", 175.0, Nutrient::Protein), 0.53);
  }

  #[test]
  fn scaled_values_follow_nutrient_order() {
    for (index, nutrient) in Nutrient::ALL.into_iter().enumerate() {
      assert_eq!(nutrient as usize, index);
    }
    let pear = lookup("pear").unwrap().scale(ServingSize::default());
    for (nutrient, value) in pear.iter() {
      assert_eq!(pear.get(nutrient), value);
    }
    assert_eq!(pear.get(Nutrient::VitaminC), 4.3);
    assert_eq!(pear.get(Nutrient::Calories), 57.0);
  }

  #[test]
  fn scaling_rounds_to_two_decimals() {
    let kiwi = lookup("kiwi").unwrap();
    let scaled = kiwi.scale(ServingSize::new(33.0).unwrap());
    // 92.7 * 0.33 = 30.591
    assert_eq!(scaled.get(Nutrient::VitaminC), 30.59);
    assert_eq!(scaled.get(Nutrient::Protein), 0.26);
  }

  #[test]
  fn serving_size_must_be_positive() {
    assert!(ServingSize::new(0.0).is_err());
    assert!(ServingSize::new(-25.0).is_err());
    assert!(ServingSize::new(f64::NAN).is_err());
    assert_eq!(ServingSize::default().factor(), 1.0);
  }

  #[test]
  fn format_value_uses_units() {
    let banana = lookup("banana").unwrap().scale(ServingSize::new(150.0).unwrap());
    assert_eq!(banana.format_value(Nutrient::Calories), "133.5 kcal");
    assert_eq!(banana.format_value(Nutrient::Carbs), "34.5 g");
    assert_eq!(banana.format_value(Nutrient::VitaminC), "13.05 mg");
    assert_eq!(format_amount(52.0), "52");
  }

  #[test]
  fn scaled_nutrients_serialize_with_keys() {
    let apple = lookup("apple").unwrap().scale(ServingSize::default());
    let json = serde_json::to_value(apple).unwrap();
    assert_eq!(json["calories"], 52.0);
    assert_eq!(json["vitamin_c"], 4.6);
  }
}
