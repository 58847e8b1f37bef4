// 该文件是 Smartbite 项目的一部分。
// src/output.rs - 输出模块
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

use thiserror::Error;

mod console;
mod display;
mod draw;

pub use self::console::{ConsoleSummary, SummaryFormat};
pub use self::display::DisplayPair;
pub use self::draw::{Draw, DrawError, resize_to_width};

pub trait Render<F, D> {
  type Error;
  fn render_result(&self, frame: &F, result: &D) -> Result<(), Self::Error>;
}

#[derive(Error, Debug)]
pub enum OutputError {
  #[error("I/O 错误: {0}")]
  IoError(#[from] std::io::Error),
  #[error("图像错误: {0}")]
  ImageError(#[from] image::ImageError),
  #[error("JSON 错误: {0}")]
  JsonError(#[from] serde_json::Error),
}

impl<F, D, R: Render<F, D>> Render<F, D> for Option<R> {
  type Error = R::Error;

  fn render_result(&self, frame: &F, result: &D) -> Result<(), Self::Error> {
    match self {
      Some(render) => render.render_result(frame, result),
      None => Ok(()),
    }
  }
}

impl<F, D, E, A, B> Render<F, D> for (A, B)
where
  A: Render<F, D, Error = E>,
  B: Render<F, D, Error = E>,
{
  type Error = E;

  fn render_result(&self, frame: &F, result: &D) -> Result<(), Self::Error> {
    self.0.render_result(frame, result)?;
    self.1.render_result(frame, result)
  }
}
