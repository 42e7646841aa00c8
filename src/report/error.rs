// ==========================================
// 设备故障停机统计系统 - 报表渲染错误类型
// ==========================================

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ReportError {
    #[error("图表渲染失败: {0}")]
    Render(String),

    #[error("画布宽度 {width} 超出范围 {min}..={max}")]
    InvalidWidth { width: u32, min: u32, max: u32 },

    #[error("图片缓冲区尺寸不匹配: {width}x{height}")]
    BufferSize { width: u32, height: u32 },

    #[error("图片编码失败: {0}")]
    Image(#[from] image::ImageError),

    #[error("文件写出失败: {0}")]
    Io(#[from] std::io::Error),
}

impl ReportError {
    /// plotters 绘制错误统一转换
    pub fn render<E: std::fmt::Display>(err: E) -> Self {
        ReportError::Render(err.to_string())
    }
}

/// RGB 位图缓冲区（白底）；尺寸按 usize 计算
pub(crate) fn white_buffer(width: u32, height: u32) -> ReportResult<Vec<u8>> {
    (width as usize)
        .checked_mul(height as usize)
        .and_then(|n| n.checked_mul(3))
        .map(|len| vec![255u8; len])
        .ok_or(ReportError::BufferSize { width, height })
}

pub type ReportResult<T> = Result<T, ReportError>;
