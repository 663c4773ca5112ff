//! 命令行工具依赖的通用组件.

use log::LevelFilter;
use simple_logger::SimpleLogger;

pub mod args;

const SEP: &str = "--------------------------------------------------------";

/// 简单分隔线, 写入日志.
#[inline]
pub fn sep() {
    log::info!("{SEP}");
}

/// 初始化日志. 默认级别为 info, 可通过 `RUST_LOG` 环境变量覆盖.
pub fn init_logger() -> Result<(), log::SetLoggerError> {
    SimpleLogger::new()
        .with_level(LevelFilter::Info)
        .env()
        .init()
}

/// 用于 clap 的解析函数: 借助 `FromStr` 解析, 把错误转为文本.
pub fn parse<T>(s: &str) -> Result<T, String>
where
    T: std::str::FromStr<Err = nii_berry::Error>,
{
    s.parse().map_err(|e: nii_berry::Error| e.to_string())
}

/// 把 `num_args = 2` 的参数转为 `(低, 高)`.
pub fn pair<T: Copy>(v: &Option<Vec<T>>) -> Option<(T, T)> {
    match v.as_deref() {
        Some([lo, hi]) => Some((*lo, *hi)),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nii_berry::Axis;

    #[test]
    fn test_parse_helpers() {
        assert_eq!(parse::<Axis>("y"), Ok(Axis::Y));
        assert!(parse::<Axis>("q").unwrap_err().contains("unknown axis"));
        assert_eq!(pair(&Some(vec![1.0, 2.0])), Some((1.0, 2.0)));
        assert_eq!(pair::<f32>(&None), None);
        assert_eq!(pair(&Some(vec![1.0])), None);
    }
}
