//! # 媒体 URL 分类
//!
//! 仅按路径后缀判断，无后缀的 URL 不算媒体。

/// 媒体与下载类文件的扩展名表
const MEDIA_EXTENSIONS: &[&str] = &[
    // 图片
    "jpg", "jpeg", "png", "gif", "webp", "svg", "ico", "bmp",
    // 视频
    "mp4", "mkv", "avi", "mov", "m3u8", "webm", "flv", "wmv",
    // 音频
    "mp3", "wav", "ogg", "aac", "flac", "m4a",
    // 压缩包
    "zip", "rar", "7z", "tar", "gz", "bz2",
    // 文档
    "pdf", "doc", "docx", "xls", "xlsx", "ppt", "pptx",
    // 可执行文件
    "apk", "exe", "dmg", "deb", "rpm",
    // 字体
    "ttf", "woff", "woff2", "eot", "otf",
];

/// 判断 URL 的路径部分是否以已知媒体扩展名结尾（大小写不敏感）
#[must_use]
pub fn is_media_url(url: &str) -> bool {
    if url.is_empty() {
        return false;
    }

    // 只看路径：去掉 query 与 fragment
    let without_fragment = url.split('#').next().unwrap_or(url);
    let path = without_fragment.split('?').next().unwrap_or(without_fragment);
    let path = path.to_ascii_lowercase();

    MEDIA_EXTENSIONS
        .iter()
        .any(|ext| path.ends_with(&format!(".{ext}")))
}
