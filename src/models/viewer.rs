//! 查看器类型分派
//!
//! 根据文档的 MIME 类型、扩展名和纯文本标记决定用哪种查看器打开

use phf::phf_set;

use crate::models::document::DocumentDetails;

/// 查看器类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ViewerType {
    Pdf,
    Text,
    Image,
    Media,
    Model3d,
    Comic,
    Db,
    Fb2,
    Archive,
    UnsupportedEbook,
    Unsupported,
}

static MODEL_3D_EXTENSIONS: phf::Set<&'static str> = phf_set! {
    "glb", "gltf", "obj", "stl", "3ds",
};

static IMAGE_EXTENSIONS: phf::Set<&'static str> = phf_set! {
    "jpg", "jpeg", "jpe", "jfif", "jps", "png", "bmp", "gif", "webp", "tif", "tiff",
    "heif", "heic", "avif", "ico", "dds", "svg", "ai", "eps", "cdr", "psd", "sketch",
    "xcf", "cur", "dng", "raw", "exr", "hdr", "pam", "pbm", "pcd", "pcx", "pgm",
    "pict", "pnm", "ppm", "ras", "sgi", "tga", "xbm", "xpm", "xwd",
};

static COMIC_EXTENSIONS: phf::Set<&'static str> = phf_set! { "cbz", "cbr" };

static DB_EXTENSIONS: phf::Set<&'static str> = phf_set! { "sqlite", "db", "mdb", "accdb" };

static UNSUPPORTED_EBOOK_EXTENSIONS: phf::Set<&'static str> = phf_set! {
    "azw", "azw3", "lit", "mht",
};

static ARCHIVE_EXTENSIONS: phf::Set<&'static str> = phf_set! {
    "zip", "rar", "7z", "tar", "gz", "tgz", "bz2", "tbz2", "xz", "iso", "dmg",
};

/// 后端会转换成 PDF 的办公文档
static CONVERTED_TO_PDF_EXTENSIONS: phf::Set<&'static str> = phf_set! {
    "doc", "docx", "ppt", "pptx", "ppsx", "odp", "fodp", "sxi", "pps", "ods", "fods",
    "xls", "xlsx", "csv", "xlsb",
};

impl ViewerType {
    /// 根据文档详情选择查看器
    pub fn for_document(document: &DocumentDetails) -> Self {
        Self::classify(&document.file_type, &document.name, document.is_plain_text)
    }

    /// 按优先级依次判断
    pub fn classify(file_type: &str, file_name: &str, is_plain_text: bool) -> Self {
        if is_plain_text {
            return ViewerType::Text;
        }

        let file_type = file_type.to_lowercase();
        let file_name = file_name.to_lowercase();
        let ext = file_name.rsplit('.').next().unwrap_or_default();

        if file_type.starts_with("audio") || file_type.starts_with("video") {
            ViewerType::Media
        } else if MODEL_3D_EXTENSIONS.contains(ext) {
            ViewerType::Model3d
        } else if file_type.starts_with("image/") || IMAGE_EXTENSIONS.contains(ext) {
            ViewerType::Image
        } else if COMIC_EXTENSIONS.contains(ext) {
            ViewerType::Comic
        } else if ext == "fb2" {
            ViewerType::Fb2
        } else if DB_EXTENSIONS.contains(ext) {
            ViewerType::Db
        } else if UNSUPPORTED_EBOOK_EXTENSIONS.contains(ext) {
            ViewerType::UnsupportedEbook
        } else if ARCHIVE_EXTENSIONS.contains(ext) {
            ViewerType::Archive
        } else if file_type == "application/pdf" || CONVERTED_TO_PDF_EXTENSIONS.contains(ext) {
            ViewerType::Pdf
        } else {
            ViewerType::Unsupported
        }
    }

    /// 是否支持页面整理
    pub fn supports_page_organizing(self) -> bool {
        self == ViewerType::Pdf
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_text_flag_wins() {
        assert_eq!(
            ViewerType::classify("application/pdf", "a.pdf", true),
            ViewerType::Text
        );
    }

    #[test]
    fn test_classify_by_extension() {
        assert_eq!(ViewerType::classify("", "Scene.GLB", false), ViewerType::Model3d);
        assert_eq!(ViewerType::classify("", "photo.heic", false), ViewerType::Image);
        assert_eq!(ViewerType::classify("", "issue1.cbz", false), ViewerType::Comic);
        assert_eq!(ViewerType::classify("", "book.fb2", false), ViewerType::Fb2);
        assert_eq!(ViewerType::classify("", "data.sqlite", false), ViewerType::Db);
        assert_eq!(ViewerType::classify("", "page.mht", false), ViewerType::UnsupportedEbook);
        assert_eq!(ViewerType::classify("", "backup.tar.gz", false), ViewerType::Archive);
        assert_eq!(ViewerType::classify("", "slides.pptx", false), ViewerType::Pdf);
        assert_eq!(ViewerType::classify("", "notes", false), ViewerType::Unsupported);
    }

    #[test]
    fn test_mime_checks_come_before_extensions() {
        assert_eq!(ViewerType::classify("video/mp4", "clip.zip", false), ViewerType::Media);
        assert_eq!(ViewerType::classify("image/png", "scan", false), ViewerType::Image);
        assert_eq!(
            ViewerType::classify("application/pdf", "report", false),
            ViewerType::Pdf
        );
    }

    #[test]
    fn test_only_pdf_supports_organizing() {
        assert!(ViewerType::Pdf.supports_page_organizing());
        assert!(!ViewerType::Image.supports_page_organizing());
    }
}
