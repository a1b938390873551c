// ==========================================
// 零售促销排期系统 - 目录导入层
// ==========================================
// 职责: 商品目录文件（CSV/Excel）的解析、映射、清洗、
//       质量校验与落库
// ==========================================

pub mod catalog_importer_impl;
pub mod catalog_importer_trait;
pub mod error;
pub mod field_mapper;
pub mod file_parser;

pub use catalog_importer_impl::CatalogImporterImpl;
pub use catalog_importer_trait::{CatalogImporter, FieldMapper, FileParser};
pub use error::{ImportError, ImportResult};
pub use field_mapper::CatalogFieldMapper;
pub use file_parser::{CsvParser, ExcelParser, UniversalFileParser};
