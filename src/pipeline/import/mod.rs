pub mod docx;
pub mod format;
pub mod hash;
pub mod images;

pub use docx::*;
pub use format::*;
pub use hash::*;
pub use images::*;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ImportError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("O arquivo está vazio ou corrompido")]
    EmptyFile,

    #[error("Arquivo inválido: {0}")]
    UnsupportedFormat(String),

    #[error("Arquivos .doc antigos não são suportados; salve o documento como .docx")]
    LegacyDoc,

    #[error("Arquivo muito grande: {size_mb:.1}MB excede o limite de {max_mb}MB")]
    FileTooLarge { size_mb: f64, max_mb: u64 },

    #[error("Documento Word inválido: {0}")]
    InvalidDocx(String),

    #[error("O arquivo Word não contém texto legível")]
    NoText,

    #[error("Erro ao processar imagem: {0}")]
    ImageProcessing(String),
}
