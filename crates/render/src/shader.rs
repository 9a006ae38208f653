//! Shader file loading.
//!
//! `.spv` files are SPIR-V binaries: a whole number of 32-bit words
//! starting with the SPIR-V magic number, in either byte order. `.wgsl`
//! files are UTF-8 WGSL source.

use crate::error::ShaderError;
use std::path::Path;

pub const SPIRV_MAGIC: u32 = 0x0723_0203;
const SPIRV_HEADER_WORDS: usize = 5;

/// Shader code ready to hand to a device.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShaderCode {
    SpirV(Vec<u32>),
    Wgsl(String),
}

impl ShaderCode {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::SpirV(_) => "spir-v",
            Self::Wgsl(_) => "wgsl",
        }
    }

    pub fn size_bytes(&self) -> usize {
        match self {
            Self::SpirV(words) => words.len() * 4,
            Self::Wgsl(source) => source.len(),
        }
    }
}

/// Read a shader file, picking the format from its extension.
pub fn load_shader(path: impl AsRef<Path>) -> Result<ShaderCode, ShaderError> {
    let path = path.as_ref();
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase);
    if !matches!(extension.as_deref(), Some("spv" | "wgsl")) {
        return Err(ShaderError::UnsupportedExtension {
            path: path.to_path_buf(),
        });
    }

    let bytes = std::fs::read(path).map_err(|e| match e.kind() {
        std::io::ErrorKind::NotFound => ShaderError::Missing {
            path: path.to_path_buf(),
        },
        _ => ShaderError::Io {
            path: path.to_path_buf(),
            source: e,
        },
    })?;

    let code = if extension.as_deref() == Some("spv") {
        ShaderCode::SpirV(parse_spirv(&bytes).map_err(|reason| ShaderError::Malformed {
            path: path.to_path_buf(),
            reason,
        })?)
    } else {
        let source = String::from_utf8(bytes).map_err(|e| ShaderError::Malformed {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        if source.trim().is_empty() {
            return Err(ShaderError::Malformed {
                path: path.to_path_buf(),
                reason: "empty source".into(),
            });
        }
        ShaderCode::Wgsl(source)
    };
    tracing::debug!(path = %path.display(), kind = code.kind(), bytes = code.size_bytes(), "shader loaded");
    Ok(code)
}

/// Decode SPIR-V words, normalising byte-swapped modules to host order.
pub fn parse_spirv(bytes: &[u8]) -> Result<Vec<u32>, String> {
    if bytes.len() % 4 != 0 {
        return Err(format!("length {} is not a multiple of 4", bytes.len()));
    }
    if bytes.len() < SPIRV_HEADER_WORDS * 4 {
        return Err(format!("{} bytes is shorter than the SPIR-V header", bytes.len()));
    }
    let mut words: Vec<u32> = bytes
        .chunks_exact(4)
        .map(|c| u32::from_le_bytes([c[0], c[1], c[2], c[3]]))
        .collect();
    match words[0] {
        SPIRV_MAGIC => {}
        swapped if swapped == SPIRV_MAGIC.swap_bytes() => {
            for word in &mut words {
                *word = word.swap_bytes();
            }
        }
        other => return Err(format!("bad magic number {other:#010x}")),
    }
    Ok(words)
}
