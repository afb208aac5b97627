//! Text extraction and fixed word-window chunking.
use quick_xml::events::Event;
use quick_xml::Reader;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::Read;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::error::{Error, Result};
use crate::types::Chunk;

/// File extensions the ingest pipeline can turn into chunks.
pub const SUPPORTED_EXTENSIONS: &[&str] = &["pdf", "docx", "txt", "md"];

/// Part of a DOCX archive holding the main document body.
const DOCX_BODY: &str = "word/document.xml";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChunkingConfig {
    pub max_words: usize,
    pub overlap_words: usize,
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self { max_words: 600, overlap_words: 80 }
    }
}

/// Collapse every whitespace run into a single space and trim the ends.
pub fn normalize_whitespace(s: &str) -> String { s.split_whitespace().collect::<Vec<_>>().join(" ") }

pub fn to_words(s: &str) -> Vec<&str> { s.split_whitespace().collect() }

/// Split `text` into windows of `max_words` words, each starting
/// `max_words - overlap_words` words after the previous one.
pub fn chunk_text(text: &str, config: &ChunkingConfig) -> Result<Vec<String>> {
    let stride = config.max_words.saturating_sub(config.overlap_words);
    if stride == 0 {
        return Err(Error::InvalidConfig(format!(
            "chunk stride is zero (max_words={}, overlap_words={})",
            config.max_words, config.overlap_words
        )));
    }
    let words = to_words(text);
    let mut chunks = Vec::new();
    let mut start = 0;
    while start < words.len() {
        let end = (start + config.max_words).min(words.len());
        chunks.push(words[start..end].join(" "));
        start += stride;
    }
    Ok(chunks)
}

pub fn is_supported(path: &Path) -> bool {
    extension_of(path).is_some_and(|ext| SUPPORTED_EXTENSIONS.contains(&ext.as_str()))
}

fn extension_of(path: &Path) -> Option<String> {
    path.extension().and_then(|s| s.to_str()).map(str::to_ascii_lowercase)
}

#[derive(Debug, Default, Clone)]
pub struct DataProcessor {
    chunking_config: ChunkingConfig,
}

impl DataProcessor {
    pub fn new() -> Self { Self::default() }

    pub fn with_chunking(chunking_config: ChunkingConfig) -> Self { Self { chunking_config } }

    /// Detect the file type, extract its text and split it into chunks owned
    /// by `namespace`. PDFs are chunked page by page with 1-based page numbers.
    pub fn file_to_chunks(&self, path: &Path, namespace: &str) -> Result<Vec<Chunk>> {
        let filename = path
            .file_name()
            .map(|n| n.to_string_lossy().trim().to_string())
            .ok_or_else(|| Error::InvalidRequest(format!("not a file path: {}", path.display())))?;
        let source = path.to_string_lossy().to_string();
        let mut all_chunks = Vec::new();
        match extension_of(path).as_deref() {
            Some("pdf") => {
                for (page_idx, page_text) in self.extract_pdf_pages(path)?.iter().enumerate() {
                    let clean = normalize_whitespace(page_text);
                    if clean.is_empty() { continue; }
                    let page = u32::try_from(page_idx + 1).ok();
                    for piece in chunk_text(&clean, &self.chunking_config)? {
                        all_chunks.push(Chunk::new(piece, namespace, filename.as_str(), page).with_source(source.as_str()));
                    }
                }
            }
            Some(ext @ ("docx" | "txt" | "md")) => {
                let raw = if ext == "docx" { self.extract_docx_paragraphs(path)?.join("\n") } else { self.read_file_content(path)? };
                let clean = normalize_whitespace(&raw);
                if !clean.is_empty() {
                    for piece in chunk_text(&clean, &self.chunking_config)? {
                        all_chunks.push(Chunk::new(piece, namespace, filename.as_str(), None).with_source(source.as_str()));
                    }
                }
            }
            _ => return Err(Error::UnsupportedFile(filename)),
        }
        debug!("{} -> {} chunks", path.display(), all_chunks.len());
        Ok(all_chunks)
    }

    /// Supported files directly under `dir`, sorted by path. A missing
    /// directory yields an empty list.
    pub fn list_files(&self, dir: &Path) -> Vec<PathBuf> {
        if !dir.is_dir() { return vec![]; }
        let mut files: Vec<PathBuf> = walkdir::WalkDir::new(dir)
            .max_depth(1)
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().is_file())
            .map(|e| e.path().to_path_buf())
            .filter(|p| is_supported(p))
            .collect();
        files.sort();
        files
    }

    fn read_file_content(&self, file_path: &Path) -> Result<String> {
        match fs::read_to_string(file_path) {
            Ok(content) => Ok(content),
            Err(_) => Ok(String::from_utf8_lossy(&fs::read(file_path)?).to_string()),
        }
    }

    fn extract_docx_paragraphs(&self, file_path: &Path) -> Result<Vec<String>> {
        let unreadable = |e: &dyn std::fmt::Display| Error::Operation(format!("failed to read DOCX {}: {e}", file_path.display()));
        let mut archive = zip::ZipArchive::new(fs::File::open(file_path)?).map_err(|e| unreadable(&e))?;
        let mut xml = String::new();
        archive.by_name(DOCX_BODY).map_err(|e| unreadable(&e))?.read_to_string(&mut xml)?;
        docx_paragraphs(&xml).map_err(|e| unreadable(&e))
    }

    fn extract_pdf_pages(&self, file_path: &Path) -> Result<Vec<String>> {
        let bytes = fs::read(file_path)?;
        pdf_extract::extract_text_from_mem_by_pages(&bytes)
            .map_err(|e| Error::Operation(format!("failed to extract text from {}: {e}", file_path.display())))
    }
}

/// Text of every `<w:p>` paragraph of a WordprocessingML body, with its runs
/// concatenated. Only `<w:t>` content counts; `<w:tab/>` and `<w:br/>` become
/// a tab and a newline.
pub fn docx_paragraphs(xml: &str) -> std::result::Result<Vec<String>, quick_xml::Error> {
    let mut reader = Reader::from_str(xml);
    let mut paragraphs = Vec::new();
    let mut current = String::new();
    let mut in_text = false;
    loop {
        match reader.read_event()? {
            Event::Start(e) if e.local_name().as_ref() == b"t" => in_text = true,
            Event::End(e) => match e.local_name().as_ref() {
                b"t" => in_text = false,
                b"p" => paragraphs.push(std::mem::take(&mut current)),
                _ => {}
            },
            Event::Empty(e) => match e.local_name().as_ref() {
                b"tab" => current.push('\t'),
                b"br" => current.push('\n'),
                b"p" => paragraphs.push(String::new()),
                _ => {}
            },
            Event::Text(t) if in_text => current.push_str(&t.unescape()?),
            Event::Eof => break,
            _ => {}
        }
    }
    Ok(paragraphs)
}
