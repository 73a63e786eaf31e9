#![allow(dead_code)]

use std::fs;
use std::io::{Cursor, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;

use docflow::config::PipelineConfig;
use docflow::error::{DocflowError, Result};
use docflow::models::OutputRecord;
use docflow::ocr::TextRecognizer;
use docflow::processing::{ExtractorRegistry, ProcessingPipeline, ResultWriter};

/// Write `bytes` to `root/relative`, creating parent directories.
pub fn write_file(root: &Path, relative: &str, bytes: &[u8]) -> PathBuf {
    let path = root.join(relative);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).expect("Failed to create fixture directory");
    }
    fs::write(&path, bytes).unwrap_or_else(|e| panic!("Failed to write '{relative}': {e}"));
    path
}

pub fn build_zip(entries: &[(&str, &[u8])]) -> Vec<u8> {
    use zip::write::FileOptions;
    use zip::CompressionMethod;

    let mut buffer = Cursor::new(Vec::new());
    {
        let mut zip = zip::ZipWriter::new(&mut buffer);
        let options: FileOptions<zip::write::ExtendedFileOptions> = FileOptions::default()
            .compression_method(CompressionMethod::Deflated)
            .unix_permissions(0o644);

        for (name, bytes) in entries {
            zip.start_file(*name, options.clone()).unwrap();
            zip.write_all(bytes).unwrap();
        }

        zip.finish().unwrap();
    }
    buffer.into_inner()
}

/// Writes a 7z archive at `path`. Entry names are stored verbatim.
pub fn build_7z(path: &Path, entries: &[(&str, &[u8])]) {
    let staging = tempfile::tempdir().unwrap();
    let mut writer = sevenz_rust::SevenZWriter::create(path).expect("Failed to create 7z");
    for (i, (name, bytes)) in entries.iter().enumerate() {
        let staged = staging.path().join(format!("entry-{i}"));
        fs::write(&staged, bytes).unwrap();
        writer
            .push_archive_entry(
                sevenz_rust::SevenZArchiveEntry::from_path(&staged, name.to_string()),
                Some(fs::File::open(&staged).unwrap()),
            )
            .expect("Failed to add 7z entry");
    }
    writer.finish().expect("Failed to finish 7z");
}

pub fn build_docx(paragraphs: &[&str]) -> Vec<u8> {
    use docx_rs::*;

    let mut docx = Docx::new();
    for text in paragraphs {
        docx = docx.add_paragraph(Paragraph::new().add_run(Run::new().add_text(*text)));
    }

    let mut buffer = Cursor::new(Vec::new());
    docx.build().pack(&mut buffer).expect("Failed to pack DOCX");
    buffer.into_inner()
}

/// Minimal PDF with one Courier text line per page.
pub fn build_pdf(pages: &[&str]) -> Vec<u8> {
    use lopdf::content::{Content, Operation};
    use lopdf::{dictionary, Document, Object, Stream};

    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Courier",
        "Encoding" => "WinAnsiEncoding",
    });
    let resources_id = doc.add_object(dictionary! {
        "Font" => dictionary! {
            "F1" => font_id,
        },
    });

    let mut kids: Vec<Object> = Vec::new();
    for text in pages {
        let content = Content {
            operations: vec![
                Operation::new("BT", vec![]),
                Operation::new("Tf", vec!["F1".into(), 24.into()]),
                Operation::new("Td", vec![72.into(), 700.into()]),
                Operation::new("Tj", vec![Object::string_literal(*text)]),
                Operation::new("ET", vec![]),
            ],
        };
        let content_id = doc.add_object(Stream::new(
            dictionary! {},
            content.encode().expect("Failed to encode page content"),
        ));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
            "Resources" => resources_id,
        });
        kids.push(page_id.into());
    }

    let count = kids.len() as i64;
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => count,
            "Resources" => resources_id,
            "MediaBox" => vec![0.into(), 0.into(), 595.into(), 842.into()],
        }),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    let mut buffer = Vec::new();
    doc.save_to(&mut buffer).expect("Failed to save PDF");
    buffer
}

/// Records under `out/<format>/`, ordered by file name.
pub fn read_records(out: &Path, format: &str) -> Vec<(PathBuf, OutputRecord)> {
    let dir = out.join(format);
    if !dir.is_dir() {
        return Vec::new();
    }
    let mut paths: Vec<PathBuf> = fs::read_dir(&dir)
        .unwrap()
        .map(|entry| entry.unwrap().path())
        .collect();
    paths.sort();
    paths
        .into_iter()
        .map(|path| {
            let record = serde_json::from_slice(&fs::read(&path).unwrap())
                .unwrap_or_else(|e| panic!("Invalid record {}: {e}", path.display()));
            (path, record)
        })
        .collect()
}

pub fn count_files(dir: &Path) -> usize {
    walkdir::WalkDir::new(dir)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .count()
}

/// Recognizer that answers without any network access.
pub struct StubRecognizer {
    pub reply: String,
}

#[async_trait]
impl TextRecognizer for StubRecognizer {
    fn name(&self) -> &str {
        "stub-ocr"
    }

    async fn recognize(&self, image: &[u8], _mime: &str) -> Result<String> {
        if image.is_empty() {
            return Err(DocflowError::RemoteService("empty image".to_string()));
        }
        Ok(self.reply.clone())
    }
}

pub fn default_registry() -> ExtractorRegistry {
    ExtractorRegistry::with_defaults(Arc::new(StubRecognizer {
        reply: "recognized text".to_string(),
    }))
}

pub fn pipeline_with(registry: ExtractorRegistry, out: &Path) -> ProcessingPipeline {
    ProcessingPipeline::new(registry, ResultWriter::new(out), &PipelineConfig::default())
}
