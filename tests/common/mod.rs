//! Shared fixtures for integration tests

#![allow(dead_code)]

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use axum::{
    extract::Path as UrlPath,
    http::StatusCode,
    response::IntoResponse,
    routing::get,
    Router,
};
use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Dictionary, Document, Object, Stream};

use markcheck_server::config::{Config, StorageConfig};
use markcheck_server::download::Downloader;
use markcheck_server::ocr::{
    OcrError, OcrPageFailure, OcrProvider, OcrProviderTrait, OcrResult, TextExtractor,
};
use markcheck_server::pdf::{DocumentError, DocumentResult, PageImage, PageRasterizer};
use markcheck_server::pipeline::CheckPipeline;
use markcheck_server::state::AppState;
use markcheck_server::storage::Storage;

/// A PDF with `page_count` A4 pages, each holding a filled square
pub fn pdf_bytes(page_count: usize) -> Vec<u8> {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let mut kids = Vec::new();

    for _ in 0..page_count {
        let content = Content {
            operations: vec![
                Operation::new("re", [100, 100, 200, 200].map(Object::Integer).to_vec()),
                Operation::new("f", vec![]),
            ],
        };
        let content_id = doc.add_object(Stream::new(Dictionary::new(), content.encode().unwrap()));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
            "MediaBox" => [0, 0, 595, 842].map(Object::Integer).to_vec(),
        });
        kids.push(Object::Reference(page_id));
    }

    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => page_count as i64,
        }),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    let mut bytes = Vec::new();
    doc.save_to(&mut bytes).unwrap();
    bytes
}

/// Glyph codes drawn on each page of an annotated PDF, in drawing order
///
/// Every glyph must be drawn in red 20pt text from the stamped dingbat font.
pub fn glyph_codes(pdf: &[u8]) -> Vec<Vec<u8>> {
    let doc = Document::load_mem(pdf).unwrap();
    doc.get_pages()
        .into_values()
        .map(|page_id| {
            let content = Content::decode(&doc.get_page_content(page_id).unwrap()).unwrap();
            let mut font: (&[u8], f32) = (&b""[..], 0.0);
            let mut color = Vec::new();
            let mut codes = Vec::new();
            for op in &content.operations {
                match op.operator.as_str() {
                    "Tf" => font = (op.operands[0].as_name().unwrap(), number(&op.operands[1])),
                    "rg" => color = op.operands.iter().map(number).collect(),
                    "Tj" => {
                        assert_eq!(font, (&b"MkZaDb"[..], 20.0));
                        assert_eq!(color, vec![1.0, 0.0, 0.0]);
                        if let Some(Object::String(bytes, _)) = op.operands.first() {
                            codes.extend(bytes.first().copied());
                        }
                    }
                    _ => {}
                }
            }
            codes
        })
        .collect()
}

fn number(object: &Object) -> f32 {
    match object {
        Object::Integer(i) => *i as f32,
        Object::Real(r) => *r,
        other => panic!("not a number: {:?}", other),
    }
}

/// Serve `files` under `/files/<name>` on an ephemeral port; returns the base URL
pub async fn serve_fixtures(files: Vec<(&str, Vec<u8>)>) -> String {
    let files: Arc<HashMap<String, Vec<u8>>> = Arc::new(
        files
            .into_iter()
            .map(|(name, bytes)| (name.to_string(), bytes))
            .collect(),
    );

    let app = Router::new().route(
        "/files/:name",
        get(move |UrlPath(name): UrlPath<String>| {
            let files = Arc::clone(&files);
            async move {
                match files.get(&name) {
                    Some(bytes) => (StatusCode::OK, bytes.clone()).into_response(),
                    None => StatusCode::NOT_FOUND.into_response(),
                }
            }
        }),
    );

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    format!("http://{}", addr)
}

/// Counts pages with lopdf and emits `<role>#<index>` as each page's "image",
/// where role is the stored file name's prefix (`student` or `markscheme`)
pub struct LabelRasterizer;

impl PageRasterizer for LabelRasterizer {
    fn rasterize(&self, path: &Path) -> DocumentResult<Vec<PageImage>> {
        let doc = Document::load(path).map_err(|e| DocumentError::Read {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;

        let role = path
            .file_name()
            .and_then(|n| n.to_str())
            .and_then(|n| n.split('_').next())
            .unwrap_or_default()
            .to_string();

        Ok((0..doc.get_pages().len())
            .map(|index| PageImage {
                index,
                png: format!("{}#{}", role, index).into_bytes(),
            })
            .collect())
    }
}

/// Returns scripted text per `<role>#<index>` label; unknown labels fail
pub struct ScriptedOcr {
    texts: HashMap<String, String>,
}

impl ScriptedOcr {
    pub fn new(student: &[&str], markscheme: &[&str]) -> Self {
        let mut texts = HashMap::new();
        for (i, text) in student.iter().enumerate() {
            texts.insert(format!("student#{}", i), text.to_string());
        }
        for (i, text) in markscheme.iter().enumerate() {
            texts.insert(format!("markscheme#{}", i), text.to_string());
        }
        Self { texts }
    }
}

#[async_trait]
impl OcrProviderTrait for ScriptedOcr {
    fn provider_type(&self) -> OcrProvider {
        OcrProvider::Tesseract
    }

    async fn is_available(&self) -> bool {
        true
    }

    async fn recognize(&self, image_data: &[u8]) -> Result<OcrResult, OcrError> {
        let label = String::from_utf8_lossy(image_data).to_string();
        self.texts
            .get(&label)
            .map(|text| OcrResult {
                text: text.clone(),
                provider: OcrProvider::Tesseract,
            })
            .ok_or_else(|| OcrError::ProcessingError(format!("no text scripted for {}", label)))
    }
}

/// App state rooted in `root` with the fake rasterizer and OCR
pub fn test_state(root: &Path, ocr: ScriptedOcr) -> AppState {
    let mut config = Config::default();
    config.storage = StorageConfig {
        upload_dir: root.join("uploads"),
        result_dir: root.join("results"),
        keep_uploads: false,
    };

    let storage = Storage::init(&config.storage).unwrap();
    let extractor = TextExtractor::new(
        Arc::new(LabelRasterizer),
        Arc::new(ocr),
        OcrPageFailure::Empty,
    );
    let pipeline = CheckPipeline::new(storage, Downloader::default(), extractor);

    AppState::new(config, pipeline)
}
