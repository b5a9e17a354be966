//! Turning a [`DocumentRecord`] into an indexable [`Document`].

use crate::analysis::TermGenerator;
use crate::convert::MimeConverter;
use crate::data::DocumentRecord;
use crate::engine::document::Document;
use crate::error::{FolioError, Result};

/// Build the indexable form of `record`.
///
/// - `data` becomes the stored payload.
/// - Each text field is indexed through `generator`, honouring the
///   record's term limits.
/// - A source file is converted and its title and body are indexed the
///   same way. A record with a file but no `converter` is rejected.
/// - Values are copied into their slots.
/// - A non-empty key is added as a boolean term under
///   [`KEY_PREFIX`](crate::analysis::KEY_PREFIX), so the document can be
///   found again by [`replace_document_by_term`] and no text word matches it.
///
/// [`replace_document_by_term`]: crate::engine::WritableDatabase::replace_document_by_term
pub async fn assemble_document(
    generator: &TermGenerator,
    converter: Option<&MimeConverter>,
    record: &DocumentRecord,
) -> Result<Document> {
    let mut doc = Document::new();
    doc.set_data(record.data.clone());

    let limits = record.terms.unwrap_or_default();
    for text in &record.text {
        generator.index_text_with_limits(&mut doc, text, &limits);
    }

    if let Some(file) = &record.file {
        let converter = converter.ok_or_else(|| {
            FolioError::document(format!(
                "{} needs a converter to be indexed",
                file.path.display()
            ))
        })?;
        let converted = converter
            .convert(&file.path, file.mime_type.as_deref())
            .await?;
        generator.index_text_with_limits(&mut doc, &converted.title, &limits);
        generator.index_text_with_limits(&mut doc, &converted.body, &limits);
    }

    for (slot, value) in &record.values {
        doc.add_value(*slot, value.clone());
    }

    if let Some(term) = record.key_term() {
        doc.add_boolean_term(term);
    }

    Ok(doc)
}
