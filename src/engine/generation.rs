//! On-disk generations of an index.
//!
//! Every commit writes a complete new generation:
//!
//! ```text
//! terms_000007.json   TermIndex as JSON (postings, lengths, values, spelling)
//! docs_000007.docs    u64 count, then repeated (u64 docid, bytes document JSON)
//! manifest.json       points at the current generation's files
//! ```
//!
//! The manifest is replaced last, through a temporary file and a rename, so a
//! reader sees either the old generation or the new one. The previous
//! generation is kept for readers that are still scanning it; anything older
//! is deleted.

use std::collections::BTreeMap;
use std::io;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::engine::document::Document;
use crate::engine::index::{IndexState, TermIndex};
use crate::error::{FolioError, Result};
use crate::storage::Storage;
use crate::storage::structured::{StructReader, StructWriter};

pub const MANIFEST_FILE: &str = "manifest.json";
const MANIFEST_TMP_FILE: &str = "manifest.json.tmp";
const FORMAT_VERSION: u32 = 1;

/// Pointer to the current generation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Manifest {
    pub version: u32,
    pub generation: u64,
    pub doc_count: u64,
    pub next_doc_id: u64,
    pub committed_at: DateTime<Utc>,
    pub terms_file: String,
    pub docs_file: String,
    /// CRC-32 of the terms file.
    pub checksum: u32,
}

fn terms_file_name(generation: u64) -> String {
    format!("terms_{generation:06}.json")
}

fn docs_file_name(generation: u64) -> String {
    format!("docs_{generation:06}.docs")
}

fn generation_of(file_name: &str) -> Option<u64> {
    let stem = file_name
        .strip_prefix("terms_")
        .and_then(|rest| rest.strip_suffix(".json"))
        .or_else(|| {
            file_name
                .strip_prefix("docs_")
                .and_then(|rest| rest.strip_suffix(".docs"))
        })?;
    stem.parse().ok()
}

/// An encoded generation, ready to be written by [`write_generation`].
#[derive(Debug)]
pub struct EncodedGeneration {
    manifest: Manifest,
    terms: Vec<u8>,
    documents: Vec<(u64, Vec<u8>)>,
}

impl EncodedGeneration {
    /// Serialize `state` as generation number `generation`.
    pub fn encode(generation: u64, state: &IndexState) -> Result<Self> {
        let terms = serde_json::to_vec(&state.index)?;
        let documents = state
            .documents
            .iter()
            .map(|(docid, doc)| Ok((*docid, serde_json::to_vec(doc)?)))
            .collect::<Result<Vec<_>>>()?;

        let manifest = Manifest {
            version: FORMAT_VERSION,
            generation,
            doc_count: state.doc_count(),
            next_doc_id: state.next_doc_id,
            committed_at: Utc::now(),
            terms_file: terms_file_name(generation),
            docs_file: docs_file_name(generation),
            checksum: crc32fast::hash(&terms),
        };

        Ok(Self {
            manifest,
            terms,
            documents,
        })
    }
}

/// Write a generation's files, then publish its manifest.
pub fn write_generation(storage: &dyn Storage, encoded: &EncodedGeneration) -> Result<()> {
    let manifest = &encoded.manifest;

    let mut output = storage.create_output(&manifest.terms_file)?;
    io::Write::write_all(&mut output, &encoded.terms)?;
    output.flush_and_sync()?;
    drop(output);

    let mut writer = StructWriter::new(storage.create_output(&manifest.docs_file)?);
    writer.write_u64(encoded.documents.len() as u64)?;
    for (docid, bytes) in &encoded.documents {
        writer.write_u64(*docid)?;
        writer.write_bytes(bytes)?;
    }
    writer.close()?;

    let mut output = storage.create_output(MANIFEST_TMP_FILE)?;
    io::Write::write_all(&mut output, &serde_json::to_vec_pretty(manifest)?)?;
    output.flush_and_sync()?;
    drop(output);
    storage.rename_file(MANIFEST_TMP_FILE, MANIFEST_FILE)?;

    log::debug!(
        "published generation {} with {} documents",
        manifest.generation,
        manifest.doc_count
    );
    Ok(())
}

/// Delete generation files older than the one before `current`.
pub fn remove_stale_generations(storage: &dyn Storage, current: u64) -> Result<()> {
    let keep_from = current.saturating_sub(1);
    for name in storage.list_files()? {
        if generation_of(&name).is_some_and(|generation| generation < keep_from) {
            storage.delete_file(&name)?;
        }
    }
    Ok(())
}

/// Highest generation number among the generation files in `storage`.
pub fn latest_generation_file(storage: &dyn Storage) -> Result<u64> {
    Ok(storage
        .list_files()?
        .iter()
        .filter_map(|name| generation_of(name))
        .max()
        .unwrap_or(0))
}

pub fn has_manifest(storage: &dyn Storage) -> bool {
    storage.file_exists(MANIFEST_FILE)
}

pub fn read_manifest(storage: &dyn Storage) -> Result<Manifest> {
    if !has_manifest(storage) {
        return Err(FolioError::Io(io::Error::new(
            io::ErrorKind::NotFound,
            "no index found (manifest.json is missing)",
        )));
    }
    let manifest: Manifest = serde_json::from_slice(&storage.read_all(MANIFEST_FILE)?)?;
    if manifest.version != FORMAT_VERSION {
        return Err(FolioError::storage(format!(
            "unsupported index format version {}",
            manifest.version
        )));
    }
    Ok(manifest)
}

/// Load and verify the term index a manifest points at.
pub fn read_term_index(storage: &dyn Storage, manifest: &Manifest) -> Result<TermIndex> {
    let bytes = storage.read_all(&manifest.terms_file)?;
    if crc32fast::hash(&bytes) != manifest.checksum {
        return Err(FolioError::storage(format!(
            "checksum mismatch in {}",
            manifest.terms_file
        )));
    }
    let index: TermIndex = serde_json::from_slice(&bytes)?;
    if index.doc_count() != manifest.doc_count {
        return Err(FolioError::storage(format!(
            "{} holds {} documents, manifest says {}",
            manifest.terms_file,
            index.doc_count(),
            manifest.doc_count
        )));
    }
    Ok(index)
}

/// Load the whole writable state of the generation `manifest` points at.
pub fn read_state(storage: &dyn Storage, manifest: &Manifest) -> Result<IndexState> {
    let index = read_term_index(storage, manifest)?;

    let mut reader = StructReader::new(storage.open_input(&manifest.docs_file)?)?;
    let count = reader.read_u64()?;
    let mut documents = BTreeMap::new();
    for _ in 0..count {
        let docid = reader.read_u64()?;
        let doc: Document = serde_json::from_slice(&reader.read_bytes()?)?;
        documents.insert(docid, doc);
    }

    Ok(IndexState {
        index,
        documents,
        next_doc_id: manifest.next_doc_id,
    })
}

/// Scan a generation's document file for one document.
///
/// A missing file means the generation was superseded and cleaned up
/// while the caller still held it.
pub fn find_document(storage: &dyn Storage, docs_file: &str, docid: u64) -> Result<Document> {
    if !storage.file_exists(docs_file) {
        return Err(FolioError::payload(format!(
            "{docs_file} no longer exists: database modified, reopen it"
        )));
    }

    let mut reader = StructReader::new(storage.open_input(docs_file)?)?;
    let count = reader.read_u64()?;
    for _ in 0..count {
        let id = reader.read_u64()?;
        let bytes = reader.read_bytes()?;
        if id == docid {
            return Ok(serde_json::from_slice(&bytes)?);
        }
    }

    Err(FolioError::payload(format!(
        "document {docid} not found in {docs_file}"
    )))
}
