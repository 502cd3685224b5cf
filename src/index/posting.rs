//! Posting lists with term positions.

use crate::error::{Result, TabulaError};
use crate::storage::{StructReader, StructWriter};

/// A single posting entry recording one document's occurrences of a term.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Posting {
    /// Document identifier.
    pub doc_id: u64,

    /// Term frequency within the document's field.
    pub frequency: u32,

    /// Token positions of the term, strictly increasing.
    pub positions: Vec<u32>,
}

impl Posting {
    /// Create a posting with a single occurrence at the given position.
    pub fn new(doc_id: u64, position: u32) -> Self {
        Posting {
            doc_id,
            frequency: 1,
            positions: vec![position],
        }
    }
}

/// Posting list for one term of one field, ordered by ascending doc id.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PostingList {
    postings: Vec<Posting>,
}

impl PostingList {
    /// Create an empty posting list.
    pub fn new() -> Self {
        PostingList::default()
    }

    /// Record one occurrence of the term.
    ///
    /// Occurrences must arrive grouped by ascending doc id, which the
    /// writer guarantees by assigning doc ids in insertion order.
    pub fn add_occurrence(&mut self, doc_id: u64, position: u32) -> Result<()> {
        match self.postings.last_mut() {
            Some(last) if last.doc_id == doc_id => {
                last.frequency += 1;
                last.positions.push(position);
                Ok(())
            }
            Some(last) if last.doc_id > doc_id => Err(TabulaError::index(format!(
                "doc id {doc_id} arrived after {}",
                last.doc_id
            ))),
            _ => {
                self.postings.push(Posting::new(doc_id, position));
                Ok(())
            }
        }
    }

    /// Number of documents containing the term.
    pub fn doc_frequency(&self) -> u64 {
        self.postings.len() as u64
    }

    /// Total number of occurrences across all documents.
    pub fn total_frequency(&self) -> u64 {
        self.postings.iter().map(|p| u64::from(p.frequency)).sum()
    }

    /// Whether the list has no postings.
    pub fn is_empty(&self) -> bool {
        self.postings.is_empty()
    }

    /// Iterate over the postings in doc id order.
    pub fn iter(&self) -> std::slice::Iter<'_, Posting> {
        self.postings.iter()
    }

    /// Find the posting for a document, if present.
    pub fn get(&self, doc_id: u64) -> Option<&Posting> {
        self.postings
            .binary_search_by_key(&doc_id, |p| p.doc_id)
            .ok()
            .map(|idx| &self.postings[idx])
    }

    /// Encode the list with delta-compressed doc ids and positions.
    pub fn encode(&self, writer: &mut StructWriter) -> Result<()> {
        writer.write_varint_u64(self.postings.len() as u64)?;
        let mut prev_doc_id = 0u64;
        for posting in &self.postings {
            writer.write_varint_u64(posting.doc_id - prev_doc_id)?;
            prev_doc_id = posting.doc_id;

            writer.write_varint_u64(u64::from(posting.frequency))?;
            writer.write_varint_u64(posting.positions.len() as u64)?;
            let mut prev_pos = 0u32;
            for &pos in &posting.positions {
                writer.write_varint_u64(u64::from(pos - prev_pos))?;
                prev_pos = pos;
            }
        }
        Ok(())
    }

    /// Decode a list written by [`PostingList::encode`].
    pub fn decode(reader: &mut StructReader) -> Result<Self> {
        let count = reader.read_varint_u64()? as usize;
        let mut postings = Vec::with_capacity(count);
        let mut prev_doc_id = 0u64;
        for _ in 0..count {
            let doc_id = prev_doc_id + reader.read_varint_u64()?;
            prev_doc_id = doc_id;

            let frequency = reader.read_varint_u64()? as u32;
            let position_count = reader.read_varint_u64()? as usize;
            let mut positions = Vec::with_capacity(position_count);
            let mut prev_pos = 0u32;
            for _ in 0..position_count {
                let pos = prev_pos + reader.read_varint_u64()? as u32;
                positions.push(pos);
                prev_pos = pos;
            }

            postings.push(Posting {
                doc_id,
                frequency,
                positions,
            });
        }
        Ok(PostingList { postings })
    }
}
