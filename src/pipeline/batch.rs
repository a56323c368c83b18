//! Identifier input and batching.
//!
//! Identifiers are read lazily, one line at a time, so the input list is never
//! held in memory as a whole; only the current batch is.

use crate::archive::Identifier;
use std::io::{self, BufRead};
use tracing::warn;

/// Stream identifiers from newline-delimited input, skipping blank lines.
pub fn read_identifiers<R: BufRead>(reader: R) -> impl Iterator<Item = io::Result<Identifier>> {
    reader.lines().filter_map(|line| match line {
        Ok(raw) => {
            let id = Identifier::new(&raw);
            if id.as_str().is_empty() {
                return None;
            }
            if !id.is_canonical() {
                warn!(id = %id, "identifier is not in canonical form");
            }
            Some(Ok(id))
        }
        Err(e) => Some(Err(e)),
    })
}

/// Groups an identifier stream into batches of at most `size` identifiers.
pub struct Batches<I> {
    ids: I,
    size: usize,
    failed: bool,
}

impl<I> Batches<I>
where
    I: Iterator<Item = io::Result<Identifier>>,
{
    pub fn new(ids: I, size: usize) -> Self {
        Self {
            ids,
            size: size.max(1),
            failed: false,
        }
    }
}

impl<I> Iterator for Batches<I>
where
    I: Iterator<Item = io::Result<Identifier>>,
{
    type Item = io::Result<Vec<Identifier>>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }

        let mut batch = Vec::with_capacity(self.size);
        while batch.len() < self.size {
            match self.ids.next() {
                Some(Ok(id)) => batch.push(id),
                Some(Err(e)) => {
                    self.failed = true;
                    return Some(Err(e));
                }
                None => break,
            }
        }

        if batch.is_empty() {
            None
        } else {
            Some(Ok(batch))
        }
    }
}
